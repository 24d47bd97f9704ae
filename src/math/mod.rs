pub mod distance_2d;
pub mod intersect_2d;
pub mod polygon_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 2x2 rotation/scaling matrix.
pub type Matrix2 = nalgebra::Matrix2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Rotates `v` counter-clockwise by `angle` radians.
#[must_use]
pub fn rotate_vector(v: &Vector2, angle: f64) -> Vector2 {
    let (s, c) = angle.sin_cos();
    Matrix2::new(c, -s, s, c) * v
}
