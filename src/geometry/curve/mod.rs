mod elliptic_arc;
mod segment;

pub use elliptic_arc::EllipticArc;
pub use segment::Segment;

use crate::math::{Point2, Vector2};

/// Trait for parametric curves in the model plane.
///
/// The parameter `t` runs over `[0, 1]` from the start to the end of the
/// curve.
pub trait Curve {
    /// Evaluates the curve at parameter `t`.
    fn evaluate(&self, t: f64) -> Point2;

    /// Returns the arc length of the curve.
    fn length(&self) -> f64;

    /// Returns the distance from `p` to the curve.
    fn distance_to(&self, p: &Point2) -> f64;

    /// Returns whether the curve is closed.
    fn is_closed(&self) -> bool;

    /// Smallest radius of curvature along the curve, `None` for straight curves.
    fn min_curvature_radius(&self) -> Option<f64>;

    /// Moves the curve by `displacement`.
    fn translate(&mut self, displacement: &Vector2);

    /// Rotates the curve counter-clockwise around `origin`.
    fn rotate(&mut self, origin: &Point2, angle: f64);

    /// Samples `n` segments' worth of points, both ends included.
    ///
    /// Closed curves repeat their start point at the end.
    #[allow(clippy::cast_precision_loss)]
    fn sample(&self, n: usize) -> Vec<Point2> {
        let n = n.max(1);
        (0..=n).map(|i| self.evaluate(i as f64 / n as f64)).collect()
    }
}
