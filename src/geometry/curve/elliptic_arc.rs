use std::f64::consts::TAU;

use crate::error::{GeometryError, Result};
use crate::math::distance_2d::point_to_elliptic_arc_dist;
use crate::math::{rotate_vector, Point2, Vector2, TOLERANCE};

use super::Curve;

/// Number of Simpson intervals used for the arc length integral.
const LENGTH_INTERVALS: usize = 256;

/// An elliptic arc (or full ellipse) in the model plane.
///
/// `P(θ) = center + R(rotation) * (rx * cos θ, ry * sin θ)` for
/// `θ ∈ [start, start + sweep]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EllipticArc {
    center: Point2,
    rx: f64,
    ry: f64,
    rotation: f64,
    start: f64,
    sweep: f64,
}

impl EllipticArc {
    /// Creates a new elliptic arc.
    ///
    /// # Errors
    ///
    /// Returns an error if either semi-axis or the sweep is not positive.
    pub fn new(center: Point2, rx: f64, ry: f64, start: f64, sweep: f64) -> Result<Self> {
        if rx < TOLERANCE || ry < TOLERANCE {
            return Err(
                GeometryError::Degenerate("ellipse semi-axes must be positive".into()).into(),
            );
        }
        if sweep.abs() < TOLERANCE {
            return Err(GeometryError::Degenerate("arc sweep must be non-zero".into()).into());
        }
        Ok(Self {
            center,
            rx,
            ry,
            rotation: 0.0,
            start,
            sweep: sweep.clamp(-TAU, TAU),
        })
    }

    /// Creates a full ellipse.
    ///
    /// # Errors
    ///
    /// Returns an error if either semi-axis is not positive.
    pub fn full(center: Point2, rx: f64, ry: f64) -> Result<Self> {
        Self::new(center, rx, ry, 0.0, TAU)
    }

    /// Returns the center of the ellipse.
    #[must_use]
    pub fn center(&self) -> &Point2 {
        &self.center
    }

    /// Returns the semi-axes `(rx, ry)`.
    #[must_use]
    pub fn radii(&self) -> (f64, f64) {
        (self.rx, self.ry)
    }

    /// Returns the rotation of the local x-axis in radians.
    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Returns the angular sweep in radians.
    #[must_use]
    pub fn sweep(&self) -> f64 {
        self.sweep
    }

    fn speed(&self, theta: f64) -> f64 {
        (self.rx * theta.sin()).hypot(self.ry * theta.cos())
    }
}

impl Curve for EllipticArc {
    fn evaluate(&self, t: f64) -> Point2 {
        let theta = self.start + self.sweep * t;
        let local = Vector2::new(self.rx * theta.cos(), self.ry * theta.sin());
        self.center + rotate_vector(&local, self.rotation)
    }

    #[allow(clippy::cast_precision_loss)]
    fn length(&self) -> f64 {
        let n = LENGTH_INTERVALS;
        let h = self.sweep.abs() / n as f64;
        let base = self.start.min(self.start + self.sweep);
        let mut sum = self.speed(base) + self.speed(base + h * n as f64);
        for i in 1..n {
            let weight = if i % 2 == 1 { 4.0 } else { 2.0 };
            sum += weight * self.speed(base + h * i as f64);
        }
        sum * h / 3.0
    }

    fn distance_to(&self, p: &Point2) -> f64 {
        point_to_elliptic_arc_dist(
            p,
            &self.center,
            self.rx,
            self.ry,
            self.rotation,
            self.start,
            self.sweep,
        )
    }

    fn is_closed(&self) -> bool {
        self.sweep.abs() >= TAU - TOLERANCE
    }

    fn min_curvature_radius(&self) -> Option<f64> {
        let (a, b) = (self.rx.max(self.ry), self.rx.min(self.ry));
        Some(b * b / a)
    }

    fn translate(&mut self, displacement: &Vector2) {
        self.center += *displacement;
    }

    fn rotate(&mut self, origin: &Point2, angle: f64) {
        self.center = origin + rotate_vector(&(self.center - origin), angle);
        self.rotation += angle;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn circle_length() {
        let c = EllipticArc::full(Point2::new(1.0, 2.0), 5.0, 5.0).unwrap();
        assert_relative_eq!(c.length(), TAU * 5.0, max_relative = 1e-9);
        assert!(c.is_closed());
    }

    #[test]
    fn ellipse_length_matches_ramanujan() {
        let (a, b) = (4.0_f64, 2.0_f64);
        let e = EllipticArc::full(Point2::origin(), a, b).unwrap();
        let h = ((a - b) / (a + b)).powi(2);
        let ramanujan = PI * (a + b) * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()));
        assert_relative_eq!(e.length(), ramanujan, max_relative = 1e-6);
    }

    #[test]
    fn evaluate_endpoints() {
        let arc = EllipticArc::new(Point2::origin(), 2.0, 1.0, 0.0, PI).unwrap();
        let p0 = arc.evaluate(0.0);
        let p1 = arc.evaluate(1.0);
        assert_relative_eq!(p0.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(p1.x, -2.0, epsilon = 1e-12);
        assert!(!arc.is_closed());
    }

    #[test]
    fn degenerate_radii_rejected() {
        assert!(EllipticArc::full(Point2::origin(), 0.0, 1.0).is_err());
    }

    #[test]
    fn sampled_points_lie_on_curve() {
        let mut e = EllipticArc::full(Point2::new(3.0, -1.0), 4.0, 1.5).unwrap();
        e.rotate(&Point2::origin(), 0.3);
        for p in e.sample(32) {
            assert!(e.distance_to(&p) < 1e-9);
        }
    }

    #[test]
    fn curvature_radius() {
        let e = EllipticArc::full(Point2::origin(), 4.0, 2.0).unwrap();
        assert_relative_eq!(e.min_curvature_radius().unwrap(), 1.0);
    }
}
