use crate::error::{GeometryError, Result};
use crate::math::distance_2d::point_to_segment_dist;
use crate::math::{rotate_vector, Point2, Vector2, TOLERANCE};

use super::Curve;

/// A straight line segment between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    start: Point2,
    end: Point2,
}

impl Segment {
    /// Creates a new segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment has zero length.
    pub fn new(start: Point2, end: Point2) -> Result<Self> {
        if (end - start).norm() < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self { start, end })
    }

    /// Returns the start point.
    #[must_use]
    pub fn start(&self) -> &Point2 {
        &self.start
    }

    /// Returns the end point.
    #[must_use]
    pub fn end(&self) -> &Point2 {
        &self.end
    }
}

impl Curve for Segment {
    fn evaluate(&self, t: f64) -> Point2 {
        self.start + (self.end - self.start) * t
    }

    fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    fn distance_to(&self, p: &Point2) -> f64 {
        point_to_segment_dist(p, &self.start, &self.end)
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn min_curvature_radius(&self) -> Option<f64> {
        None
    }

    fn translate(&mut self, displacement: &Vector2) {
        self.start += *displacement;
        self.end += *displacement;
    }

    fn rotate(&mut self, origin: &Point2, angle: f64) {
        self.start = origin + rotate_vector(&(self.start - origin), angle);
        self.end = origin + rotate_vector(&(self.end - origin), angle);
    }
}
