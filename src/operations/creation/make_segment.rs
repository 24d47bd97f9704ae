use crate::error::Result;
use crate::geometry::Segment;
use crate::math::Point2;
use crate::model::{EdgeCurve, GeometricModel, ShapeId};

/// Creates a free-standing line segment, typically used as a selection tool.
pub struct MakeSegment {
    start: Point2,
    end: Point2,
}

impl MakeSegment {
    /// Creates a new `MakeSegment` operation.
    #[must_use]
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    /// Executes the operation, creating the curve in the model.
    ///
    /// # Errors
    ///
    /// Returns an error if the segment has zero length.
    pub fn execute(&self, model: &mut GeometricModel) -> Result<ShapeId> {
        let segment = Segment::new(self.start, self.end)?;
        Ok(model.add_curve(EdgeCurve::Segment(segment)))
    }
}
