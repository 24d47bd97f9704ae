use crate::error::Result;
use crate::geometry::Segment;
use crate::math::Point2;
use crate::model::{EdgeCurve, GeometricModel, ShapeId, SurfaceData};

/// Creates an axis-aligned rectangle centred at the origin.
///
/// The outer loop runs counter-clockwise: bottom, right, top, left.
pub struct MakeRectangle {
    dimensions: [f64; 2],
}

impl MakeRectangle {
    /// Creates a new `MakeRectangle` operation.
    #[must_use]
    pub fn new(dimensions: [f64; 2]) -> Self {
        Self { dimensions }
    }

    /// Executes the operation, creating the surface and its four sides.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is zero.
    pub fn execute(&self, model: &mut GeometricModel) -> Result<ShapeId> {
        let (hx, hy) = (self.dimensions[0] / 2.0, self.dimensions[1] / 2.0);
        let corners = [
            Point2::new(-hx, -hy),
            Point2::new(hx, -hy),
            Point2::new(hx, hy),
            Point2::new(-hx, hy),
        ];
        let mut outer = Vec::with_capacity(4);
        for i in 0..4 {
            let side = Segment::new(corners[i], corners[(i + 1) % 4])?;
            outer.push(model.add_curve(EdgeCurve::Segment(side)));
        }
        Ok(model.add_surface(SurfaceData {
            outer,
            holes: Vec::new(),
        }))
    }
}
