use crate::error::Result;
use crate::geometry::EllipticArc;
use crate::math::Point2;
use crate::model::{EdgeCurve, GeometricModel, ShapeId, SurfaceData};

/// Creates an elliptic disc bounded by a single closed curve.
pub struct MakeDisc {
    center: Point2,
    rx: f64,
    ry: f64,
}

impl MakeDisc {
    /// Creates a new `MakeDisc` operation.
    #[must_use]
    pub fn new(center: Point2, rx: f64, ry: f64) -> Self {
        Self { center, rx, ry }
    }

    /// Executes the operation, creating the disc in the model.
    ///
    /// # Errors
    ///
    /// Returns an error if a radius is not positive.
    pub fn execute(&self, model: &mut GeometricModel) -> Result<ShapeId> {
        let rim = EllipticArc::full(self.center, self.rx, self.ry)?;
        let rim = model.add_curve(EdgeCurve::EllipticArc(rim));
        Ok(model.add_surface(SurfaceData {
            outer: vec![rim],
            holes: Vec::new(),
        }))
    }
}
