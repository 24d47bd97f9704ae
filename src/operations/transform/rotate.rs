use crate::error::Result;
use crate::math::Point2;
use crate::model::{GeometricModel, ShapeId, ShapeKind};

use super::affected_curves;

/// Rotates a shape counter-clockwise around a point of the model plane.
pub struct Rotate {
    shape: ShapeId,
    origin: Point2,
    angle: f64,
}

impl Rotate {
    /// Creates a new `Rotate` operation.
    ///
    /// * `angle` - Rotation angle in radians.
    #[must_use]
    pub fn new(shape: ShapeId, origin: Point2, angle: f64) -> Self {
        Self {
            shape,
            origin,
            angle,
        }
    }

    /// Executes the rotation, modifying the shape in-place.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape or one of its curves is missing.
    pub fn execute(&self, model: &mut GeometricModel) -> Result<ShapeId> {
        for id in affected_curves(model, self.shape)? {
            let mut curve = model.curve(id)?.clone();
            curve.as_curve_mut().rotate(&self.origin, self.angle);
            model.shape_mut(id)?.kind = ShapeKind::Curve(curve);
        }
        Ok(self.shape)
    }
}
