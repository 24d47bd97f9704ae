use crate::error::Result;
use crate::math::Vector2;
use crate::model::{GeometricModel, ShapeId, ShapeKind};

use super::affected_curves;

/// Translates a shape by a displacement vector.
pub struct Translate {
    shape: ShapeId,
    displacement: Vector2,
}

impl Translate {
    /// Creates a new `Translate` operation.
    #[must_use]
    pub fn new(shape: ShapeId, displacement: Vector2) -> Self {
        Self {
            shape,
            displacement,
        }
    }

    /// Executes the translation, modifying the shape in-place.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape or one of its curves is missing.
    pub fn execute(&self, model: &mut GeometricModel) -> Result<ShapeId> {
        for id in affected_curves(model, self.shape)? {
            let mut curve = model.curve(id)?.clone();
            curve.as_curve_mut().translate(&self.displacement);
            model.shape_mut(id)?.kind = ShapeKind::Curve(curve);
        }
        Ok(self.shape)
    }
}
