use crate::error::Result;
use crate::model::{GeometricModel, ShapeData, ShapeId, ShapeKind};

/// Creates an independent copy of a shape.
///
/// Copying a surface also copies every curve of its loops, so the copy
/// shares no entities with the original.
pub struct CopyShape {
    shape: ShapeId,
}

impl CopyShape {
    /// Creates a new `CopyShape` operation.
    #[must_use]
    pub fn new(shape: ShapeId) -> Self {
        Self { shape }
    }

    /// Executes the copy, returning the new shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape or one of its curves is missing.
    pub fn execute(&self, model: &mut GeometricModel) -> Result<ShapeId> {
        let data = model.shape(self.shape)?.clone();
        let kind = match data.kind {
            ShapeKind::Curve(curve) => ShapeKind::Curve(curve),
            ShapeKind::Surface(mut surface) => {
                for id in surface
                    .outer
                    .iter_mut()
                    .chain(surface.holes.iter_mut().flat_map(|h| h.iter_mut()))
                {
                    let curve = model.shape(*id)?.clone();
                    *id = model.add_shape(curve);
                }
                ShapeKind::Surface(surface)
            }
        };
        Ok(model.add_shape(ShapeData { kind, ..data }))
    }
}
