mod copy;
mod rotate;
mod translate;

pub use copy::CopyShape;
pub use rotate::Rotate;
pub use translate::Translate;

use crate::error::Result;
use crate::model::{GeometricModel, ShapeId, ShapeKind};

/// Curves moved by a transform of `shape`: the shape itself, or every curve
/// of a surface's loops.
fn affected_curves(model: &GeometricModel, shape: ShapeId) -> Result<Vec<ShapeId>> {
    Ok(match &model.shape(shape)?.kind {
        ShapeKind::Curve(_) => vec![shape],
        ShapeKind::Surface(surface) => surface.curve_ids().collect(),
    })
}
