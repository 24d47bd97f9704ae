use tracing::debug;

use crate::error::{GeometryError, OperationError, Result};
use crate::model::{GeometricModel, ShapeData, ShapeId, ShapeKind};
use crate::operations::transform::CopyShape;

use super::classify::{classify_loop, LoopClassification, LoopRef};

/// Computes the boolean difference `object - tool` of two surfaces.
///
/// The object is consumed and replaced by the result; the tool is kept so
/// it can take part in a later fragmentation.
pub struct Cut {
    object: ShapeId,
    tool: ShapeId,
}

impl Cut {
    /// Creates a new `Cut` operation (object - tool).
    #[must_use]
    pub fn new(object: ShapeId, tool: ShapeId) -> Self {
        Self { object, tool }
    }

    /// Executes the cut, creating the result surface in the model.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool removes the whole object, or if it only
    /// partially overlaps the object's boundary.
    pub fn execute(&self, model: &mut GeometricModel) -> Result<ShapeId> {
        let tool_outer = model.surface(self.tool)?.outer.clone();
        let classification = classify_loop(model, &tool_outer, self.object)?;
        debug!(?classification, "cut");

        let object = model.shape(self.object)?.clone();
        let ShapeKind::Surface(mut surface) = object.kind else {
            return Err(OperationError::InvalidInput("cut object must be a surface".into()).into());
        };

        match classification {
            LoopClassification::InsideMaterial => {
                surface.holes.push(copy_loop(model, &tool_outer)?);
            }
            LoopClassification::Outside
            | LoopClassification::InsideHole(_)
            | LoopClassification::Coincident(LoopRef::Hole(_)) => {}
            LoopClassification::Encloses | LoopClassification::Coincident(LoopRef::Outer) => {
                return Err(
                    GeometryError::Degenerate("cut removes the whole object".into()).into(),
                );
            }
            LoopClassification::Crossing => {
                return Err(OperationError::Unsupported(
                    "cut tool partially overlaps the object boundary".into(),
                )
                .into());
            }
        }

        model.remove(self.object);
        Ok(model.add_shape(ShapeData {
            kind: ShapeKind::Surface(surface),
            region: object.region,
            mesh_step: object.mesh_step,
        }))
    }
}

/// Copies every curve of a loop, returning the new loop.
pub(super) fn copy_loop(model: &mut GeometricModel, curve_loop: &[ShapeId]) -> Result<Vec<ShapeId>> {
    curve_loop
        .iter()
        .map(|&id| CopyShape::new(id).execute(model))
        .collect()
}
