use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::model::{GeometricModel, ShapeId, ShapeKind};

/// Removes every shape except the kept surfaces and the curves they use.
///
/// Selection tools and other construction leftovers are dropped this way
/// before meshing.
pub struct KeepOnly {
    surfaces: Vec<ShapeId>,
}

impl KeepOnly {
    /// Creates a new `KeepOnly` operation.
    #[must_use]
    pub fn new(surfaces: Vec<ShapeId>) -> Self {
        Self { surfaces }
    }

    /// Executes the removal, returning the number of shapes dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if a kept shape is not a surface.
    pub fn execute(&self, model: &mut GeometricModel) -> Result<usize> {
        let mut keep: HashSet<ShapeId> = HashSet::new();
        for &s in &self.surfaces {
            keep.insert(s);
            keep.extend(model.surface(s)?.curve_ids());
        }
        let doomed: Vec<ShapeId> = model
            .iter()
            .filter(|(id, _)| !keep.contains(id))
            .map(|(id, _)| id)
            .collect();
        for &id in &doomed {
            if let Some(data) = model.remove(id) {
                if matches!(data.kind, ShapeKind::Surface(_)) {
                    debug!(?id, "dropping surface");
                }
            }
        }
        Ok(doomed.len())
    }
}
