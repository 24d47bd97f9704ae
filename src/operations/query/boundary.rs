use crate::error::Result;
use crate::model::{GeometricModel, ShapeId};

/// Collects the boundary curves of a set of surfaces.
///
/// A curve is on the boundary when exactly one loop of the set uses it;
/// curves shared by two surfaces are interfaces and are skipped.
pub struct Boundary {
    surfaces: Vec<ShapeId>,
}

impl Boundary {
    /// Creates a new `Boundary` query.
    #[must_use]
    pub fn new(surfaces: Vec<ShapeId>) -> Self {
        Self { surfaces }
    }

    /// Executes the query, returning boundary curves in loop order.
    ///
    /// # Errors
    ///
    /// Returns an error if a shape is not a surface.
    pub fn execute(&self, model: &GeometricModel) -> Result<Vec<ShapeId>> {
        let mut curves = Vec::new();
        for &s in &self.surfaces {
            for c in model.surface(s)?.curve_ids() {
                if !curves.contains(&c) && model.curve_use_count(&self.surfaces, c) == 1 {
                    curves.push(c);
                }
            }
        }
        Ok(curves)
    }
}
