use crate::error::{MeshError, Result};
use crate::model::{GeometricModel, ShapeId};

/// Requests a local element size on a selection of shapes.
pub struct SetMeshStep {
    shapes: Vec<ShapeId>,
    step: f64,
}

impl SetMeshStep {
    /// Creates a new `SetMeshStep` operation.
    #[must_use]
    pub fn new(shapes: Vec<ShapeId>, step: f64) -> Self {
        Self { shapes, step }
    }

    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is not a positive finite number or a
    /// shape is missing.
    pub fn execute(&self, model: &mut GeometricModel) -> Result<()> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(MeshError::InvalidSizePolicy(format!(
                "mesh step must be positive, got {}",
                self.step
            ))
            .into());
        }
        for &id in &self.shapes {
            model.shape_mut(id)?.mesh_step = Some(self.step);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::ModelOptions;
    use crate::operations::creation::MakeRectangle;

    #[test]
    fn step_is_stored() {
        let mut model = GeometricModel::new("m", ModelOptions::default());
        let rect = MakeRectangle::new([2.0, 1.0]).execute(&mut model).unwrap();
        SetMeshStep::new(vec![rect], 0.25).execute(&mut model).unwrap();
        assert_eq!(model.shape(rect).unwrap().mesh_step, Some(0.25));
        assert!(SetMeshStep::new(vec![rect], -1.0).execute(&mut model).is_err());
    }
}
