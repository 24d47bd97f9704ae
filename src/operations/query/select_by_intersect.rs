use crate::error::Result;
use crate::model::{GeometricModel, ShapeId, ShapeKind};

/// Number of segments sampled per candidate curve.
const SELECT_SAMPLES: usize = 8;

/// Selects the candidate curves that lie on a tool shape.
///
/// A candidate is selected when every sample point of it is within the
/// model tolerance of some curve of the tool. The tool may be a curve or a
/// surface (its loops are used).
pub struct SelectByIntersect {
    candidates: Vec<ShapeId>,
    tool: ShapeId,
}

impl SelectByIntersect {
    /// Creates a new `SelectByIntersect` query.
    #[must_use]
    pub fn new(candidates: Vec<ShapeId>, tool: ShapeId) -> Self {
        Self { candidates, tool }
    }

    /// Executes the query, returning the selected candidates in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool or a candidate is missing, or a candidate
    /// is not a curve.
    pub fn execute(&self, model: &GeometricModel) -> Result<Vec<ShapeId>> {
        let tol = model.options().tolerance;
        let tool_curves: Vec<ShapeId> = match &model.shape(self.tool)?.kind {
            ShapeKind::Curve(_) => vec![self.tool],
            ShapeKind::Surface(s) => s.curve_ids().collect(),
        };

        let mut selected = Vec::new();
        for &candidate in &self.candidates {
            let samples = model.curve(candidate)?.as_curve().sample(SELECT_SAMPLES);
            let mut on_tool = true;
            for p in &samples {
                if model.loop_distance(&tool_curves, p)? > tol {
                    on_tool = false;
                    break;
                }
            }
            if on_tool {
                selected.push(candidate);
            }
        }
        Ok(selected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::model::ModelOptions;
    use crate::operations::creation::{MakeRectangle, MakeSegment};

    #[test]
    fn selects_side_under_tool() {
        let mut model = GeometricModel::new("m", ModelOptions::default());
        let rect = MakeRectangle::new([4.0, 2.0]).execute(&mut model).unwrap();
        let sides = model.surface(rect).unwrap().outer.clone();
        let tool = MakeSegment::new(Point2::new(-2.0, -1.0), Point2::new(2.0, -1.0))
            .execute(&mut model)
            .unwrap();
        let picked = SelectByIntersect::new(sides.clone(), tool)
            .execute(&model)
            .unwrap();
        assert_eq!(picked, vec![sides[0]]);
    }

    #[test]
    fn shorter_tool_selects_nothing() {
        let mut model = GeometricModel::new("m", ModelOptions::default());
        let rect = MakeRectangle::new([4.0, 2.0]).execute(&mut model).unwrap();
        let sides = model.surface(rect).unwrap().outer.clone();
        let tool = MakeSegment::new(Point2::new(-1.0, -1.0), Point2::new(1.0, -1.0))
            .execute(&mut model)
            .unwrap();
        assert!(SelectByIntersect::new(sides, tool)
            .execute(&model)
            .unwrap()
            .is_empty());
    }
}
