use tracing::debug;

use crate::error::{GeometryError, Result};
use crate::geometry::RegionTag;
use crate::model::{GeometricModel, ShapeId};

/// Tags a selection of shapes with a named region.
pub struct TagRegion {
    shapes: Vec<ShapeId>,
    tag: RegionTag,
}

impl TagRegion {
    /// Creates a new `TagRegion` operation.
    #[must_use]
    pub fn new(shapes: Vec<ShapeId>, tag: RegionTag) -> Self {
        Self { shapes, tag }
    }

    /// Executes the tagging.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::NoRegionMatch`] if the selection is empty and
    /// [`GeometryError::AmbiguousRegion`] if a shape already carries another
    /// tag.
    pub fn execute(&self, model: &mut GeometricModel) -> Result<()> {
        if self.shapes.is_empty() {
            return Err(GeometryError::NoRegionMatch {
                region: self.tag.name().to_owned(),
            }
            .into());
        }
        for &id in &self.shapes {
            let shape = model.shape_mut(id)?;
            match shape.region {
                Some(existing) if existing != self.tag => {
                    return Err(GeometryError::AmbiguousRegion {
                        first: existing.name().to_owned(),
                        second: self.tag.name().to_owned(),
                    }
                    .into());
                }
                _ => shape.region = Some(self.tag),
            }
        }
        debug!(region = self.tag.name(), count = self.shapes.len(), "tagged");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::FlowMcError;
    use crate::geometry::Side;
    use crate::model::ModelOptions;
    use crate::operations::creation::MakeRectangle;

    #[test]
    fn empty_selection_is_an_error() {
        let mut model = GeometricModel::new("m", ModelOptions::default());
        let err = TagRegion::new(vec![], RegionTag::Side(Side::Top))
            .execute(&mut model)
            .unwrap_err();
        assert!(matches!(
            err,
            FlowMcError::Geometry(GeometryError::NoRegionMatch { .. })
        ));
    }

    #[test]
    fn retagging_with_other_region_is_ambiguous() {
        let mut model = GeometricModel::new("m", ModelOptions::default());
        let rect = MakeRectangle::new([2.0, 1.0]).execute(&mut model).unwrap();
        let side = model.surface(rect).unwrap().outer[0];
        TagRegion::new(vec![side], RegionTag::Side(Side::Bottom))
            .execute(&mut model)
            .unwrap();
        TagRegion::new(vec![side], RegionTag::Side(Side::Bottom))
            .execute(&mut model)
            .unwrap();
        assert!(TagRegion::new(vec![side], RegionTag::Side(Side::Left))
            .execute(&mut model)
            .is_err());
        assert_eq!(
            model.shape(side).unwrap().region,
            Some(RegionTag::Side(Side::Bottom))
        );
    }
}
