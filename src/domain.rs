//! Construction of the box-minus-opening domain.

use std::collections::BTreeMap;
use std::f64::consts::FRAC_PI_2;

use tracing::{debug, info};

use crate::error::{GeometryError, Result};
use crate::geometry::{GeometryConfig, OpeningMode, RegionTag, Side};
use crate::math::{Point2, Vector2};
use crate::model::{GeometricModel, ModelOptions, ShapeId};
use crate::operations::boolean::{Cut, Fragment};
use crate::operations::creation::{MakeDisc, MakeRectangle, MakeSegment};
use crate::operations::modification::{KeepOnly, SetMeshStep, TagRegion};
use crate::operations::query::{Boundary, SelectByIntersect};
use crate::operations::transform::{CopyShape, Rotate, Translate};

/// A fully tagged geometric domain ready for meshing.
#[derive(Debug)]
pub struct Domain {
    model: GeometricModel,
    surfaces: Vec<ShapeId>,
    mode: OpeningMode,
}

impl Domain {
    /// The geometric model holding the kept shapes only.
    #[must_use]
    pub fn model(&self) -> &GeometricModel {
        &self.model
    }

    /// Surfaces to be meshed, box piece first.
    #[must_use]
    pub fn surfaces(&self) -> &[ShapeId] {
        &self.surfaces
    }

    #[must_use]
    pub fn mode(&self) -> OpeningMode {
        self.mode
    }

    /// Shapes grouped by region tag.
    #[must_use]
    pub fn regions(&self) -> BTreeMap<RegionTag, Vec<ShapeId>> {
        let mut regions: BTreeMap<RegionTag, Vec<ShapeId>> = BTreeMap::new();
        for (id, shape) in self.model.iter() {
            if let Some(tag) = shape.region {
                regions.entry(tag).or_default().push(id);
            }
        }
        regions
    }
}

/// Builds the box-minus-opening domain described by `config`.
///
/// The model tolerances in `options` are in force for every boolean step.
/// Each outer side is found by a geometric membership test against a
/// reference segment placed at the side's nominal position.
///
/// # Errors
///
/// Returns a [`GeometryError`] if the opening comes within the boolean
/// tolerance of a box side, if a side or the opening boundary matches no
/// curve, if a curve would receive two tags, or if a boundary curve of the
/// final domain stays untagged.
pub fn build_domain(
    config: &GeometryConfig,
    name: &str,
    options: ModelOptions,
) -> Result<Domain> {
    let clearance = config.opening_clearance();
    if clearance <= options.tolerance_boolean {
        return Err(GeometryError::ParameterOutOfRange {
            parameter: "opening clearance",
            value: clearance,
            min: options.tolerance_boolean,
            max: f64::INFINITY,
        }
        .into());
    }
    let mut model = GeometricModel::new(name, options);
    let [width, height] = config.box_dimensions();
    let [rx, ry] = config.opening_radii();

    let rect = MakeRectangle::new([width, height]).execute(&mut model)?;
    TagRegion::new(vec![rect], RegionTag::Box).execute(&mut model)?;
    let tools = side_tools(&mut model, width, height)?;

    let disc = MakeDisc::new(*config.opening_center(), rx, ry).execute(&mut model)?;
    let opening_select = CopyShape::new(disc).execute(&mut model)?;

    debug!(name, "cutting and fragmenting");
    let drilled = Cut::new(rect, disc).execute(&mut model)?;
    let pieces = Fragment::new(vec![drilled, disc]).execute(&mut model)?;
    let (box_piece, opening_piece) = (pieces[0], pieces[1]);

    debug!(name, "marking boundary regions");
    let box_boundary = Boundary::new(vec![box_piece]).execute(&model)?;
    for (side, tool) in tools {
        let selected = SelectByIntersect::new(box_boundary.clone(), tool).execute(&model)?;
        TagRegion::new(selected, RegionTag::Side(side)).execute(&mut model)?;
    }

    let surfaces = match config.mode() {
        OpeningMode::Cut => {
            let rim = SelectByIntersect::new(box_boundary, opening_select).execute(&model)?;
            TagRegion::new(rim.clone(), RegionTag::OpeningBoundary).execute(&mut model)?;
            SetMeshStep::new(rim, config.opening_mesh_step()).execute(&mut model)?;
            vec![box_piece]
        }
        OpeningMode::Keep => {
            TagRegion::new(vec![opening_piece], RegionTag::Opening).execute(&mut model)?;
            SetMeshStep::new(vec![opening_piece], config.opening_mesh_step())
                .execute(&mut model)?;
            vec![box_piece, opening_piece]
        }
    };

    KeepOnly::new(surfaces.clone()).execute(&mut model)?;
    check_boundary_tags(&model, &surfaces)?;
    info!(name, shapes = model.len(), mode = ?config.mode(), "domain built");

    Ok(Domain {
        model,
        surfaces,
        mode: config.mode(),
    })
}

/// Reference segments lying on the four nominal sides of the box.
///
/// A horizontal segment is moved off the origin and, for the vertical
/// sides, turned a quarter turn around the origin.
fn side_tools(model: &mut GeometricModel, width: f64, height: f64) -> Result<Vec<(Side, ShapeId)>> {
    let horizontal = MakeSegment::new(
        Point2::new(-width / 2.0, 0.0),
        Point2::new(width / 2.0, 0.0),
    )
    .execute(model)?;
    let vertical = MakeSegment::new(
        Point2::new(-height / 2.0, 0.0),
        Point2::new(height / 2.0, 0.0),
    )
    .execute(model)?;

    let mut tools = Vec::with_capacity(4);
    for side in Side::ALL {
        let (base, offset, turn) = match side {
            Side::Bottom => (horizontal, -height / 2.0, false),
            Side::Top => (horizontal, height / 2.0, false),
            Side::Left => (vertical, width / 2.0, true),
            Side::Right => (vertical, -width / 2.0, true),
        };
        let tool = CopyShape::new(base).execute(model)?;
        Translate::new(tool, Vector2::new(0.0, offset)).execute(model)?;
        if turn {
            Rotate::new(tool, Point2::origin(), FRAC_PI_2).execute(model)?;
        }
        tools.push((side, tool));
    }
    Ok(tools)
}

/// Every boundary curve of the meshed surfaces must carry a boundary tag.
fn check_boundary_tags(model: &GeometricModel, surfaces: &[ShapeId]) -> Result<()> {
    let untagged = Boundary::new(surfaces.to_vec())
        .execute(model)?
        .into_iter()
        .filter(|&c| {
            model
                .shape(c)
                .map_or(true, |s| !s.region.is_some_and(RegionTag::is_boundary))
        })
        .count();
    if untagged > 0 {
        return Err(GeometryError::UntaggedBoundary { count: untagged }.into());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::FlowMcError;
    use crate::model::ShapeKind;

    fn config(mode: OpeningMode) -> GeometryConfig {
        GeometryConfig::new([100.0, 50.0], Point2::origin(), [5.0, 5.0], 1.0, mode).unwrap()
    }

    #[test]
    fn cut_mode_tags_four_sides_and_opening() {
        let domain = build_domain(&config(OpeningMode::Cut), "m", ModelOptions::default()).unwrap();
        let regions = domain.regions();
        let boundary_regions: Vec<_> = regions.keys().filter(|t| t.is_boundary()).collect();
        assert_eq!(boundary_regions.len(), 5);
        for side in Side::ALL {
            assert_eq!(regions[&RegionTag::Side(side)].len(), 1);
        }
        let rim = &regions[&RegionTag::OpeningBoundary];
        assert_eq!(rim.len(), 1);
        assert_eq!(domain.model().shape(rim[0]).unwrap().mesh_step, Some(1.0));
        assert_eq!(regions[&RegionTag::Box].len(), 1);
        assert!(!regions.contains_key(&RegionTag::Opening));
    }

    #[test]
    fn every_boundary_curve_has_exactly_one_tag() {
        for mode in [OpeningMode::Cut, OpeningMode::Keep] {
            let domain = build_domain(&config(mode), "m", ModelOptions::default()).unwrap();
            let boundary = Boundary::new(domain.surfaces().to_vec())
                .execute(domain.model())
                .unwrap();
            assert_eq!(boundary.len(), 4 + usize::from(mode == OpeningMode::Cut));
            for c in boundary {
                let tag = domain.model().shape(c).unwrap().region;
                assert!(tag.is_some_and(RegionTag::is_boundary));
            }
        }
    }

    #[test]
    fn keep_mode_meshes_opening_region() {
        let domain =
            build_domain(&config(OpeningMode::Keep), "m", ModelOptions::default()).unwrap();
        assert_eq!(domain.surfaces().len(), 2);
        let regions = domain.regions();
        assert_eq!(regions[&RegionTag::Opening], vec![domain.surfaces()[1]]);
        assert!(!regions.contains_key(&RegionTag::OpeningBoundary));
    }

    #[test]
    fn construction_leftovers_are_removed() {
        let domain = build_domain(&config(OpeningMode::Cut), "m", ModelOptions::default()).unwrap();
        let surfaces = domain
            .model()
            .iter()
            .filter(|(_, s)| matches!(s.kind, ShapeKind::Surface(_)))
            .count();
        assert_eq!(surfaces, 1);
        // 4 sides + rim + drilled box
        assert_eq!(domain.model().len(), 6);
    }

    #[test]
    fn tall_box_and_off_centre_ellipse() {
        let cfg = GeometryConfig::new(
            [20.0, 60.0],
            Point2::new(3.0, -10.0),
            [4.0, 2.0],
            0.5,
            OpeningMode::Cut,
        )
        .unwrap();
        let domain = build_domain(&cfg, "m", ModelOptions::default()).unwrap();
        assert_eq!(domain.regions().len(), 6);
    }

    #[test]
    fn opening_within_boolean_tolerance_of_a_side_is_rejected() {
        let cfg = GeometryConfig::new(
            [100.0, 50.0],
            Point2::new(0.0, 19.9995),
            [5.0, 5.0],
            1.0,
            OpeningMode::Cut,
        )
        .unwrap();
        let err = build_domain(&cfg, "m", ModelOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            FlowMcError::Geometry(GeometryError::ParameterOutOfRange {
                parameter: "opening clearance",
                ..
            })
        ));
    }

    #[test]
    fn missing_tag_is_reported() {
        let mut model = GeometricModel::new("m", ModelOptions::default());
        let rect = MakeRectangle::new([2.0, 1.0]).execute(&mut model).unwrap();
        let err = check_boundary_tags(&model, &[rect]).unwrap_err();
        assert!(matches!(
            err,
            FlowMcError::Geometry(GeometryError::UntaggedBoundary { count: 4 })
        ));
    }
}
