use crate::error::Result;
use crate::math::intersect_2d::polylines_cross;
use crate::math::polygon_2d::point_in_polygon_2d;
use crate::model::{GeometricModel, ShapeId};

/// A loop of a surface: its outer boundary or one of its holes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopRef {
    Outer,
    Hole(usize),
}

/// Position of a closed curve loop relative to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopClassification {
    /// The loop lies strictly inside the surface material.
    InsideMaterial,
    /// The loop lies strictly inside one of the surface's holes.
    InsideHole(usize),
    /// The loop lies strictly outside the surface.
    Outside,
    /// The loop strictly encloses the whole surface.
    Encloses,
    /// The loop coincides with one of the surface's loops.
    Coincident(LoopRef),
    /// The loop crosses or touches the surface boundary, or swallows a hole.
    Crossing,
}

/// Classifies a closed loop of curves against a surface.
///
/// Points of the loop closer than the model's boolean tolerance to the
/// surface boundary count as touching it: a loop touching everywhere is
/// coincident, touching somewhere is crossing.
///
/// # Errors
///
/// Returns an error if the surface or any referenced curve is missing.
pub fn classify_loop(
    model: &GeometricModel,
    curve_loop: &[ShapeId],
    surface_id: ShapeId,
) -> Result<LoopClassification> {
    let tol = model.options().tolerance_boolean;
    let surface = model.surface(surface_id)?;
    let points = model.loop_polygon(curve_loop)?;
    if points.is_empty() {
        return Ok(LoopClassification::Outside);
    }

    let mut touching = 0;
    let mut nearest = LoopRef::Outer;
    for (i, p) in points.iter().enumerate() {
        let mut best = model.loop_distance(&surface.outer, p)?;
        let mut best_ref = LoopRef::Outer;
        for (k, hole) in surface.holes.iter().enumerate() {
            let d = model.loop_distance(hole, p)?;
            if d < best {
                best = d;
                best_ref = LoopRef::Hole(k);
            }
        }
        if best <= tol {
            touching += 1;
        }
        if i == 0 {
            nearest = best_ref;
        }
    }
    if touching == points.len() {
        return Ok(LoopClassification::Coincident(nearest));
    }
    if touching > 0 {
        return Ok(LoopClassification::Crossing);
    }

    let outer = model.loop_polygon(&surface.outer)?;
    let holes = surface
        .holes
        .iter()
        .map(|h| model.loop_polygon(h))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if polylines_cross(&points, &outer) || holes.iter().any(|h| polylines_cross(&points, h)) {
        return Ok(LoopClassification::Crossing);
    }

    let probe = points[0];
    if !point_in_polygon_2d(&probe, &outer) {
        return Ok(if point_in_polygon_2d(&outer[0], &points) {
            LoopClassification::Encloses
        } else {
            LoopClassification::Outside
        });
    }
    if let Some(k) = holes.iter().position(|h| point_in_polygon_2d(&probe, h)) {
        return Ok(LoopClassification::InsideHole(k));
    }
    if holes
        .iter()
        .any(|h| h.first().is_some_and(|q| point_in_polygon_2d(q, &points)))
    {
        return Ok(LoopClassification::Crossing);
    }
    Ok(LoopClassification::InsideMaterial)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::model::ModelOptions;
    use crate::operations::creation::{MakeDisc, MakeRectangle};

    fn setup(center: Point2, r: f64) -> (GeometricModel, ShapeId, Vec<ShapeId>) {
        let mut model = GeometricModel::new("m", ModelOptions::default());
        let rect = MakeRectangle::new([10.0, 10.0]).execute(&mut model).unwrap();
        let disc = MakeDisc::new(center, r, r).execute(&mut model).unwrap();
        let rim = model.surface(disc).unwrap().outer.clone();
        (model, rect, rim)
    }

    #[test]
    fn disc_inside_box() {
        let (model, rect, rim) = setup(Point2::origin(), 2.0);
        assert_eq!(
            classify_loop(&model, &rim, rect).unwrap(),
            LoopClassification::InsideMaterial
        );
    }

    #[test]
    fn disc_outside_box() {
        let (model, rect, rim) = setup(Point2::new(20.0, 0.0), 2.0);
        assert_eq!(
            classify_loop(&model, &rim, rect).unwrap(),
            LoopClassification::Outside
        );
    }

    #[test]
    fn disc_crossing_box_side() {
        let (model, rect, rim) = setup(Point2::new(5.0, 0.0), 2.0);
        assert_eq!(
            classify_loop(&model, &rim, rect).unwrap(),
            LoopClassification::Crossing
        );
    }

    #[test]
    fn disc_enclosing_box() {
        let (model, rect, rim) = setup(Point2::origin(), 50.0);
        assert_eq!(
            classify_loop(&model, &rim, rect).unwrap(),
            LoopClassification::Encloses
        );
    }
}
