use tracing::debug;

use crate::error::{OperationError, Result};
use crate::model::{GeometricModel, ShapeId};

use super::classify::{classify_loop, LoopClassification};
use super::cut::copy_loop;

/// Number of segments sampled per curve when testing coincidence.
const COINCIDENCE_SAMPLES: usize = 16;

/// Splits a set of surfaces into disjoint pieces with conforming boundaries.
///
/// A surface lying inside another surface's material is cut out of it, and
/// geometrically coincident curves are merged so adjacent pieces share a
/// single boundary curve. The pieces keep the ids of the inputs.
pub struct Fragment {
    surfaces: Vec<ShapeId>,
}

impl Fragment {
    /// Creates a new `Fragment` operation.
    #[must_use]
    pub fn new(surfaces: Vec<ShapeId>) -> Self {
        Self { surfaces }
    }

    /// Executes the fragmentation, returning the pieces in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if an input is not a surface or two inputs overlap
    /// partially.
    pub fn execute(&self, model: &mut GeometricModel) -> Result<Vec<ShapeId>> {
        for &host in &self.surfaces {
            for &guest in &self.surfaces {
                if host == guest {
                    continue;
                }
                let guest_outer = model.surface(guest)?.outer.clone();
                match classify_loop(model, &guest_outer, host)? {
                    LoopClassification::InsideMaterial => {
                        let hole = copy_loop(model, &guest_outer)?;
                        model.surface_mut(host)?.holes.push(hole);
                    }
                    LoopClassification::Crossing => {
                        return Err(OperationError::Unsupported(
                            "fragment inputs overlap partially".into(),
                        )
                        .into());
                    }
                    _ => {}
                }
            }
        }

        let mut curves: Vec<ShapeId> = Vec::new();
        for &s in &self.surfaces {
            for c in model.surface(s)?.curve_ids() {
                if !curves.contains(&c) {
                    curves.push(c);
                }
            }
        }

        let tol = model.options().tolerance_boolean;
        for i in 0..curves.len() {
            let keep = curves[i];
            if !model.contains(keep) {
                continue;
            }
            for &drop in &curves[i + 1..] {
                if !model.contains(drop) || !curves_coincide(model, keep, drop, tol)? {
                    continue;
                }
                debug!(?keep, ?drop, "merging coincident curves");
                merge_curve(model, &self.surfaces, keep, drop)?;
            }
        }

        Ok(self.surfaces.clone())
    }
}

/// Replaces `drop` by `keep` in every surface and removes `drop`.
///
/// Tags and mesh steps of the removed curve survive on the kept one when
/// the kept one has none.
fn merge_curve(
    model: &mut GeometricModel,
    surfaces: &[ShapeId],
    keep: ShapeId,
    drop: ShapeId,
) -> Result<()> {
    for &s in surfaces {
        model.surface_mut(s)?.replace_curve(drop, keep);
    }
    if let Some(dropped) = model.remove(drop) {
        let kept = model.shape_mut(keep)?;
        kept.region = kept.region.or(dropped.region);
        kept.mesh_step = kept.mesh_step.or(dropped.mesh_step);
    }
    Ok(())
}

/// Two curves coincide when each lies within `tol` of the other.
pub(crate) fn curves_coincide(
    model: &GeometricModel,
    a: ShapeId,
    b: ShapeId,
    tol: f64,
) -> Result<bool> {
    let ca = model.curve(a)?.as_curve();
    let cb = model.curve(b)?.as_curve();
    Ok(ca
        .sample(COINCIDENCE_SAMPLES)
        .iter()
        .all(|p| cb.distance_to(p) <= tol)
        && cb
            .sample(COINCIDENCE_SAMPLES)
            .iter()
            .all(|p| ca.distance_to(p) <= tol))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::model::ModelOptions;
    use crate::operations::boolean::Cut;
    use crate::operations::creation::{MakeDisc, MakeRectangle};

    #[test]
    fn drilled_box_and_disc_share_rim() {
        let mut model = GeometricModel::new("m", ModelOptions::default());
        let rect = MakeRectangle::new([10.0, 6.0]).execute(&mut model).unwrap();
        let disc = MakeDisc::new(Point2::origin(), 1.0, 1.0)
            .execute(&mut model)
            .unwrap();
        let drilled = Cut::new(rect, disc).execute(&mut model).unwrap();
        let pieces = Fragment::new(vec![drilled, disc])
            .execute(&mut model)
            .unwrap();
        let hole = model.surface(pieces[0]).unwrap().holes[0].clone();
        let rim = model.surface(pieces[1]).unwrap().outer.clone();
        assert_eq!(hole, rim);
        // 4 sides + rim + 2 surfaces
        assert_eq!(model.len(), 7);
    }

    #[test]
    fn fragment_cuts_nested_surface() {
        let mut model = GeometricModel::new("m", ModelOptions::default());
        let rect = MakeRectangle::new([10.0, 6.0]).execute(&mut model).unwrap();
        let disc = MakeDisc::new(Point2::origin(), 1.0, 1.0)
            .execute(&mut model)
            .unwrap();
        let pieces = Fragment::new(vec![rect, disc]).execute(&mut model).unwrap();
        let box_surface = model.surface(pieces[0]).unwrap();
        assert_eq!(box_surface.holes.len(), 1);
        assert_eq!(box_surface.holes[0], model.surface(pieces[1]).unwrap().outer);
    }

    #[test]
    fn fragment_rejects_curves() {
        let mut model = GeometricModel::new("m", ModelOptions::default());
        let rect = MakeRectangle::new([10.0, 6.0]).execute(&mut model).unwrap();
        let side = model.surface(rect).unwrap().outer[0];
        assert!(Fragment::new(vec![rect, side]).execute(&mut model).is_err());
    }
}
