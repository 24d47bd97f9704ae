mod shape;

pub use shape::{EdgeCurve, ShapeData, ShapeId, ShapeKind, SurfaceData};

use slotmap::SlotMap;

use crate::error::ModelError;
use crate::math::Point2;

/// Tolerances applied to the model before any boolean step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelOptions {
    /// General tolerance, used for geometric membership queries.
    pub tolerance: f64,
    /// Tolerance of boolean operations (coincidence/touching detection).
    pub tolerance_boolean: f64,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            tolerance_boolean: 1e-3,
        }
    }
}

/// Central arena that owns all shapes of a domain under construction.
///
/// Shapes reference each other via typed IDs (generational indices), so
/// curves can be shared between surfaces without self-referential data.
#[derive(Debug, Default)]
pub struct GeometricModel {
    name: String,
    options: ModelOptions,
    shapes: SlotMap<ShapeId, ShapeData>,
}

impl GeometricModel {
    /// Creates a new, empty model.
    #[must_use]
    pub fn new(name: impl Into<String>, options: ModelOptions) -> Self {
        Self {
            name: name.into(),
            options,
            shapes: SlotMap::with_key(),
        }
    }

    /// Returns the model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the tolerances of the model.
    #[must_use]
    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// Inserts a shape and returns its ID.
    pub fn add_shape(&mut self, data: ShapeData) -> ShapeId {
        self.shapes.insert(data)
    }

    /// Inserts an untagged curve and returns its ID.
    pub fn add_curve(&mut self, curve: EdgeCurve) -> ShapeId {
        self.add_shape(ShapeData::new(ShapeKind::Curve(curve)))
    }

    /// Inserts an untagged surface and returns its ID.
    pub fn add_surface(&mut self, surface: SurfaceData) -> ShapeId {
        self.add_shape(ShapeData::new(ShapeKind::Surface(surface)))
    }

    /// Removes a shape, returning its data if it existed.
    pub fn remove(&mut self, id: ShapeId) -> Option<ShapeData> {
        self.shapes.remove(id)
    }

    /// Returns `true` if the shape exists.
    #[must_use]
    pub fn contains(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(id)
    }

    /// Returns the number of shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns `true` if the model holds no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Iterates over all shapes in insertion-slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &ShapeData)> {
        self.shapes.iter()
    }

    /// Returns a reference to the shape data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn shape(&self, id: ShapeId) -> Result<&ShapeData, ModelError> {
        self.shapes
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound("shape".into()))
    }

    /// Returns a mutable reference to the shape data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn shape_mut(&mut self, id: ShapeId) -> Result<&mut ShapeData, ModelError> {
        self.shapes
            .get_mut(id)
            .ok_or_else(|| ModelError::EntityNotFound("shape".into()))
    }

    /// Returns the curve of a curve shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape is missing or is not a curve.
    pub fn curve(&self, id: ShapeId) -> Result<&EdgeCurve, ModelError> {
        match &self.shape(id)?.kind {
            ShapeKind::Curve(c) => Ok(c),
            ShapeKind::Surface(_) => Err(ModelError::NotACurve),
        }
    }

    /// Returns the loops of a surface shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape is missing or is not a surface.
    pub fn surface(&self, id: ShapeId) -> Result<&SurfaceData, ModelError> {
        match &self.shape(id)?.kind {
            ShapeKind::Surface(s) => Ok(s),
            ShapeKind::Curve(_) => Err(ModelError::NotASurface),
        }
    }

    /// Returns the mutable loops of a surface shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape is missing or is not a surface.
    pub fn surface_mut(&mut self, id: ShapeId) -> Result<&mut SurfaceData, ModelError> {
        match &mut self.shape_mut(id)?.kind {
            ShapeKind::Surface(s) => Ok(s),
            ShapeKind::Curve(_) => Err(ModelError::NotASurface),
        }
    }

    /// Turns a loop of curves into a closed polygon (last point not repeated).
    ///
    /// # Errors
    ///
    /// Returns an error if a curve of the loop is missing.
    pub fn loop_polygon(&self, curve_ids: &[ShapeId]) -> Result<Vec<Point2>, ModelError> {
        let mut points = Vec::new();
        for &id in curve_ids {
            let curve = self.curve(id)?;
            let mut samples = curve.as_curve().sample(curve.polygon_segments());
            samples.pop();
            points.extend(samples);
        }
        Ok(points)
    }

    /// Distance from `p` to the nearest curve of a loop.
    ///
    /// # Errors
    ///
    /// Returns an error if a curve of the loop is missing.
    pub fn loop_distance(&self, curve_ids: &[ShapeId], p: &Point2) -> Result<f64, ModelError> {
        let mut best = f64::INFINITY;
        for &id in curve_ids {
            best = best.min(self.curve(id)?.as_curve().distance_to(p));
        }
        Ok(best)
    }

    /// Number of surfaces among `surfaces` that reference curve `id`.
    #[must_use]
    pub fn curve_use_count(&self, surfaces: &[ShapeId], id: ShapeId) -> usize {
        surfaces
            .iter()
            .filter_map(|&s| self.surface(s).ok())
            .map(|s| s.curve_ids().filter(|&c| c == id).count())
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{EllipticArc, Segment};

    #[test]
    fn lookups_distinguish_curves_and_surfaces() {
        let mut model = GeometricModel::new("m", ModelOptions::default());
        let c = model.add_curve(EdgeCurve::Segment(
            Segment::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)).unwrap(),
        ));
        let s = model.add_surface(SurfaceData {
            outer: vec![c],
            holes: vec![],
        });
        assert!(model.curve(c).is_ok());
        assert!(model.surface(c).is_err());
        assert!(model.surface(s).is_ok());
        assert!(model.curve(s).is_err());
        assert_eq!(model.curve_use_count(&[s], c), 1);
    }

    #[test]
    fn removed_shape_is_not_found() {
        let mut model = GeometricModel::new("m", ModelOptions::default());
        let c = model.add_curve(EdgeCurve::EllipticArc(
            EllipticArc::full(Point2::origin(), 1.0, 1.0).unwrap(),
        ));
        assert!(model.remove(c).is_some());
        assert!(model.shape(c).is_err());
        assert!(model.is_empty());
    }

    #[test]
    fn disc_polygon_has_no_repeated_point() {
        let mut model = GeometricModel::new("m", ModelOptions::default());
        let c = model.add_curve(EdgeCurve::EllipticArc(
            EllipticArc::full(Point2::origin(), 2.0, 1.0).unwrap(),
        ));
        let poly = model.loop_polygon(&[c]).unwrap();
        assert_eq!(poly.len(), 64);
        assert!((poly[0] - poly[63]).norm() > 1e-3);
    }
}
