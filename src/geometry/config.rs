use crate::error::{GeometryError, Result};
use crate::math::{Point2, TOLERANCE};

/// How the opening takes part in the domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpeningMode {
    /// The opening is removed material; its boundary becomes a tagged
    /// boundary region.
    Cut,
    /// The opening interior stays in the domain as its own meshed region.
    Keep,
}

/// Parameters of the box-minus-opening domain. Immutable once built.
///
/// The box is centred at the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryConfig {
    box_dimensions: [f64; 2],
    opening_center: Point2,
    opening_radii: [f64; 2],
    opening_mesh_step: f64,
    mode: OpeningMode,
}

impl GeometryConfig {
    /// Creates a validated geometry configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension, radius or mesh step is not positive,
    /// or if the opening does not lie strictly inside the box.
    pub fn new(
        box_dimensions: [f64; 2],
        opening_center: Point2,
        opening_radii: [f64; 2],
        opening_mesh_step: f64,
        mode: OpeningMode,
    ) -> Result<Self> {
        for (parameter, value) in [
            ("box width", box_dimensions[0]),
            ("box height", box_dimensions[1]),
            ("opening x radius", opening_radii[0]),
            ("opening y radius", opening_radii[1]),
            ("opening mesh step", opening_mesh_step),
        ] {
            if !(value > TOLERANCE && value.is_finite()) {
                return Err(GeometryError::ParameterOutOfRange {
                    parameter,
                    value,
                    min: TOLERANCE,
                    max: f64::INFINITY,
                }
                .into());
            }
        }

        let half = [box_dimensions[0] / 2.0, box_dimensions[1] / 2.0];
        let inside = opening_center.x.abs() + opening_radii[0] < half[0]
            && opening_center.y.abs() + opening_radii[1] < half[1];
        if !inside {
            return Err(GeometryError::Degenerate(format!(
                "opening at ({}, {}) with radii {:?} does not lie strictly inside the {} x {} box",
                opening_center.x, opening_center.y, opening_radii, box_dimensions[0], box_dimensions[1]
            ))
            .into());
        }

        Ok(Self {
            box_dimensions,
            opening_center,
            opening_radii,
            opening_mesh_step,
            mode,
        })
    }

    #[must_use]
    pub fn box_dimensions(&self) -> [f64; 2] {
        self.box_dimensions
    }

    #[must_use]
    pub fn opening_center(&self) -> &Point2 {
        &self.opening_center
    }

    #[must_use]
    pub fn opening_radii(&self) -> [f64; 2] {
        self.opening_radii
    }

    #[must_use]
    pub fn opening_mesh_step(&self) -> f64 {
        self.opening_mesh_step
    }

    #[must_use]
    pub fn mode(&self) -> OpeningMode {
        self.mode
    }

    /// Smallest gap between the opening's bounding box and the box sides.
    #[must_use]
    pub fn opening_clearance(&self) -> f64 {
        let [w, h] = self.box_dimensions;
        let [rx, ry] = self.opening_radii;
        (w / 2.0 - self.opening_center.x.abs() - rx).min(h / 2.0 - self.opening_center.y.abs() - ry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_centred_opening() {
        let cfg = GeometryConfig::new(
            [100.0, 50.0],
            Point2::origin(),
            [5.0, 5.0],
            1.0,
            OpeningMode::Cut,
        );
        assert!(cfg.is_ok());
    }

    #[test]
    fn rejects_opening_touching_box() {
        let cfg = GeometryConfig::new(
            [100.0, 50.0],
            Point2::new(0.0, 20.0),
            [5.0, 5.0],
            1.0,
            OpeningMode::Cut,
        );
        assert!(cfg.is_err());
    }

    #[test]
    fn clearance_to_nearest_side() {
        let cfg = GeometryConfig::new(
            [100.0, 50.0],
            Point2::new(3.0, 19.0),
            [5.0, 4.0],
            1.0,
            OpeningMode::Cut,
        )
        .unwrap();
        assert!((cfg.opening_clearance() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_positive_step() {
        let cfg = GeometryConfig::new(
            [100.0, 50.0],
            Point2::origin(),
            [5.0, 5.0],
            0.0,
            OpeningMode::Keep,
        );
        assert!(cfg.is_err());
    }
}
