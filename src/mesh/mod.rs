//! Finite-element meshes of the domain and their generation.

mod cdt;
mod generate;
mod kernel;
pub mod msh;

pub use cdt::CdtKernel;
pub use generate::{check_mesh_log, generate_mesh};
pub use kernel::{KernelOptions, KernelOutput, MeshAlgorithm, MeshingKernel};

use crate::error::{MeshError, Result};
use crate::geometry::GeometryConfig;
use crate::math::Point2;

/// Element types handled by the pipeline, with their MSH type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// 2-node line (MSH type 1).
    Line,
    /// 3-node triangle (MSH type 2).
    Triangle,
    /// 1-node point (MSH type 15).
    Point,
}

impl ElementKind {
    /// MSH element type code.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            ElementKind::Line => 1,
            ElementKind::Triangle => 2,
            ElementKind::Point => 15,
        }
    }

    /// Element kind for an MSH type code.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnsupportedElement`] for any other code.
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            1 => Ok(ElementKind::Line),
            2 => Ok(ElementKind::Triangle),
            15 => Ok(ElementKind::Point),
            other => Err(MeshError::UnsupportedElement(other).into()),
        }
    }

    /// Number of nodes of the element.
    #[must_use]
    pub fn node_count(self) -> usize {
        match self {
            ElementKind::Line => 2,
            ElementKind::Triangle => 3,
            ElementKind::Point => 1,
        }
    }

    /// Topological dimension.
    #[must_use]
    pub fn dim(self) -> usize {
        match self {
            ElementKind::Point => 0,
            ElementKind::Line => 1,
            ElementKind::Triangle => 2,
        }
    }
}

/// A mesh element. Node indices are zero-based into [`Mesh::nodes`].
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    /// Physical group id, `0` when the element belongs to no group.
    pub physical: u32,
    /// Id of the geometric entity the element was generated on.
    pub entity: u32,
    pub nodes: Vec<usize>,
}

/// A named physical group of the mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalGroup {
    pub dim: usize,
    pub id: u32,
    pub name: String,
}

/// An unstructured planar mesh with its physical-group table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub nodes: Vec<Point2>,
    pub elements: Vec<Element>,
    pub physical_groups: Vec<PhysicalGroup>,
}

impl Mesh {
    /// Number of elements of the given kind.
    #[must_use]
    pub fn count(&self, kind: ElementKind) -> usize {
        self.elements.iter().filter(|e| e.kind == kind).count()
    }

    /// Looks up a physical group by name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&PhysicalGroup> {
        self.physical_groups.iter().find(|g| g.name == name)
    }

    /// Elements belonging to the named physical group.
    pub fn group_elements<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Element> + 'a {
        let id = self.group(name).map(|g| g.id);
        self.elements
            .iter()
            .filter(move |e| id.is_some_and(|id| e.physical == id))
    }

    /// Returns `true` if the mesh has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Element-size policy of the mesh generator.
///
/// Local sizes requested on shapes are grown away from their shape by
/// `boundary_growth` per unit distance and clamped to `[min_size, max_size]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSizePolicy {
    pub min_size: f64,
    pub max_size: f64,
    pub boundary_growth: f64,
    /// Use local sizes requested on shapes.
    pub from_points: bool,
    /// Resolve curved boundaries with at least `min_circle_points` per turn.
    pub from_curvature: bool,
    pub min_circle_points: usize,
    pub min_curve_points: usize,
    /// Size applied to opening shapes that request none themselves.
    pub opening_step: Option<f64>,
}

impl Default for MeshSizePolicy {
    fn default() -> Self {
        Self {
            min_size: 0.0,
            max_size: f64::INFINITY,
            boundary_growth: 0.5,
            from_points: true,
            from_curvature: true,
            min_circle_points: 6,
            min_curve_points: 2,
            opening_step: None,
        }
    }
}

impl MeshSizePolicy {
    /// The default policy for a domain: half the opening step as minimum,
    /// a tenth of the larger box side as maximum.
    #[must_use]
    pub fn for_geometry(config: &GeometryConfig) -> Self {
        let [w, h] = config.box_dimensions();
        Self {
            min_size: config.opening_mesh_step() / 2.0,
            max_size: w.max(h) / 10.0,
            opening_step: Some(config.opening_mesh_step()),
            ..Self::default()
        }
    }

    /// Checks the policy.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidSizePolicy`] if a size is not positive, if
    /// `min_size > max_size` or a point count is too small.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(MeshError::InvalidSizePolicy(msg).into()) };
        if !(self.min_size > 0.0 && self.min_size.is_finite()) {
            return invalid(format!("min size must be positive, got {}", self.min_size));
        }
        if !(self.max_size.is_finite() && self.min_size <= self.max_size) {
            return invalid(format!(
                "min size {} exceeds max size {}",
                self.min_size, self.max_size
            ));
        }
        if !(self.boundary_growth >= 0.0 && self.boundary_growth.is_finite()) {
            return invalid(format!(
                "boundary growth must be non-negative, got {}",
                self.boundary_growth
            ));
        }
        if self.min_circle_points < 3 || self.min_curve_points < 2 {
            return invalid("curves need at least 2 points, circles at least 3".into());
        }
        if let Some(step) = self.opening_step {
            if !(step > 0.0 && step.is_finite()) {
                return invalid(format!("opening step must be positive, got {step}"));
            }
        }
        Ok(())
    }

    /// Clamps a requested size into `[min_size, max_size]`.
    #[must_use]
    pub fn clamp(&self, size: f64) -> f64 {
        size.clamp(self.min_size, self.max_size)
    }
}
