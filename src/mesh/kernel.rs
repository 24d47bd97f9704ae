use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::error::Result;

use super::{Mesh, MeshSizePolicy};

/// Surface meshing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshAlgorithm {
    /// Constrained Delaunay triangulation refined until the size field is met.
    #[default]
    ConstrainedDelaunay,
    /// Triangulate the discretised boundary only, without interior points.
    BoundaryConforming,
}

/// Settings of a meshing kernel that are not part of the size policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelOptions {
    pub algorithm: MeshAlgorithm,
    /// Hard cap on the number of mesh nodes.
    pub max_nodes: usize,
    /// Maximum number of refinement sweeps.
    pub max_passes: usize,
}

impl Default for KernelOptions {
    fn default() -> Self {
        Self {
            algorithm: MeshAlgorithm::default(),
            max_nodes: 200_000,
            max_passes: 64,
        }
    }
}

/// The mesh produced by a kernel together with its log.
#[derive(Debug, Clone, Default)]
pub struct KernelOutput {
    pub mesh: Mesh,
    /// Log lines in `Info    : ...` / `Error   : ...` form.
    pub log: Vec<String>,
}

/// A meshing backend.
///
/// Implementations must be deterministic: meshing the same domain with the
/// same policy twice gives the same mesh. A kernel may succeed and still
/// leave a region without elements; that is reported through the log.
pub trait MeshingKernel {
    /// Meshes the surfaces of `domain`.
    ///
    /// # Errors
    ///
    /// Returns an error if the kernel cannot process the domain at all.
    fn mesh(&self, domain: &Domain, policy: &MeshSizePolicy) -> Result<KernelOutput>;
}
