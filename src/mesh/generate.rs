use std::path::Path;

use tracing::{debug, info, warn};

use crate::domain::Domain;
use crate::error::{MeshError, Result};

use super::kernel::MeshingKernel;
use super::{msh, Mesh, MeshSizePolicy};

/// Diagnostics the meshing kernel emits for a region it left without
/// elements.
const EMPTY_REGION_MARKERS: [&str; 2] = ["No elements in volume", "No elements in surface"];

/// Meshes `domain` and writes the raw mesh to `mesh_file`.
///
/// The kernel's log is scanned for empty-region diagnostics even when the
/// kernel itself succeeded.
///
/// # Errors
///
/// Returns [`MeshError::EmptyRegion`] when a region received no elements or
/// the mesh is empty, any error the kernel reports, or an I/O error when the
/// file cannot be written.
pub fn generate_mesh(
    kernel: &dyn MeshingKernel,
    domain: &Domain,
    policy: &MeshSizePolicy,
    mesh_file: &Path,
) -> Result<Mesh> {
    info!(mesh = %mesh_file.display(), "meshing");
    let output = kernel.mesh(domain, policy)?;
    for line in &output.log {
        if line.starts_with("Warning") {
            warn!("{line}");
        } else {
            debug!("{line}");
        }
    }
    check_mesh_log(output.log.as_slice())?;
    if output.mesh.is_empty() {
        return Err(MeshError::EmptyRegion("mesh has no elements".into()).into());
    }
    msh::write_msh(&output.mesh, mesh_file)?;
    info!(
        nodes = output.mesh.nodes.len(),
        elements = output.mesh.elements.len(),
        "mesh written"
    );
    Ok(output.mesh)
}

/// Fails if the kernel log reports a region without elements.
///
/// # Errors
///
/// Returns [`MeshError::EmptyRegion`] carrying the offending log line.
pub fn check_mesh_log<S: AsRef<str>>(lines: &[S]) -> Result<()> {
    match lines
        .iter()
        .map(AsRef::<str>::as_ref)
        .find(|line| EMPTY_REGION_MARKERS.iter().any(|m| line.contains(*m)))
    {
        Some(line) => Err(MeshError::EmptyRegion(line.trim().to_owned()).into()),
        None => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::build_domain;
    use crate::error::FlowMcError;
    use crate::geometry::{GeometryConfig, OpeningMode};
    use crate::math::Point2;
    use crate::mesh::{CdtKernel, KernelOutput};
    use crate::model::ModelOptions;

    /// Kernel that succeeds but reports an empty volume, the way the
    /// 3-D mesher does after a failed boundary recovery.
    struct EmptyVolumeKernel;

    impl MeshingKernel for EmptyVolumeKernel {
        fn mesh(&self, _: &Domain, _: &MeshSizePolicy) -> Result<KernelOutput> {
            Ok(KernelOutput {
                mesh: Mesh::default(),
                log: vec![
                    "Error   : HXT 3D mesh failed".into(),
                    "Error   : No elements in volume 1".into(),
                    "Info    : 13958 nodes 34061 elements".into(),
                ],
            })
        }
    }

    fn domain() -> Domain {
        let cfg = GeometryConfig::new(
            [100.0, 50.0],
            Point2::origin(),
            [5.0, 5.0],
            1.0,
            OpeningMode::Cut,
        )
        .unwrap();
        build_domain(&cfg, "test", ModelOptions::default()).unwrap()
    }

    #[test]
    fn empty_volume_diagnostic_fails() {
        let log = ["Info    : Meshing 3D...", "Error   : No elements in volume 1"];
        let err = check_mesh_log(&log).unwrap_err();
        assert!(matches!(err, FlowMcError::Mesh(MeshError::EmptyRegion(_))));
        assert!(check_mesh_log(&["Info    : Done meshing 2D"]).is_ok());
    }

    #[test]
    fn successful_kernel_with_empty_volume_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("m.msh");
        let policy = MeshSizePolicy {
            min_size: 0.5,
            max_size: 10.0,
            ..MeshSizePolicy::default()
        };
        let err = generate_mesh(&EmptyVolumeKernel, &domain(), &policy, &file).unwrap_err();
        assert!(matches!(err, FlowMcError::Mesh(MeshError::EmptyRegion(_))));
        assert!(!file.exists());
    }

    #[test]
    fn generated_mesh_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("m.msh");
        let policy = MeshSizePolicy {
            min_size: 0.5,
            max_size: 10.0,
            ..MeshSizePolicy::default()
        };
        let mesh = generate_mesh(&CdtKernel::default(), &domain(), &policy, &file).unwrap();
        assert_eq!(msh::read_msh(&file).unwrap(), mesh);
    }
}
