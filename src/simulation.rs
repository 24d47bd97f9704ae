//! Entry points called by the Monte-Carlo sampler.
//!
//! One sample runs through the stages [`Stage::NotStarted`] →
//! [`Stage::Meshed`] → [`Stage::Solved`] → [`Stage::Collected`] inside its
//! own working directory. `collect_only` enters at `Solved`, `mesh_only`
//! stops at `Meshed`.

use std::fs;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::{SampleConfig, HM_PHASE};
use crate::domain::build_domain;
use crate::error::{ConfigError, FlowMcError, Result};
use crate::heal::heal_file;
use crate::mesh::{generate_mesh, CdtKernel, MeshingKernel};
use crate::model::ModelOptions;
use crate::results::{collect_results, QuantitySpec};
use crate::solver::{ProcessRunner, SolverDriver, SystemRunner};

/// Pipeline stage reached by a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    NotStarted,
    Meshed,
    Solved,
    Collected,
}

/// Everything a worker needs to compute samples of one level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSimulation {
    pub config: SampleConfig,
    pub task_size: f64,
}

/// The simulation as seen by the sampler.
#[derive(Debug, Clone)]
pub struct FlowSimulation {
    config: SampleConfig,
    clean: bool,
}

impl FlowSimulation {
    /// `clean` recreates the common files directory on every level instance.
    #[must_use]
    pub fn new(config: SampleConfig, clean: bool) -> Self {
        Self { config, clean }
    }

    #[must_use]
    pub fn config(&self) -> &SampleConfig {
        &self.config
    }

    /// Prepares `<work_dir>/common_files` and returns the level description.
    ///
    /// The files listed in `copy_files` are copied there from `script_dir`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created or a file
    /// cannot be copied.
    pub fn level_instance(&self) -> Result<LevelSimulation> {
        let mut config = self.config.clone();
        let common = config.work_dir.join("common_files");
        if self.clean && common.is_dir() {
            fs::remove_dir_all(&common).map_err(|e| FlowMcError::io(&common, e))?;
        }
        fs::create_dir_all(&common).map_err(|e| FlowMcError::io(&common, e))?;

        for name in &config.copy_files {
            let src = config.script_dir.join(name);
            fs::copy(&src, common.join(name)).map_err(|e| FlowMcError::io(&src, e))?;
        }
        debug!(dir = %common.display(), files = config.copy_files.len(), "common files ready");

        config.common_files_dir = Some(common);
        let task_size = config.task_size;
        Ok(LevelSimulation { config, task_size })
    }

    /// Layout of the result vector returned by [`calculate`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the time axis or the extraction
    /// settings are invalid.
    pub fn result_format(&self) -> Result<Vec<QuantitySpec>> {
        self.config.result_format()
    }
}

/// Computes one sample in `sample_dir` and returns its fine and coarse
/// results, which coincide.
///
/// `seed` only drives the choice of a mesh from `mesh_repository`.
///
/// # Errors
///
/// Returns the first error of any stage; no result is substituted.
pub fn calculate(config: &SampleConfig, seed: u64, sample_dir: &Path) -> Result<[Vec<f64>; 2]> {
    let kernel = CdtKernel::new(config.kernel_options());
    calculate_with(config, seed, sample_dir, SystemRunner, &kernel)
}

/// [`calculate`] with an explicit process runner and meshing kernel.
///
/// # Errors
///
/// Returns the first error of any stage.
pub fn calculate_with<R: ProcessRunner>(
    config: &SampleConfig,
    seed: u64,
    sample_dir: &Path,
    runner: R,
    kernel: &dyn MeshingKernel,
) -> Result<[Vec<f64>; 2]> {
    // `collect_only` takes precedence over `mesh_only`.
    let (mut stage, target) = if config.collect_only {
        (Stage::Solved, Stage::Collected)
    } else if config.mesh_only {
        (Stage::NotStarted, Stage::Meshed)
    } else {
        (Stage::NotStarted, Stage::Collected)
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let mut driver = SolverDriver::new(
        runner,
        config.solver_command()?,
        config.solver_params(),
        config.common_files_dir(),
        sample_dir,
    );
    let mut result = Vec::new();

    while stage < target {
        stage = match stage {
            Stage::NotStarted => {
                let mesh = match &config.mesh_repository {
                    Some(repo) => {
                        let dest = sample_dir.join(format!("{}_healed.msh", config.mesh_name));
                        sample_mesh_repository(repo, &dest, &mut rng)?
                    }
                    None => prepare_mesh(config, sample_dir, kernel)?,
                };
                let name = mesh
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                driver = driver.with_param("mesh", name);
                Stage::Meshed
            }
            Stage::Meshed => {
                driver
                    .run(HM_PHASE, &config.extract.result_files)?
                    .ensure_success()?;
                Stage::Solved
            }
            Stage::Solved | Stage::Collected => {
                let output_dir = sample_dir.join(config.solver_params().output_dir(HM_PHASE)?);
                result = collect_results(&output_dir, config.extract_config(), &config.times()?)?;
                Stage::Collected
            }
        };
        debug!(?stage, "stage reached");
    }

    info!(?stage, values = result.len(), "sample finished");
    Ok([result.clone(), result])
}

/// Builds, meshes and heals the domain in `dir` unless the files exist.
///
/// The raw mesh is `<stem>.msh` and the healed one `<stem>_healed.msh`,
/// where the stem is `mesh_name` with `_cut` appended when the opening is
/// removed. Returns the healed mesh path.
///
/// # Errors
///
/// Returns any geometry, meshing or healing error.
pub fn prepare_mesh(config: &SampleConfig, dir: &Path, kernel: &dyn MeshingKernel) -> Result<PathBuf> {
    let stem = config.mesh_stem();
    let mesh_file = dir.join(format!("{stem}.msh"));
    if mesh_file.is_file() {
        debug!(mesh = %mesh_file.display(), "raw mesh present");
    } else {
        let geometry = config.geometry_config()?;
        let policy = config.size_policy(&geometry)?;
        let domain = build_domain(&geometry, &stem, ModelOptions::default())?;
        generate_mesh(kernel, &domain, &policy, &mesh_file)?;
    }

    let healed = dir.join(format!("{stem}_healed.msh"));
    if healed.is_file() {
        debug!(mesh = %healed.display(), "healed mesh present");
    } else {
        let (written, stats) = heal_file(&mesh_file, config.heal_config()?)?;
        debug_assert_eq!(written, healed);
        if stats.discarded() > 0 {
            warn!(
                mesh = %written.display(),
                discarded = stats.discarded(),
                "healed mesh has holes where badly shaped triangles were discarded"
            );
        }
        info!(
            mesh = %written.display(),
            discarded = stats.discarded(),
            "mesh prepared"
        );
    }
    Ok(healed)
}

/// Copies a randomly chosen file of `repository` to `dest`.
///
/// The listing is sorted so a given generator state always picks the same
/// file.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the repository holds no file, or an
/// I/O error.
pub fn sample_mesh_repository<G: Rng>(repository: &Path, dest: &Path, rng: &mut G) -> Result<PathBuf> {
    let entries = fs::read_dir(repository).map_err(|e| FlowMcError::io(repository, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| FlowMcError::io(repository, e))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let Some(chosen) = files.choose(rng) else {
        return Err(ConfigError::Invalid(format!(
            "mesh repository {} is empty",
            repository.display()
        ))
        .into());
    };
    fs::copy(chosen, dest).map_err(|e| FlowMcError::io(chosen, e))?;
    info!(source = %chosen.display(), mesh = %dest.display(), "mesh sampled from repository");
    Ok(dest.to_path_buf())
}
