//! Per-sample configuration.
//!
//! The YAML document handed over by the sampler is parsed once into
//! [`SampleConfig`] and then split into the immutable structs each stage
//! consumes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::{ConfigError, FlowMcError, Result};
use crate::geometry::{GeometryConfig, OpeningMode};
use crate::heal::HealConfig;
use crate::math::Point2;
use crate::mesh::{KernelOptions, MeshAlgorithm, MeshSizePolicy};
use crate::results::{output_times, ExtractConfig, OutputTimes, QuantitySpec};
use crate::solver::{SolverCommand, SolverParams};

/// Name of the coupled hydro-mechanical solver phase.
pub const HM_PHASE: &str = "hm_params";

/// Geometry parameters as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometrySection {
    pub box_dimensions: [f64; 2],

    /// Opening centre; components beyond the second are ignored.
    pub tunnel_center: Vec<f64>,

    /// Opening extent (diameter) along x.
    #[serde(rename = "tunnel_dimX")]
    pub tunnel_dim_x: f64,

    /// Opening extent (diameter) along y.
    #[serde(rename = "tunnel_dimY")]
    pub tunnel_dim_y: f64,

    pub tunnel_mesh_step: f64,

    /// Remove the opening from the domain instead of meshing it.
    #[serde(default = "default_true")]
    pub cut_tunnel: bool,
}

/// Optional overrides of the default mesh size policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSection {
    pub min_size: Option<f64>,
    pub max_size: Option<f64>,
    pub boundary_growth: Option<f64>,
    pub from_points: Option<bool>,
    pub from_curvature: Option<bool>,
    pub min_circle_points: Option<usize>,
    pub min_curve_points: Option<usize>,
    pub algorithm: Option<MeshAlgorithm>,
    pub max_nodes: Option<usize>,
}

/// Configuration of one Monte-Carlo sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    pub geometry: GeometrySection,

    /// Base name of the generated mesh files.
    pub mesh_name: String,

    pub output_times: Vec<OutputTimes>,

    /// Substitution parameters of the solver input; `in_file` names the
    /// template.
    pub hm_params: BTreeMap<String, Value>,

    /// Only collect results of a previous run.
    #[serde(default)]
    pub collect_only: bool,

    /// Stop after the mesh is prepared.
    #[serde(default)]
    pub mesh_only: bool,

    /// Directory of precomputed healed meshes to sample from.
    #[serde(default)]
    pub mesh_repository: Option<PathBuf>,

    /// Files copied from `script_dir` into the common files directory.
    #[serde(default)]
    pub copy_files: Vec<String>,

    #[serde(default = "default_dir")]
    pub script_dir: PathBuf,

    #[serde(default = "default_dir")]
    pub work_dir: PathBuf,

    /// Solver executable followed by any leading arguments.
    #[serde(alias = "_aux_flow_path")]
    pub flow_executable: Vec<String>,

    #[serde(default = "default_task_size")]
    pub task_size: f64,

    /// Set by the level instance; defaults to `<work_dir>/common_files`.
    #[serde(default)]
    pub common_files_dir: Option<PathBuf>,

    #[serde(default)]
    pub mesh: MeshSection,

    #[serde(default)]
    pub heal: HealConfig,

    #[serde(default)]
    pub extract: ExtractConfig,

    /// Solver time limit in seconds.
    #[serde(default)]
    pub solver_timeout: Option<f64>,
}

fn default_true() -> bool {
    true
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_task_size() -> f64 {
    1.0
}

impl SampleConfig {
    /// Loads the configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| FlowMcError::io(path, e))?;
        Self::from_yaml_str(&content)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `content` is not a valid
    /// configuration.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, content).map_err(|e| FlowMcError::io(path, e))
    }

    #[must_use]
    pub fn opening_mode(&self) -> OpeningMode {
        if self.geometry.cut_tunnel {
            OpeningMode::Cut
        } else {
            OpeningMode::Keep
        }
    }

    /// Base name of the raw mesh: `mesh_name`, suffixed `_cut` when the
    /// opening is removed.
    #[must_use]
    pub fn mesh_stem(&self) -> String {
        match self.opening_mode() {
            OpeningMode::Cut => format!("{}_cut", self.mesh_name),
            OpeningMode::Keep => self.mesh_name.clone(),
        }
    }

    #[must_use]
    pub fn common_files_dir(&self) -> PathBuf {
        self.common_files_dir
            .clone()
            .unwrap_or_else(|| self.work_dir.join("common_files"))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the opening centre has fewer than
    /// two components, or the geometry error of [`GeometryConfig::new`].
    pub fn geometry_config(&self) -> Result<GeometryConfig> {
        let g = &self.geometry;
        let [x, y] = match g.tunnel_center.as_slice() {
            [x, y, ..] => [*x, *y],
            _ => {
                return Err(
                    ConfigError::Invalid("tunnel_center needs two coordinates".into()).into(),
                )
            }
        };
        GeometryConfig::new(
            g.box_dimensions,
            Point2::new(x, y),
            [g.tunnel_dim_x / 2.0, g.tunnel_dim_y / 2.0],
            g.tunnel_mesh_step,
            self.opening_mode(),
        )
    }

    /// The default policy for `geometry` with the configured overrides.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::MeshError::InvalidSizePolicy`] if the
    /// resulting policy is invalid.
    pub fn size_policy(&self, geometry: &GeometryConfig) -> Result<MeshSizePolicy> {
        let m = &self.mesh;
        let base = MeshSizePolicy::for_geometry(geometry);
        let policy = MeshSizePolicy {
            min_size: m.min_size.unwrap_or(base.min_size),
            max_size: m.max_size.unwrap_or(base.max_size),
            boundary_growth: m.boundary_growth.unwrap_or(base.boundary_growth),
            from_points: m.from_points.unwrap_or(base.from_points),
            from_curvature: m.from_curvature.unwrap_or(base.from_curvature),
            min_circle_points: m.min_circle_points.unwrap_or(base.min_circle_points),
            min_curve_points: m.min_curve_points.unwrap_or(base.min_curve_points),
            opening_step: base.opening_step,
        };
        policy.validate()?;
        Ok(policy)
    }

    #[must_use]
    pub fn kernel_options(&self) -> KernelOptions {
        let base = KernelOptions::default();
        KernelOptions {
            algorithm: self.mesh.algorithm.unwrap_or(base.algorithm),
            max_nodes: self.mesh.max_nodes.unwrap_or(base.max_nodes),
            ..base
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for invalid tolerances.
    pub fn heal_config(&self) -> Result<HealConfig> {
        self.heal.validate()?;
        Ok(self.heal)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the executable is empty or the
    /// time limit is not a positive number of seconds.
    pub fn solver_command(&self) -> Result<SolverCommand> {
        let timeout = match self.solver_timeout {
            None => None,
            Some(s) if s > 0.0 && s.is_finite() => Some(Duration::from_secs_f64(s)),
            Some(s) => {
                return Err(ConfigError::Invalid(format!("solver_timeout = {s}")).into());
            }
        };
        SolverCommand::new(self.flow_executable.clone(), timeout)
    }

    #[must_use]
    pub fn solver_params(&self) -> SolverParams {
        SolverParams::new(BTreeMap::from([(
            HM_PHASE.to_owned(),
            self.hm_params.clone(),
        )]))
    }

    #[must_use]
    pub fn extract_config(&self) -> &ExtractConfig {
        &self.extract
    }

    /// The output time axis.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty or malformed
    /// `output_times`.
    pub fn times(&self) -> Result<Vec<f64>> {
        output_times(&self.output_times)
    }

    /// Layout of the result vector.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the time axis or the extraction
    /// settings are invalid.
    pub fn result_format(&self) -> Result<Vec<QuantitySpec>> {
        self.extract.validate()?;
        Ok(vec![self.extract.quantity_spec(self.times()?)])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use approx::assert_relative_eq;

    use super::*;

    pub(crate) const SAMPLE: &str = "\
geometry:
  box_dimensions: [100, 50]
  tunnel_center: [0, 0, 0]
  tunnel_dimX: 10
  tunnel_dimY: 10
  tunnel_mesh_step: 1.0
mesh_name: box
output_times:
  - {begin: 0, step: 10, end: 30}
hm_params:
  in_file: flow
  bulk_conductivity: 1
_aux_flow_path: [flow123d]
copy_files: [flow_tmpl.yaml]
extract:
  points: [V0, V1]
  min: 0
  max: 1000
";

    #[test]
    fn aliased_keys_are_read() {
        let cfg = SampleConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(cfg.flow_executable, vec!["flow123d"]);
        assert!(!cfg.collect_only && !cfg.mesh_only);
        assert_eq!(cfg.opening_mode(), OpeningMode::Cut);
        assert_eq!(cfg.mesh_stem(), "box_cut");
        assert_eq!(cfg.common_files_dir(), PathBuf::from("./common_files"));

        let geometry = cfg.geometry_config().unwrap();
        assert_eq!(geometry.opening_radii(), [5.0, 5.0]);
    }

    #[test]
    fn size_policy_defaults_and_overrides() {
        let mut cfg = SampleConfig::from_yaml_str(SAMPLE).unwrap();
        let geometry = cfg.geometry_config().unwrap();
        let policy = cfg.size_policy(&geometry).unwrap();
        assert_relative_eq!(policy.min_size, 0.5);
        assert_relative_eq!(policy.max_size, 10.0);

        cfg.mesh.max_size = Some(0.1);
        assert!(cfg.size_policy(&geometry).is_err());
    }

    #[test]
    fn result_format_from_extract() {
        let cfg = SampleConfig::from_yaml_str(SAMPLE).unwrap();
        let format = cfg.result_format().unwrap();
        assert_eq!(format.len(), 1);
        assert_eq!(format[0].name, "pressure_p0");
        assert_eq!(format[0].times, vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(format[0].locations, vec!["V0", "V1"]);
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let cfg = SampleConfig::from_yaml_str(SAMPLE).unwrap();
        cfg.save(&path).unwrap();
        assert_eq!(SampleConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn invalid_values() {
        let mut cfg = SampleConfig::from_yaml_str(SAMPLE).unwrap();
        cfg.solver_timeout = Some(-1.0);
        assert!(cfg.solver_command().is_err());
        cfg.geometry.tunnel_center = vec![0.0];
        assert!(cfg.geometry_config().is_err());
        assert!(matches!(
            SampleConfig::from_yaml_str("mesh_name: [").unwrap_err(),
            FlowMcError::Config(ConfigError::Parse(_))
        ));
    }
}
