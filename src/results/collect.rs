use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, Result, ValidationError};

use super::format::QuantitySpec;
use super::observe::{ObserveData, OBSERVE_FILE};
use super::validate::validate;

/// What to extract from the solver output and the bounds it must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Observed quantity, e.g. `pressure_p0`.
    #[serde(default = "default_quantity")]
    pub quantity: String,

    #[serde(default = "default_unit")]
    pub unit: String,

    /// Observation point names, in result vector order.
    #[serde(default)]
    pub points: Vec<String>,

    #[serde(default = "default_min")]
    pub min: f64,

    #[serde(default = "default_max")]
    pub max: f64,

    /// Files that must exist in the output directory before extraction.
    #[serde(default = "default_result_files")]
    pub result_files: Vec<String>,
}

fn default_quantity() -> String {
    "pressure_p0".into()
}
fn default_unit() -> String {
    "m".into()
}
fn default_min() -> f64 {
    f64::NEG_INFINITY
}
fn default_max() -> f64 {
    f64::INFINITY
}
fn default_result_files() -> Vec<String> {
    vec![OBSERVE_FILE.into()]
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            quantity: default_quantity(),
            unit: default_unit(),
            points: Vec::new(),
            min: default_min(),
            max: default_max(),
            result_files: default_result_files(),
        }
    }
}

impl ExtractConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if no observation point is named or
    /// the bounds are inverted.
    pub fn validate(&self) -> Result<()> {
        if self.points.is_empty() {
            return Err(ConfigError::Invalid("extract.points is empty".into()).into());
        }
        if self.min.is_nan() || self.max.is_nan() || self.min > self.max {
            return Err(ConfigError::Invalid(format!(
                "extract bounds [{}, {}] are invalid",
                self.min, self.max
            ))
            .into());
        }
        Ok(())
    }

    /// Result vector layout for the time axis `times`.
    #[must_use]
    pub fn quantity_spec(&self, times: Vec<f64>) -> QuantitySpec {
        QuantitySpec {
            name: self.quantity.clone(),
            unit: self.unit.clone(),
            shape: [1, 1],
            times,
            locations: self.points.clone(),
        }
    }
}

/// Extracts and validates the result vector from a finished solver run.
///
/// One series per observation point is read from the observation file in
/// `output_dir`, validated against `times.len()` and the configured bounds,
/// and the series are concatenated in point order.
///
/// # Errors
///
/// Returns [`ValidationError::MissingResults`] if an expected result file is
/// absent, or the first extraction or validation error.
pub fn collect_results(output_dir: &Path, extract: &ExtractConfig, times: &[f64]) -> Result<Vec<f64>> {
    extract.validate()?;
    let missing: Vec<PathBuf> = extract
        .result_files
        .iter()
        .map(|f| output_dir.join(f))
        .filter(|f| !f.is_file())
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingResults(missing).into());
    }

    let observed = ObserveData::load(output_dir.join(OBSERVE_FILE))?;
    let mut result = Vec::with_capacity(times.len() * extract.points.len());
    for point in &extract.points {
        let series = observed.series(&extract.quantity, point)?;
        result.extend(validate(series, extract.min, extract.max, times.len())?);
    }
    info!(
        quantity = %extract.quantity,
        points = extract.points.len(),
        values = result.len(),
        "results collected"
    );
    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;
    use crate::error::FlowMcError;

    fn extract() -> ExtractConfig {
        ExtractConfig {
            points: vec!["V1".into(), "V0".into()],
            min: 0.0,
            max: 1000.0,
            ..ExtractConfig::default()
        }
    }

    fn write_observe(dir: &Path, last: &str) {
        fs::write(
            dir.join(OBSERVE_FILE),
            format!(
                "points:\n  - name: V0\n  - name: V1\ndata:\n  \
                 - time: 0\n    pressure_p0: [1, 2]\n  \
                 - time: 5\n    pressure_p0: [3, {last}]\n"
            ),
        )
        .unwrap();
    }

    #[test]
    fn series_are_concatenated_in_point_order() {
        let dir = tempfile::tempdir().unwrap();
        write_observe(dir.path(), "4");
        let r = collect_results(dir.path(), &extract(), &[0.0, 5.0]).unwrap();
        assert_eq!(r, vec![2.0, 4.0, 1.0, 3.0]);
    }

    #[test]
    fn missing_files_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_results(dir.path(), &extract(), &[0.0, 5.0]).unwrap_err();
        match err {
            FlowMcError::Validation(ValidationError::MissingResults(files)) => {
                assert_eq!(files, vec![dir.path().join(OBSERVE_FILE)]);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn invalid_values_are_not_replaced() {
        let dir = tempfile::tempdir().unwrap();
        write_observe(dir.path(), ".nan");
        assert!(matches!(
            collect_results(dir.path(), &extract(), &[0.0, 5.0]).unwrap_err(),
            FlowMcError::Validation(ValidationError::NonFinite { index: 1 })
        ));
        write_observe(dir.path(), "4");
        assert!(matches!(
            collect_results(dir.path(), &extract(), &[0.0, 5.0, 10.0]).unwrap_err(),
            FlowMcError::Validation(ValidationError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn config_defaults_from_yaml() {
        let cfg: ExtractConfig = serde_yaml::from_str("points: [V0]\nmax: 500\n").unwrap();
        assert_eq!(cfg.quantity, "pressure_p0");
        assert_eq!(cfg.result_files, vec![OBSERVE_FILE]);
        assert!(cfg.min.is_infinite());
        assert!(cfg.validate().is_ok());
        assert!(ExtractConfig::default().validate().is_err());
    }
}
