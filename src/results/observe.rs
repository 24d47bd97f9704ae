use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{ConfigError, FlowMcError, Result, ValidationError};

/// Name of the solver's point observation output.
pub const OBSERVE_FILE: &str = "flow_observe.yaml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObservePoint {
    pub name: String,
}

/// Values of all observed quantities at one output time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObserveRecord {
    pub time: f64,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

/// Parsed point observation file.
///
/// Each record holds, per quantity, one entry per observation point in the
/// order of `points`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObserveData {
    pub points: Vec<ObservePoint>,
    pub data: Vec<ObserveRecord>,
}

impl ObserveData {
    /// Loads an observation file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// observation document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| FlowMcError::io(path, e))?;
        Self::from_yaml_str(&content)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `content` is not a valid observation
    /// document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    #[must_use]
    pub fn times(&self) -> Vec<f64> {
        self.data.iter().map(|r| r.time).collect()
    }

    /// Time series of `quantity` at the observation point named `point`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingQuantity`] if the point is unknown or
    /// some record lacks a scalar value for it.
    pub fn series(&self, quantity: &str, point: &str) -> Result<Vec<f64>> {
        let missing = || -> FlowMcError {
            ValidationError::MissingQuantity {
                quantity: quantity.to_owned(),
                point: point.to_owned(),
            }
            .into()
        };
        let index = self
            .points
            .iter()
            .position(|p| p.name == point)
            .ok_or_else(missing)?;
        self.data
            .iter()
            .map(|record| {
                record
                    .fields
                    .get(quantity)
                    .and_then(|v| v.as_sequence())
                    .and_then(|values| values.get(index))
                    .and_then(scalar)
                    .ok_or_else(missing)
            })
            .collect()
    }
}

/// A number, or a one-component vector holding a number.
fn scalar(value: &Value) -> Option<f64> {
    match value {
        Value::Sequence(items) if items.len() == 1 => items[0].as_f64(),
        other => other.as_f64(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const OBSERVE: &str = "\
points:
  - name: V0
    observe_point: [10, 0]
  - name: V1
    observe_point: [20, 0]
data:
  - time: 0
    pressure_p0: [100, 200]
  - time: 10
    pressure_p0: [[101], [199.5]]
  - time: 20
    pressure_p0: [102, .nan]
";

    #[test]
    fn series_per_point() {
        let obs = ObserveData::from_yaml_str(OBSERVE).unwrap();
        assert_eq!(obs.times(), vec![0.0, 10.0, 20.0]);
        assert_eq!(obs.series("pressure_p0", "V0").unwrap(), vec![100.0, 101.0, 102.0]);
        let v1 = obs.series("pressure_p0", "V1").unwrap();
        assert_relative_eq!(v1[1], 199.5);
        assert!(v1[2].is_nan());
    }

    #[test]
    fn unknown_point_or_quantity() {
        let obs = ObserveData::from_yaml_str(OBSERVE).unwrap();
        assert!(matches!(
            obs.series("pressure_p0", "V7").unwrap_err(),
            FlowMcError::Validation(ValidationError::MissingQuantity { .. })
        ));
        assert!(obs.series("velocity_p0", "V0").is_err());
    }

    #[test]
    fn malformed_document() {
        assert!(matches!(
            ObserveData::from_yaml_str("points: 3").unwrap_err(),
            FlowMcError::Config(ConfigError::Parse(_))
        ));
    }
}
