use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// One `output_times` record: output every `step` from `begin` up to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputTimes {
    pub begin: f64,
    pub step: f64,
    pub end: f64,
}

/// Description of one extracted quantity, used to interpret the result
/// vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantitySpec {
    pub name: String,
    pub unit: String,
    pub shape: [usize; 2],
    pub times: Vec<f64>,
    pub locations: Vec<String>,
}

impl QuantitySpec {
    /// Number of values this quantity contributes to a result vector.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shape[0] * self.shape[1] * self.times.len() * self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds the output time axis.
///
/// Each record contributes `begin, begin + step, ...` strictly below `end`;
/// the `end` of the last record closes the axis.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if there are no records or a record has
/// a non-positive step or an end before its begin.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn output_times(records: &[OutputTimes]) -> Result<Vec<f64>> {
    let Some(last) = records.last() else {
        return Err(ConfigError::Invalid("output_times is empty".into()).into());
    };
    let mut times = Vec::new();
    for rec in records {
        let finite = rec.begin.is_finite() && rec.step.is_finite() && rec.end.is_finite();
        if !finite || rec.step <= 0.0 || rec.end < rec.begin {
            return Err(ConfigError::Invalid(format!(
                "invalid output_times record begin={} step={} end={}",
                rec.begin, rec.step, rec.end
            ))
            .into());
        }
        let count = ((rec.end - rec.begin) / rec.step).ceil() as usize;
        times.extend((0..count).map(|i| rec.begin + rec.step * i as f64));
    }
    times.push(last.end);
    Ok(times)
}
