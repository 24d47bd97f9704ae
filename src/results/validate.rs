use crate::error::{Result, ValidationError};

/// Checks an extracted series against the time axis length and the
/// physical bounds `[min, max]`, returning it unchanged if it passes.
///
/// Checks run in order: length, finiteness, minimum, maximum.
///
/// # Errors
///
/// Returns [`ValidationError::LengthMismatch`], [`ValidationError::NonFinite`]
/// or [`ValidationError::OutOfRange`] for the first failed check.
pub fn validate(series: Vec<f64>, min: f64, max: f64, expected_len: usize) -> Result<Vec<f64>> {
    if series.len() != expected_len {
        return Err(ValidationError::LengthMismatch {
            expected: expected_len,
            actual: series.len(),
        }
        .into());
    }
    if let Some(index) = series.iter().position(|v| !v.is_finite()) {
        return Err(ValidationError::NonFinite { index }.into());
    }

    let lowest = series.iter().copied().fold(f64::INFINITY, f64::min);
    if lowest < min {
        return Err(out_of_range("minimum", lowest, min, max));
    }
    let highest = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if highest > max {
        return Err(out_of_range("maximum", highest, min, max));
    }
    Ok(series)
}

fn out_of_range(bound: &'static str, value: f64, min: f64, max: f64) -> crate::error::FlowMcError {
    ValidationError::OutOfRange {
        bound,
        value,
        min,
        max,
    }
    .into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::FlowMcError;

    #[test]
    fn nan_is_rejected() {
        let err = validate(vec![1.0, 2.0, f64::NAN], 0.0, 10.0, 3).unwrap_err();
        assert!(matches!(
            err,
            FlowMcError::Validation(ValidationError::NonFinite { index: 2 })
        ));
    }

    #[test]
    fn length_is_checked_first() {
        let err = validate(vec![f64::NAN], 0.0, 10.0, 3).unwrap_err();
        assert!(matches!(
            err,
            FlowMcError::Validation(ValidationError::LengthMismatch {
                expected: 3,
                actual: 1
            })
        ));
    }

    #[test]
    fn bounds_are_inclusive() {
        let s = validate(vec![0.0, 10.0, 5.0], 0.0, 10.0, 3).unwrap();
        assert_eq!(s, vec![0.0, 10.0, 5.0]);
    }

    #[test]
    fn minimum_before_maximum() {
        let err = validate(vec![-1.0, 11.0], 0.0, 10.0, 2).unwrap_err();
        assert!(matches!(
            err,
            FlowMcError::Validation(ValidationError::OutOfRange { bound: "minimum", .. })
        ));
        let err = validate(vec![1.0, 11.0], 0.0, 10.0, 2).unwrap_err();
        assert!(matches!(
            err,
            FlowMcError::Validation(ValidationError::OutOfRange { bound: "maximum", .. })
        ));
    }

    #[test]
    fn infinity_is_non_finite() {
        assert!(validate(vec![f64::INFINITY], f64::NEG_INFINITY, f64::INFINITY, 1).is_err());
    }
}
