//! Scan of the solver log for linear-solver convergence reasons.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ConvergenceFailure, FlowMcError, Result};

/// Convergence reason reported on one log line, if any.
///
/// The line must contain the token `convergence` followed by `reason` and an
/// integer, optionally terminated by a comma. Lines where the reason cannot
/// be read are treated as carrying none.
#[must_use]
pub fn convergence_reason(line: &str) -> Option<i64> {
    let tokens: Vec<&str> = line.split(' ').collect();
    let at = tokens.iter().position(|t| *t == "convergence")?;
    if tokens.get(at + 1) != Some(&"reason") {
        return None;
    }
    tokens
        .get(at + 2)?
        .trim_end_matches(',')
        .parse()
        .ok()
}

/// Fails on the first negative convergence reason in `text`.
///
/// # Errors
///
/// Returns a [`ConvergenceFailure`] carrying the 1-based line number and the
/// reported code.
pub fn scan_log(log: &Path, text: &str) -> std::result::Result<(), ConvergenceFailure> {
    for (idx, line) in text.lines().enumerate() {
        if let Some(code) = convergence_reason(line) {
            if code < 0 {
                return Err(ConvergenceFailure {
                    log: log.to_path_buf(),
                    line: idx + 1,
                    code,
                });
            }
        }
    }
    Ok(())
}

/// Checks the solver log at `log` for a negative convergence reason.
///
/// A missing log counts as success; a warning is emitted.
///
/// # Errors
///
/// Returns [`FlowMcError::Convergence`] if a negative reason is found, or an
/// I/O error if the log exists but cannot be read.
pub fn check_conv_reasons(log: &Path) -> Result<()> {
    if !log.is_file() {
        warn!(log = %log.display(), "solver log not found, convergence not checked");
        return Ok(());
    }
    let bytes = fs::read(log).map_err(|e| FlowMcError::io(log, e))?;
    let text = String::from_utf8_lossy(&bytes);
    scan_log(log, &text)?;
    debug!(log = %log.display(), "no negative convergence reason");
    Ok(())
}
