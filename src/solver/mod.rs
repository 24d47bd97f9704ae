//! External solver invocation.

mod convergence;
mod driver;
mod process;
mod template;

pub use convergence::{check_conv_reasons, convergence_reason, scan_log};
pub use driver::{SolverCommand, SolverDriver, SolverParams, SolverRun, RUN_LOG};
pub use process::{Invocation, ProcessRunner, ProcessStatus, SystemRunner};
pub use template::{render_value, substitute, substitute_file, SubstitutionReport};
