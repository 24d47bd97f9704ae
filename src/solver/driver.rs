use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_yaml::Value;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConvergenceFailure, FlowMcError, Result, SolverError};

use super::convergence::check_conv_reasons;
use super::process::{Invocation, ProcessRunner, ProcessStatus};
use super::template::{render_value, substitute_file};

/// Name of the solver run log inside the output directory.
pub const RUN_LOG: &str = "flow123.0.log";

/// Arguments placed between the executable and the output directory.
const BASE_ARGS: [&str; 1] = ["--no_profiler"];

/// The external solver command line prefix and its time limit.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverCommand {
    executable: Vec<String>,
    timeout: Option<Duration>,
}

impl SolverCommand {
    /// Creates a solver command from the executable and any leading
    /// arguments (e.g. an interpreter followed by a script).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `executable` is empty.
    pub fn new(executable: Vec<String>, timeout: Option<Duration>) -> Result<Self> {
        if executable.is_empty() {
            return Err(ConfigError::Invalid("flow executable is empty".into()).into());
        }
        Ok(Self {
            executable,
            timeout,
        })
    }

    #[must_use]
    pub fn executable(&self) -> &[String] {
        &self.executable
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Solver parameter sets keyed by phase name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverParams {
    phases: BTreeMap<String, BTreeMap<String, Value>>,
}

impl SolverParams {
    #[must_use]
    pub fn new(phases: BTreeMap<String, BTreeMap<String, Value>>) -> Self {
        Self { phases }
    }

    /// Parameters of `phase`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnknownPhase`] if no such phase is configured.
    pub fn phase(&self, phase: &str) -> Result<&BTreeMap<String, Value>> {
        self.phases
            .get(phase)
            .ok_or_else(|| SolverError::UnknownPhase(phase.to_owned()).into())
    }

    /// Base name of the input file of `phase`, taken from its `in_file`
    /// parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the phase is unknown or has no `in_file`.
    pub fn in_file(&self, phase: &str) -> Result<String> {
        match self.phase(phase)?.get("in_file") {
            Some(Value::String(name)) if !name.is_empty() => Ok(name.clone()),
            _ => Err(ConfigError::Invalid(format!("phase {phase} has no in_file")).into()),
        }
    }

    /// Relative output directory of `phase`.
    ///
    /// # Errors
    ///
    /// Returns an error if the phase is unknown or has no `in_file`.
    pub fn output_dir(&self, phase: &str) -> Result<PathBuf> {
        Ok(PathBuf::from(format!("output_{}", self.in_file(phase)?)))
    }
}

/// Record of one solver invocation (or skip).
#[derive(Debug, Clone, PartialEq)]
pub struct SolverRun {
    pub phase: String,
    pub template: PathBuf,
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub expected_outputs: Vec<PathBuf>,
    /// `None` when the run was skipped.
    pub status: Option<ProcessStatus>,
    pub skipped: bool,
    /// The first negative convergence reason found in the run log.
    pub convergence: Option<ConvergenceFailure>,
    time_limit: Option<Duration>,
}

impl SolverRun {
    /// `true` if the process exited with code zero (or was skipped) and the
    /// log reports no failed convergence.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        let exited = self.skipped || self.status.is_some_and(ProcessStatus::success);
        exited && self.convergence.is_none()
    }

    /// Converts an unsuccessful run into the matching error.
    ///
    /// A crashed or timed out solver is reported before a convergence
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::ExitStatus`], [`SolverError::Timeout`] or
    /// [`ConvergenceFailure`].
    pub fn ensure_success(self) -> Result<Self> {
        match self.status {
            Some(ProcessStatus::TimedOut) => {
                return Err(SolverError::Timeout {
                    phase: self.phase,
                    seconds: self.time_limit.map_or(0, |t| t.as_secs()),
                }
                .into());
            }
            Some(ProcessStatus::Exited(code)) if code != Some(0) => {
                return Err(SolverError::ExitStatus {
                    phase: self.phase,
                    code,
                }
                .into());
            }
            _ => {}
        }
        if let Some(failure) = self.convergence {
            return Err(failure.into());
        }
        Ok(self)
    }
}

/// Renders solver inputs and runs the solver in a sample directory.
#[derive(Debug)]
pub struct SolverDriver<R> {
    runner: R,
    command: SolverCommand,
    params: SolverParams,
    common_dir: PathBuf,
    work_dir: PathBuf,
    extra: BTreeMap<String, String>,
}

impl<R: ProcessRunner> SolverDriver<R> {
    /// Creates a driver running in `work_dir` with templates taken from
    /// `common_dir`.
    #[must_use]
    pub fn new(
        runner: R,
        command: SolverCommand,
        params: SolverParams,
        common_dir: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            command,
            params,
            common_dir: common_dir.into(),
            work_dir: work_dir.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Adds a substitution parameter shared by all phases. Phase parameters
    /// of the same name take precedence.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Runs the solver for `phase` unless every file of `expected_outputs`
    /// already exists in the phase's output directory.
    ///
    /// The run log is scanned for convergence failures in both cases. The
    /// returned record is not checked; see [`SolverRun::ensure_success`].
    ///
    /// # Errors
    ///
    /// Returns an error if the phase is unknown, the template is missing, the
    /// solver cannot be started, or a file operation fails.
    pub fn run(&self, phase: &str, expected_outputs: &[String]) -> Result<SolverRun> {
        let in_file = self.params.in_file(phase)?;
        let output_rel = self.params.output_dir(phase)?;
        let output_dir = self.work_dir.join(&output_rel);
        let template = self.common_dir.join(format!("{in_file}_tmpl.yaml"));
        let input = self.work_dir.join(format!("{in_file}.yaml"));
        let expected: Vec<PathBuf> = expected_outputs.iter().map(|f| output_dir.join(f)).collect();

        let skipped = expected.iter().all(|f| f.is_file());
        let status = if skipped {
            info!(phase, output_dir = %output_dir.display(), "results present, skipping solver");
            None
        } else {
            let params = self.substitution_params(phase, &in_file, &output_rel)?;
            let report = substitute_file(&template, &input, &params)?;
            debug!(phase, used = ?report.used, ignored = ?report.ignored, "input rendered");
            if !report.unused.is_empty() {
                warn!(phase, placeholders = ?report.unused, "placeholders left unsubstituted");
            }

            let invocation = self.invocation(&in_file, &output_rel);
            info!(phase, program = %invocation.program, args = ?invocation.args, "running solver");
            let status = self.runner.run(&invocation)?;
            info!(phase, ?status, "solver finished");
            Some(status)
        };

        let convergence = match check_conv_reasons(&output_dir.join(RUN_LOG)) {
            Ok(()) => None,
            Err(FlowMcError::Convergence(failure)) => {
                warn!(phase, code = failure.code, line = failure.line, "convergence failed");
                Some(failure)
            }
            Err(e) => return Err(e),
        };

        Ok(SolverRun {
            phase: phase.to_owned(),
            template,
            input,
            output_dir,
            expected_outputs: expected,
            status,
            skipped,
            convergence,
            time_limit: self.command.timeout,
        })
    }

    fn substitution_params(
        &self,
        phase: &str,
        in_file: &str,
        output_rel: &Path,
    ) -> Result<BTreeMap<String, String>> {
        let mut params: BTreeMap<String, String> = self
            .params
            .phase(phase)?
            .iter()
            .map(|(k, v)| (k.clone(), render_value(v)))
            .collect();
        // Derived values describe this run and replace any phase value.
        params.insert("in_file".into(), in_file.to_owned());
        params.insert("output_dir".into(), output_rel.display().to_string());
        params.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(params)
    }

    fn invocation(&self, in_file: &str, output_rel: &Path) -> Invocation {
        let (program, leading) = match self.command.executable.split_first() {
            Some((program, rest)) => (program.clone(), rest.to_vec()),
            None => (String::new(), Vec::new()),
        };
        let mut args = leading;
        args.extend(BASE_ARGS.iter().map(|a| (*a).to_owned()));
        args.push("--output_dir".into());
        args.push(output_rel.display().to_string());
        args.push(format!("{in_file}.yaml"));
        Invocation {
            program,
            args,
            work_dir: self.work_dir.clone(),
            stdout: PathBuf::from(format!("{in_file}_stdout")),
            stderr: PathBuf::from(format!("{in_file}_stderr")),
            timeout: self.command.timeout,
        }
    }
}
