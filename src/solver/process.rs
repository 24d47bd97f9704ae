//! Launching of external solver processes.

use std::fs::File;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{FlowMcError, Result, SolverError};

/// Interval between two polls of a running process.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A fully resolved external command.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub work_dir: PathBuf,
    /// File receiving the standard output, relative to `work_dir` if relative.
    pub stdout: PathBuf,
    /// File receiving the standard error, relative to `work_dir` if relative.
    pub stderr: PathBuf,
    pub timeout: Option<Duration>,
}

/// How an invoked process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// The process exited; `None` if it was terminated by a signal.
    Exited(Option<i32>),
    /// The process was killed after exceeding its time limit.
    TimedOut,
}

impl ProcessStatus {
    #[must_use]
    pub fn success(self) -> bool {
        self == Self::Exited(Some(0))
    }
}

/// Runs external commands to completion.
pub trait ProcessRunner {
    /// Runs `invocation` and waits for it to end.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started or its output files
    /// cannot be created. A non-zero exit is not an error at this level.
    fn run(&self, invocation: &Invocation) -> Result<ProcessStatus>;
}

/// [`ProcessRunner`] spawning operating-system processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessStatus> {
        let stdout_path = invocation.work_dir.join(&invocation.stdout);
        let stderr_path = invocation.work_dir.join(&invocation.stderr);
        let stdout = File::create(&stdout_path).map_err(|e| FlowMcError::io(&stdout_path, e))?;
        let stderr = File::create(&stderr_path).map_err(|e| FlowMcError::io(&stderr_path, e))?;

        debug!(program = %invocation.program, args = ?invocation.args, "spawning");
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|source| SolverError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let started = Instant::now();
        loop {
            let polled = child
                .try_wait()
                .map_err(|e| FlowMcError::io(&invocation.work_dir, e))?;
            if let Some(status) = polled {
                return Ok(ProcessStatus::Exited(status.code()));
            }
            if invocation.timeout.is_some_and(|limit| started.elapsed() >= limit) {
                warn!(program = %invocation.program, "time limit exceeded, killing");
                // The process may have exited between the poll and the kill.
                let _ = child.kill();
                let _ = child.wait();
                return Ok(ProcessStatus::TimedOut);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    fn invocation(dir: &std::path::Path, program: &str, args: &[&str]) -> Invocation {
        Invocation {
            program: program.to_owned(),
            args: args.iter().map(|a| (*a).to_owned()).collect(),
            work_dir: dir.to_path_buf(),
            stdout: PathBuf::from("out"),
            stderr: PathBuf::from("err"),
            timeout: None,
        }
    }

    #[test]
    fn output_is_redirected_to_files() {
        let dir = tempfile::tempdir().unwrap();
        let inv = invocation(dir.path(), "sh", &["-c", "echo hello; echo oops 1>&2"]);
        let status = SystemRunner.run(&inv).unwrap();
        assert!(status.success());
        assert_eq!(fs::read_to_string(dir.path().join("out")).unwrap(), "hello\n");
        assert_eq!(fs::read_to_string(dir.path().join("err")).unwrap(), "oops\n");
    }

    #[test]
    fn exit_code_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let status = SystemRunner
            .run(&invocation(dir.path(), "sh", &["-c", "exit 3"]))
            .unwrap();
        assert_eq!(status, ProcessStatus::Exited(Some(3)));
    }

    #[test]
    fn slow_process_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut inv = invocation(dir.path(), "sleep", &["5"]);
        inv.timeout = Some(Duration::from_millis(100));
        assert_eq!(SystemRunner.run(&inv).unwrap(), ProcessStatus::TimedOut);
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let err = SystemRunner
            .run(&invocation(dir.path(), "flowmc-no-such-program", &[]))
            .unwrap_err();
        assert!(matches!(err, FlowMcError::Solver(SolverError::Spawn { .. })));
    }
}
