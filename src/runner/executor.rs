//! Script execution with a wall-clock timeout.
//!
//! Each call spawns exactly one interpreter process, placed in its own
//! process group on Unix. stdout and stderr are drained on helper threads
//! so a chatty script cannot fill a pipe and stall; the calling thread
//! polls for exit until the deadline, then kills the whole group and reaps
//! the child. Failures to launch are folded into a failed
//! [`ExecutionResult`] rather than returned as errors.

use crate::model::ExecutionResult;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Minimum time the pipes get to drain after the script exits.
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// Permission bits applied before launch.
#[cfg(unix)]
const SCRIPT_MODE: u32 = 0o755;

/// Runs scripts under a shell interpreter.
///
/// Script paths are used as given; lookup against the harness root happens
/// in [`crate::runner::resolve`].
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    shell: String,
}

enum Waited {
    Exited(ExitStatus, Instant),
    TimedOut,
}

impl ScriptExecutor {
    #[must_use]
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Run `script_path` and capture its outcome.
    ///
    /// Never fails: timeouts and launch errors become results with
    /// `returncode == -1`.
    #[must_use]
    pub fn execute(&self, script_path: &Path, timeout_secs: f64) -> ExecutionResult {
        debug!(script = %script_path.display(), shell = %self.shell, timeout_secs, "Executing script");

        match self.run(script_path, timeout_secs) {
            Ok(result) => {
                debug!(
                    script = %script_path.display(),
                    returncode = result.returncode,
                    execution_time = result.execution_time,
                    "Script finished"
                );
                result
            }
            Err(err) => {
                warn!(script = %script_path.display(), error = %err, "Failed to launch script");
                ExecutionResult::launch_failed(err)
            }
        }
    }

    fn run(&self, path: &Path, timeout_secs: f64) -> io::Result<ExecutionResult> {
        let timeout = Duration::try_from_secs_f64(timeout_secs)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        make_executable(path)?;

        let mut command = Command::new(&self.shell);
        command
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // New process group so a timeout reaches every descendant.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let start = Instant::now();
        let mut child = command.spawn()?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let (status, exited_at) = match wait_with_deadline(&mut child, start, timeout)? {
            Waited::Exited(status, exited_at) => (status, exited_at),
            Waited::TimedOut => {
                warn!(script = %path.display(), timeout_secs, "Script timed out");
                return Ok(ExecutionResult::timed_out(timeout_secs));
            }
        };
        let execution_time = exited_at.duration_since(start).as_secs_f64();

        // A background process left behind by the script can hold the pipes
        // open past the deadline.
        let drain_until = drain_deadline(start, timeout, exited_at);
        let collected = (collect(&stdout, drain_until), collect(&stderr, drain_until));
        kill_group(&child);
        let (Some(stdout), Some(stderr)) = collected else {
            warn!(script = %path.display(), timeout_secs, "Script output still open at deadline");
            return Ok(ExecutionResult::timed_out(timeout_secs));
        };

        Ok(ExecutionResult::completed(
            exit_code(status),
            stdout,
            stderr,
            execution_time,
        ))
    }
}

fn wait_with_deadline(child: &mut Child, start: Instant, timeout: Duration) -> io::Result<Waited> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Waited::Exited(status, Instant::now())),
            Ok(None) => {}
            Err(err) => {
                kill_and_reap(child);
                return Err(err);
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            kill_and_reap(child);
            return Ok(Waited::TimedOut);
        }
        thread::sleep(POLL_INTERVAL.min(timeout - elapsed));
    }
}

fn kill_and_reap(child: &mut Child) {
    kill_group(child);
    if let Err(err) = child.kill() {
        debug!(error = %err, "Kill after exit or failure");
    }
    if let Err(err) = child.wait() {
        warn!(error = %err, "Failed to reap child process");
    }
}

/// SIGKILL every process left in the child's group.
#[cfg(unix)]
fn kill_group(child: &Child) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(pgid) = i32::try_from(child.id()) else {
        return;
    };
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) => debug!(pgid, "Killed script process group"),
        Err(Errno::ESRCH) => {}
        Err(err) => warn!(pgid, error = %err, "Failed to kill script process group"),
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

fn drain<R>(pipe: Option<R>) -> Receiver<Vec<u8>>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    if let Some(mut pipe) = pipe {
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Err(err) = pipe.read_to_end(&mut buf) {
                debug!(error = %err, "Pipe read ended early");
            }
            let _ = tx.send(buf);
        });
    }
    rx
}

/// The later of the run deadline and a short grace after exit, so output
/// from a script that finished in time is never mistaken for a timeout.
fn drain_deadline(start: Instant, timeout: Duration, exited_at: Instant) -> Instant {
    (start + timeout).max(exited_at + DRAIN_GRACE)
}

/// Wait for a drained pipe until `until`; `None` if it is still open.
fn collect(rx: &Receiver<Vec<u8>>, until: Instant) -> Option<String> {
    match rx.recv_timeout(until.saturating_duration_since(Instant::now())) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

/// Exit code, or the negated signal number for a killed process.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    crate::model::FAILED_RETURNCODE
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(SCRIPT_MODE))
}

#[cfg(not(unix))]
fn make_executable(path: &Path) -> io::Result<()> {
    fs::metadata(path).map(|_| ())
}
