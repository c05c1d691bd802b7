//! Run logging: one timestamped directory per harness invocation.
//!
//! Layout:
//!
//! ```text
//! logs/
//!   test_run_20250115_093000/
//!     result.log        running summary, appended per test
//!     Test_foo.log      one detailed file per executed test
//! ```
//!
//! Everything here is additive. `result.log` is only ever appended to and
//! per-test files are created new, so a colliding name gets a numeric
//! suffix instead of replacing an earlier file.

use crate::error::{Result, TestFailure};
use crate::model::{ExecutionResult, TestStatus};
use crate::util::time::{log_timestamp, now_log_timestamp, run_dir_stamp};
use crate::util::{first_line, sanitize_name, truncate_chars};
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Summary log file name inside a run directory.
pub const SUMMARY_LOG: &str = "result.log";

/// Prefix of run directory names.
pub const RUN_DIR_PREFIX: &str = "test_run_";

/// Characters of stderr quoted in the summary log.
const STDERR_PREVIEW_CHARS: usize = 100;

const RULE_WIDTH: usize = 50;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Everything the logger needs to know about one executed test.
#[derive(Debug, Clone, Copy)]
pub struct TestRecord<'a> {
    pub name: &'a str,
    pub script_path: &'a Path,
    pub result: &'a ExecutionResult,
    pub expected_success: bool,
    pub validation_error: Option<&'a str>,
}

impl TestRecord<'_> {
    #[must_use]
    pub const fn success_matched(&self) -> bool {
        self.result.success == self.expected_success
    }

    /// `PASSED` only if both the exit status and the output checks passed.
    #[must_use]
    pub const fn status(&self) -> TestStatus {
        TestStatus::from_passed(self.success_matched() && self.validation_error.is_none())
    }

    fn detail_log(&self, timestamp: &str) -> String {
        let result = self.result;
        let stdout = if result.stdout.is_empty() {
            "(no output)"
        } else {
            result.stdout.as_str()
        };
        let stderr = if result.stderr.is_empty() {
            "(no errors)"
        } else {
            result.stderr.as_str()
        };

        let mut content = format!(
            "Test: {name}\n\
             Script: {script}\n\
             Timestamp: {timestamp}\n\
             Status: {status}\n\
             Expected Success: {expected}\n\
             Actual Success: {actual}\n\
             Return Code: {code}\n\
             Execution Time: {time:.2} seconds\n\
             \n\
             STDOUT:\n{stdout}\n\
             \n\
             STDERR:\n{stderr}\n\
             \n",
            name = self.name,
            script = self.script_path.display(),
            status = self.status(),
            expected = self.expected_success,
            actual = result.success,
            code = result.returncode,
            time = result.execution_time,
        );

        if let Some(error) = self.validation_error {
            content.push_str(&format!("\nVALIDATION ERROR:\n{error}\n\n"));
        }

        content.push_str(&rule());
        content.push('\n');
        content
    }

    fn summary_block(&self, timestamp: &str) -> String {
        let result = self.result;
        let mut block = format!(
            "[{timestamp}] {status}: {name}\n  Script: {script}\n  Execution Time: {time:.2}s\n  Return Code: {code}\n",
            status = self.status(),
            name = self.name,
            script = self.script_path.display(),
            time = result.execution_time,
            code = result.returncode,
        );

        if !self.success_matched() {
            block.push_str(&format!(
                "  Script Status: Expected {} but got {}\n",
                outcome_word(self.expected_success),
                outcome_word(result.success)
            ));
        }

        if let Some(error) = self.validation_error {
            block.push_str(&format!("  Validation Error: {}...\n", first_line(error)));
        }

        if !result.stderr.is_empty() {
            block.push_str(&format!(
                "  Error: {}...\n",
                truncate_chars(&result.stderr, STDERR_PREVIEW_CHARS)
            ));
        }

        block.push('\n');
        block
    }
}

const fn outcome_word(success: bool) -> &'static str {
    if success { "success" } else { "failure" }
}

#[derive(Debug)]
struct ActiveRun {
    dir: PathBuf,
    summary: File,
    passed: usize,
    failed: usize,
}

impl ActiveRun {
    fn create(logs_root: &Path) -> io::Result<Self> {
        let started = Local::now();
        let dir = logs_root.join(format!("{RUN_DIR_PREFIX}{}", run_dir_stamp(&started)));
        fs::create_dir_all(&dir)?;

        let mut summary = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(SUMMARY_LOG))?;
        write!(
            summary,
            "Test Run Started: {}\n{}\n\n",
            log_timestamp(&started),
            rule()
        )?;

        info!(run_dir = %dir.display(), "Started test run");
        Ok(Self {
            dir,
            summary,
            passed: 0,
            failed: 0,
        })
    }

    fn append(&mut self, text: &str) -> io::Result<()> {
        self.summary.write_all(text.as_bytes())?;
        self.summary.flush()
    }

    fn count(&mut self, status: TestStatus) {
        match status {
            TestStatus::Passed => self.passed += 1,
            TestStatus::Failed => self.failed += 1,
        }
    }
}

/// Per-invocation logging session.
///
/// The run directory is created lazily by the first call that needs it.
/// Dropping an active logger finalises `result.log`, so the closing entry
/// is written even when the caller unwinds.
#[derive(Debug)]
pub struct RunLogger {
    logs_root: PathBuf,
    active: Option<ActiveRun>,
}

impl RunLogger {
    #[must_use]
    pub fn new(logs_root: impl Into<PathBuf>) -> Self {
        Self {
            logs_root: logs_root.into(),
            active: None,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Directory of the active run, if one was started.
    #[must_use]
    pub fn run_dir(&self) -> Option<&Path> {
        self.active.as_ref().map(|run| run.dir.as_path())
    }

    /// Start the run; a second call while active returns the same directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the run directory or `result.log` cannot be created.
    pub fn begin_run(&mut self) -> Result<&Path> {
        let run = self.active_run()?;
        Ok(run.dir.as_path())
    }

    fn active_run(&mut self) -> Result<&mut ActiveRun> {
        let run = match self.active.take() {
            Some(run) => run,
            None => ActiveRun::create(&self.logs_root)?,
        };
        Ok(self.active.insert(run))
    }

    /// Write the per-test log file and append to `result.log`.
    ///
    /// Returns the path of the per-test file.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be written.
    pub fn record(&mut self, record: &TestRecord<'_>) -> Result<PathBuf> {
        let run = self.active_run()?;
        let timestamp = now_log_timestamp();

        let (path, mut file) = create_unique_log(&run.dir, record.name)?;
        file.write_all(record.detail_log(&timestamp).as_bytes())?;

        run.append(&record.summary_block(&timestamp))?;
        let status = record.status();
        run.count(status);

        debug!(name = record.name, %status, path = %path.display(), "Recorded test result");
        Ok(path)
    }

    /// Append a summary entry for a case that failed before execution.
    ///
    /// No per-test file is written since nothing ran.
    ///
    /// # Errors
    ///
    /// Returns an error if `result.log` cannot be written.
    pub fn record_setup_failure(
        &mut self,
        name: &str,
        script: Option<&str>,
        failure: &TestFailure,
    ) -> Result<()> {
        let run = self.active_run()?;
        let message = failure.to_string();
        let block = format!(
            "[{}] {}: {name}\n  Script: {}\n  Setup Error: {}\n\n",
            now_log_timestamp(),
            TestStatus::Failed,
            script.unwrap_or("(none)"),
            first_line(&message)
        );
        run.append(&block)?;
        run.count(TestStatus::Failed);
        Ok(())
    }

    /// Append the closing entry and end the run. No-op when inactive.
    ///
    /// # Errors
    ///
    /// Returns an error if `result.log` cannot be written.
    pub fn end_run(&mut self) -> Result<()> {
        let Some(mut run) = self.active.take() else {
            return Ok(());
        };

        let total = run.passed + run.failed;
        let closing = format!(
            "{}\nTest Run Completed: {}\nTotal: {total}, Passed: {}, Failed: {}\n",
            rule(),
            now_log_timestamp(),
            run.passed,
            run.failed
        );
        run.append(&closing)?;
        info!(
            run_dir = %run.dir.display(),
            total,
            passed = run.passed,
            failed = run.failed,
            "Completed test run"
        );
        Ok(())
    }
}

impl Drop for RunLogger {
    fn drop(&mut self) {
        if let Err(err) = self.end_run() {
            warn!(error = %err, "Failed to finalize result.log");
        }
    }
}

/// Create `<dir>/<sanitized>.log`, or `<sanitized>_2.log`, ... if taken.
fn create_unique_log(dir: &Path, name: &str) -> io::Result<(PathBuf, File)> {
    let mut stem = sanitize_name(name);
    if stem.is_empty() {
        stem = "unnamed".to_string();
    }

    let mut attempt = 1usize;
    loop {
        let file_name = if attempt == 1 {
            format!("{stem}.log")
        } else {
            format!("{stem}_{attempt}.log")
        };
        let path = dir.join(file_name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(err) => return Err(err),
        }
    }
}
