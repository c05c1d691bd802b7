//! Core data types for `scriptcheck`.
//!
//! - `TestCase` - One descriptor from `Testcase.json`
//! - `TestCaseEntry` - Raw list entry (bare path or full object)
//! - `ExecutionResult` - What one script run produced
//! - `TestStatus` - Final verdict of a case
//! - `CaseReport` / `RunReport` - What the harness hands back to its caller

use crate::error::TestFailure;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default per-case timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Return code reported for timeouts and launch failures.
pub const FAILED_RETURNCODE: i32 = -1;

/// A test case descriptor.
///
/// Fields hold exactly what the configuration gave; defaults are applied by
/// the accessor methods when the case is consumed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_result_file: Option<String>,
}

impl TestCase {
    /// Expand a bare script path into a descriptor named after the file.
    #[must_use]
    pub fn from_script_path(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: Some(derived_name(&path)),
            script_path: Some(path),
            ..Self::default()
        }
    }

    /// Name used for reporting and log file naming.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.name, &self.script_path) {
            (Some(name), _) => name.clone(),
            (None, Some(path)) => derived_name(path),
            (None, None) => "Unnamed test".to_string(),
        }
    }

    /// Identifier of the case within a run: its name, or `test_<index>`.
    #[must_use]
    pub fn test_id(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("test_{index}"))
    }

    #[must_use]
    pub fn expected_success(&self) -> bool {
        self.expected_success.unwrap_or(true)
    }

    /// Timeout in seconds, falling back to `default_secs`.
    #[must_use]
    pub fn timeout_secs(&self, default_secs: f64) -> f64 {
        self.timeout.unwrap_or(default_secs)
    }

    /// Substring that must appear in stdout; empty strings disable the check.
    #[must_use]
    pub fn expected_output(&self) -> Option<&str> {
        self.expected_output.as_deref().filter(|s| !s.is_empty())
    }

    /// File whose trimmed contents must equal trimmed stdout.
    #[must_use]
    pub fn expected_result_file(&self) -> Option<&str> {
        self.expected_result_file
            .as_deref()
            .filter(|s| !s.is_empty())
    }
}

fn derived_name(script_path: &str) -> String {
    let stem = Path::new(script_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("Test {stem}")
}

/// One element of the `Testcase.json` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TestCaseEntry {
    /// `"scripts/foo.sh"`
    ScriptPathOnly(String),
    /// `{"script_path": "scripts/foo.sh", ...}`
    Full(TestCase),
}

impl From<TestCaseEntry> for TestCase {
    fn from(entry: TestCaseEntry) -> Self {
        match entry {
            TestCaseEntry::ScriptPathOnly(path) => Self::from_script_path(path),
            TestCaseEntry::Full(case) => case,
        }
    }
}

/// Outcome of a single script execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub returncode: i32,
    pub stdout: String,
    pub stderr: String,
    /// Wall-clock seconds.
    pub execution_time: f64,
    pub success: bool,
}

impl ExecutionResult {
    /// Result of a process that ran to completion.
    #[must_use]
    pub fn completed(returncode: i32, stdout: String, stderr: String, execution_time: f64) -> Self {
        Self {
            returncode,
            stdout,
            stderr,
            execution_time,
            success: returncode == 0,
        }
    }

    /// Result of a process killed at its deadline.
    #[must_use]
    pub fn timed_out(timeout_secs: f64) -> Self {
        Self {
            returncode: FAILED_RETURNCODE,
            stdout: String::new(),
            stderr: format!("Script execution timed out after {timeout_secs} seconds"),
            execution_time: timeout_secs,
            success: false,
        }
    }

    /// Result of a process that could not be started.
    #[must_use]
    pub fn launch_failed(error: impl fmt::Display) -> Self {
        Self {
            returncode: FAILED_RETURNCODE,
            stdout: String::new(),
            stderr: error.to_string(),
            execution_time: 0.0,
            success: false,
        }
    }
}

/// Final verdict of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    Passed,
    Failed,
}

impl TestStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
        }
    }

    #[must_use]
    pub const fn from_passed(passed: bool) -> Self {
        if passed { Self::Passed } else { Self::Failed }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the harness reports for one case.
#[derive(Debug, Clone)]
pub struct CaseReport {
    pub id: String,
    pub name: String,
    pub script_path: Option<PathBuf>,
    pub status: TestStatus,
    /// The failure surfaced to the caller, if any.
    pub failure: Option<TestFailure>,
    /// `None` when the case failed before execution.
    pub result: Option<ExecutionResult>,
    pub log_file: Option<PathBuf>,
}

impl CaseReport {
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.status, TestStatus::Passed)
    }
}

/// Aggregate outcome of one run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub run_dir: Option<PathBuf>,
    pub cases: Vec<CaseReport>,
}

impl RunReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.cases.len()
    }

    #[must_use]
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.cases.iter().all(CaseReport::passed)
    }
}
