//! Error types and handling for `scriptcheck`.
//!
//! Two layers of errors exist:
//!
//! - [`HarnessError`] covers run-level failures. A missing or malformed
//!   `Testcase.json` aborts the whole run before any script executes.
//! - [`TestFailure`] covers a single test case. It is reported, logged and
//!   counted, but never stops the remaining cases.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Provides recovery hints and exit codes via [`StructuredError`]

mod structured;

pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `scriptcheck` operations.
#[derive(Error, Debug)]
pub enum HarnessError {
    // === Test case configuration ===
    /// The descriptor file does not exist at any searched location.
    #[error("Testcase.json file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// The descriptor file exists but is not a valid list of test cases.
    #[error("Testcase.json at {path} is not a valid test case list: {reason}")]
    ConfigMalformed { path: PathBuf, reason: String },

    // === Harness settings ===
    /// A harness setting (YAML, environment or CLI) has an unusable value.
    #[error("Invalid setting '{key}': {reason}")]
    Settings { key: String, reason: String },

    // === Run outcome ===
    /// At least one selected test case failed.
    #[error("{failed} of {total} test cases failed")]
    TestsFailed { failed: usize, total: usize },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl HarnessError {
    /// Create a settings error for a specific key.
    #[must_use]
    pub fn settings(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Settings {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound { .. } => {
                Some("Create Testcase.json in the working directory or pass --config <FILE>")
            }
            Self::ConfigMalformed { .. } => Some(
                "Testcase.json must be a JSON list of script paths or objects with a script_path",
            ),
            Self::TestsFailed { .. } => Some("See the run directory under logs/ for details"),
            _ => None,
        }
    }
}

/// Result type using `HarnessError`.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Why a single test case failed.
///
/// The first three variants are raised before the script runs; the rest
/// come out of result validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TestFailure {
    /// The descriptor has no `script_path`.
    #[error("No script path specified for test {name}")]
    MissingScriptPath { name: String },

    /// None of the candidate locations held the script.
    #[error("Script {script} not found for test {name}. Checked paths: {}", join_paths(.checked))]
    ScriptNotFound {
        name: String,
        script: String,
        checked: Vec<PathBuf>,
    },

    /// The timeout is negative, NaN or infinite.
    #[error("Invalid timeout {value} for test {name}: must be a finite number of seconds >= 0")]
    InvalidTimeout { name: String, value: f64 },

    /// The exit status disagreed with `expected_success`.
    #[error("Test {name} {actual} but was expected to {expected}.")]
    SuccessMismatch {
        name: String,
        actual: &'static str,
        expected: &'static str,
    },

    /// `expected_output` is not a substring of stdout.
    #[error("Expected output '{expected}' not found in script output")]
    OutputMismatch { expected: String },

    /// `expected_result_file` does not exist.
    #[error("Expected result file {path} not found")]
    ExpectedFileMissing { path: PathBuf },

    /// `expected_result_file` exists but could not be read.
    #[error("Expected result file {path} could not be read: {reason}")]
    ExpectedFileUnreadable { path: PathBuf, reason: String },

    /// Trimmed file contents differ from trimmed stdout.
    #[error(
        "Expected output from {source_file} does not match actual output.\nExpected:\n{expected}\nActual:\n{actual}"
    )]
    FileContentMismatch {
        source_file: String,
        expected: String,
        actual: String,
    },
}

impl TestFailure {
    /// Build a success mismatch from the expectation.
    #[must_use]
    pub fn success_mismatch(name: impl Into<String>, expected_success: bool) -> Self {
        let (actual, expected) = if expected_success {
            ("failed", "succeed")
        } else {
            ("succeeded", "fail")
        };
        Self::SuccessMismatch {
            name: name.into(),
            actual,
            expected,
        }
    }

    /// Stable machine-readable kind, used in JSON reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingScriptPath { .. } => "MISSING_SCRIPT_PATH",
            Self::ScriptNotFound { .. } => "SCRIPT_NOT_FOUND",
            Self::InvalidTimeout { .. } => "INVALID_TIMEOUT",
            Self::SuccessMismatch { .. } => "SUCCESS_MISMATCH",
            Self::OutputMismatch { .. } => "OUTPUT_MISMATCH",
            Self::ExpectedFileMissing { .. } => "EXPECTED_FILE_MISSING",
            Self::ExpectedFileUnreadable { .. } => "EXPECTED_FILE_UNREADABLE",
            Self::FileContentMismatch { .. } => "FILE_CONTENT_MISMATCH",
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
