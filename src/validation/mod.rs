//! Result validation for `scriptcheck`.
//!
//! Compares an [`ExecutionResult`] with what its [`TestCase`] expects.
//! Every check runs, but they are ranked: a success mismatch is always the
//! surfaced failure, and output checks only surface once the exit status
//! matched.

use crate::config::resolve_against;
use crate::error::TestFailure;
use crate::model::{ExecutionResult, TestCase};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Everything validation found for one execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutcome {
    /// Set when `result.success != case.expected_success()`.
    pub success_mismatch: Option<TestFailure>,
    /// Output-level failures in check order.
    pub validation_errors: Vec<TestFailure>,
}

impl ValidationOutcome {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.success_mismatch.is_none() && self.validation_errors.is_empty()
    }

    #[must_use]
    pub const fn success_matched(&self) -> bool {
        self.success_mismatch.is_none()
    }

    /// Validation error text for the logs, one failure per line block.
    #[must_use]
    pub fn validation_error(&self) -> Option<String> {
        if self.validation_errors.is_empty() {
            return None;
        }
        Some(
            self.validation_errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    /// The failure reported to the caller.
    #[must_use]
    pub fn into_failure(self) -> Option<TestFailure> {
        self.success_mismatch
            .or_else(|| self.validation_errors.into_iter().next())
    }
}

/// Validate `result` against `case`.
///
/// `root` is the directory a relative `expected_result_file` is resolved
/// against.
#[must_use]
pub fn validate(case: &TestCase, result: &ExecutionResult, root: &Path) -> ValidationOutcome {
    let mut outcome = ValidationOutcome::default();

    let expected_success = case.expected_success();
    if result.success != expected_success {
        outcome.success_mismatch = Some(TestFailure::success_mismatch(
            case.display_name(),
            expected_success,
        ));
    }

    if let Some(expected) = case.expected_output() {
        if let Some(failure) = check_substring(expected, &result.stdout) {
            outcome.validation_errors.push(failure);
        }
    }

    if let Some(file) = case.expected_result_file() {
        if let Some(failure) = check_result_file(file, &result.stdout, root) {
            outcome.validation_errors.push(failure);
        }
    }

    debug!(
        name = %case.display_name(),
        success_matched = outcome.success_matched(),
        validation_errors = outcome.validation_errors.len(),
        "Validated result"
    );
    outcome
}

fn check_substring(expected: &str, stdout: &str) -> Option<TestFailure> {
    if stdout.contains(expected) {
        None
    } else {
        Some(TestFailure::OutputMismatch {
            expected: expected.to_string(),
        })
    }
}

/// Compare trimmed file contents with trimmed stdout.
fn check_result_file(configured: &str, stdout: &str, root: &Path) -> Option<TestFailure> {
    let path = resolve_against(root, Path::new(configured));

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Some(TestFailure::ExpectedFileMissing { path });
        }
        Err(err) => {
            return Some(TestFailure::ExpectedFileUnreadable {
                path,
                reason: err.to_string(),
            });
        }
    };

    let expected = String::from_utf8_lossy(&bytes);
    let expected = expected.trim();
    let actual = stdout.trim();
    if expected == actual {
        None
    } else {
        Some(TestFailure::FileContentMismatch {
            source_file: configured.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}
