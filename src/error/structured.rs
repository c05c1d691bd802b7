//! Structured error output for scripted callers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Context for debugging

use crate::error::HarnessError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
/// Format: `SCREAMING_SNAKE_CASE` for easy parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Run outcome (exit code 1) ===
    /// One or more test cases failed
    TestsFailed,

    // === Config Errors (exit code 7) ===
    /// Testcase.json not found
    ConfigNotFound,
    /// Testcase.json is not a valid descriptor list
    ConfigMalformed,
    /// Harness setting has an unusable value
    InvalidSetting,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TestsFailed => "TESTS_FAILED",
            Self::ConfigNotFound => "CONFIG_NOT_FOUND",
            Self::ConfigMalformed => "CONFIG_MALFORMED",
            Self::InvalidSetting => "INVALID_SETTING",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
        }
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Test failures
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::TestsFailed => 1,
            Self::ConfigNotFound | Self::ConfigMalformed | Self::InvalidSetting => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `HarnessError`.
    #[must_use]
    pub fn from_error(err: &HarnessError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);

        Self {
            code,
            message: err.to_string(),
            hint: err.suggestion().map(str::to_string),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            // Red for error
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                // Yellow for hint
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &HarnessError) -> (ErrorCode, Option<Value>) {
        match err {
            HarnessError::TestsFailed { failed, total } => (
                ErrorCode::TestsFailed,
                Some(json!({"failed": failed, "total": total})),
            ),
            HarnessError::ConfigNotFound { path } => (
                ErrorCode::ConfigNotFound,
                Some(json!({"path": path.display().to_string()})),
            ),
            HarnessError::ConfigMalformed { path, reason } => (
                ErrorCode::ConfigMalformed,
                Some(json!({"path": path.display().to_string(), "reason": reason})),
            ),
            HarnessError::Settings { key, reason } => (
                ErrorCode::InvalidSetting,
                Some(json!({"key": key, "reason": reason})),
            ),
            HarnessError::Io(_) => (ErrorCode::IoError, None),
            HarnessError::Json(_) => (ErrorCode::JsonError, None),
            HarnessError::Yaml(_) => (ErrorCode::YamlError, None),
        }
    }
}
