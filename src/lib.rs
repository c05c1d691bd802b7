//! `scriptcheck`: a declarative test harness for shell scripts.
//!
//! Test cases are listed in `Testcase.json`. Each one names a script and
//! what it should do (exit status, a substring of stdout, or the contents
//! of an expected-output file). The harness runs every script under a
//! timeout, validates the outcome, and writes a timestamped run directory
//! with a summary log plus one detailed log per test.
//!
//! ```text
//! config::testcases  -> Vec<TestCase>
//! runner::Harness    -> ScriptExecutor -> ExecutionResult
//!                    -> validation::validate -> ValidationOutcome
//!                    -> session::RunLogger (logs/test_run_<ts>/)
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod runner;
pub mod session;
pub mod util;
pub mod validation;

pub use error::{ErrorCode, HarnessError, Result, StructuredError, TestFailure};
pub use model::{CaseReport, ExecutionResult, RunReport, TestCase, TestCaseEntry, TestStatus};
pub use runner::{Harness, ScriptExecutor};
pub use session::RunLogger;
