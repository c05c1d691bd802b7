//! Harness driver: runs every selected case in declaration order.
//!
//! Per case: check the descriptor, resolve the script, execute it,
//! validate the result, record it in the run logs, and hand a
//! [`CaseReport`] back. A case failure never aborts the run; only log I/O
//! errors do.

pub mod executor;
pub mod resolve;

pub use executor::ScriptExecutor;
pub use resolve::{resolve_script, script_candidates};

use crate::config::HarnessSettings;
use crate::error::{Result, TestFailure};
use crate::model::{CaseReport, RunReport, TestCase, TestStatus};
use crate::session::{RunLogger, TestRecord};
use crate::validation::validate;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A case selected for this run, with its stable id.
#[derive(Debug, Clone, Copy)]
pub struct SelectedCase<'a> {
    pub id: &'a str,
    pub case: &'a TestCase,
}

/// Assign ids and apply an optional id substring filter.
#[must_use]
pub fn select_cases<'a>(ids: &'a [String], cases: &'a [TestCase], filter: Option<&str>) -> Vec<SelectedCase<'a>> {
    ids.iter()
        .zip(cases)
        .filter(|(id, _)| filter.is_none_or(|f| id.contains(f)))
        .map(|(id, case)| SelectedCase { id, case })
        .collect()
}

/// Ids for each case, in declaration order.
#[must_use]
pub fn case_ids(cases: &[TestCase]) -> Vec<String> {
    cases
        .iter()
        .enumerate()
        .map(|(index, case)| case.test_id(index))
        .collect()
}

/// Owns the executor and the run logger for one invocation.
#[derive(Debug)]
pub struct Harness {
    settings: HarnessSettings,
    cwd: PathBuf,
    executor: ScriptExecutor,
    logger: RunLogger,
}

impl Harness {
    #[must_use]
    pub fn new(settings: HarnessSettings, cwd: impl Into<PathBuf>) -> Self {
        let executor = ScriptExecutor::new(settings.shell.clone());
        let logger = RunLogger::new(settings.logs_dir.clone());
        Self {
            settings,
            cwd: cwd.into(),
            executor,
            logger,
        }
    }

    /// Start the run log; safe to call more than once.
    ///
    /// # Errors
    ///
    /// Returns an error if the run directory cannot be created.
    pub fn begin(&mut self) -> Result<PathBuf> {
        self.logger.begin_run().map(Path::to_path_buf)
    }

    /// Run the selected cases in order.
    ///
    /// # Errors
    ///
    /// Returns an error only if the run logs cannot be written.
    pub fn run(&mut self, cases: &[TestCase], filter: Option<&str>) -> Result<RunReport> {
        let run_dir = self.begin()?;
        let ids = case_ids(cases);
        let selected = select_cases(&ids, cases, filter);
        info!(
            total = cases.len(),
            selected = selected.len(),
            "Running test cases"
        );

        let mut report = RunReport {
            run_dir: Some(run_dir),
            cases: Vec::with_capacity(selected.len()),
        };
        for selected_case in selected {
            let case_report = self.run_case(selected_case.id, selected_case.case)?;
            report.cases.push(case_report);
        }
        Ok(report)
    }

    /// Run a single case.
    ///
    /// # Errors
    ///
    /// Returns an error only if the run logs cannot be written.
    pub fn run_case(&mut self, id: &str, case: &TestCase) -> Result<CaseReport> {
        let name = case.display_name();

        let (script_path, timeout) = match self.prepare(&name, case) {
            Ok(prepared) => prepared,
            Err(failure) => return self.setup_failure(id, name, case, failure),
        };

        let result = self.executor.execute(&script_path, timeout);
        let outcome = validate(case, &result, &self.settings.root);
        let validation_error = outcome.validation_error();

        let log_file = self.logger.record(&TestRecord {
            name: &name,
            script_path: &script_path,
            result: &result,
            expected_success: case.expected_success(),
            validation_error: validation_error.as_deref(),
        })?;

        let failure = outcome.into_failure();
        let status = TestStatus::from_passed(failure.is_none());
        match &failure {
            None => debug!(id, "Test case passed"),
            Some(failure) => warn!(id, kind = failure.kind(), "Test case failed"),
        }

        Ok(CaseReport {
            id: id.to_string(),
            name,
            script_path: Some(script_path),
            status,
            failure,
            result: Some(result),
            log_file: Some(log_file),
        })
    }

    /// Finalise the run log.
    ///
    /// # Errors
    ///
    /// Returns an error if `result.log` cannot be written.
    pub fn finish(mut self) -> Result<()> {
        self.logger.end_run()
    }

    fn prepare(&self, name: &str, case: &TestCase) -> std::result::Result<(PathBuf, f64), TestFailure> {
        let Some(script) = case.script_path.as_deref() else {
            return Err(TestFailure::MissingScriptPath {
                name: name.to_string(),
            });
        };

        let script_path =
            resolve_script(script, &self.settings.root, &self.cwd).map_err(|checked| {
                TestFailure::ScriptNotFound {
                    name: name.to_string(),
                    script: script.to_string(),
                    checked,
                }
            })?;

        let timeout = case.timeout_secs(self.settings.default_timeout);
        if !timeout.is_finite() || timeout < 0.0 {
            return Err(TestFailure::InvalidTimeout {
                name: name.to_string(),
                value: timeout,
            });
        }

        Ok((script_path, timeout))
    }

    fn setup_failure(
        &mut self,
        id: &str,
        name: String,
        case: &TestCase,
        failure: TestFailure,
    ) -> Result<CaseReport> {
        warn!(id, kind = failure.kind(), error = %failure, "Test case could not be started");
        self.logger
            .record_setup_failure(&name, case.script_path.as_deref(), &failure)?;

        Ok(CaseReport {
            id: id.to_string(),
            name,
            script_path: case.script_path.as_ref().map(PathBuf::from),
            status: TestStatus::Failed,
            failure: Some(failure),
            result: None,
            log_file: None,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        root: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().expect("temp dir");
            let root = temp.path().to_path_buf();
            Self { _temp: temp, root }
        }

        fn script(&self, name: &str, body: &str) {
            fs::write(self.root.join(name), body).unwrap();
        }

        fn harness(&self) -> Harness {
            let mut settings = HarnessSettings::with_root(&self.root);
            settings.shell = "sh".to_string();
            Harness::new(settings, &self.root)
        }
    }

    fn case(script: &str) -> TestCase {
        TestCase::from_script_path(script)
    }

    #[test]
    fn test_passing_and_failing_cases() {
        let fx = Fixture::new();
        fx.script("ok.sh", "echo fine\n");
        fx.script("bad.sh", "exit 1\n");

        let mut harness = fx.harness();
        let report = harness.run(&[case("ok.sh"), case("bad.sh")], None).unwrap();
        assert_eq!(report.total(), 2);
        assert_eq!(report.passed(), 1);
        assert!(report.cases[0].passed());
        assert!(matches!(
            report.cases[1].failure,
            Some(TestFailure::SuccessMismatch { .. })
        ));
        assert!(report.cases.iter().all(|c| c.log_file.is_some()));
    }

    #[test]
    fn test_expected_failure_passes() {
        let fx = Fixture::new();
        fx.script("bad.sh", "exit 4\n");
        let mut failing = case("bad.sh");
        failing.expected_success = Some(false);

        let report = fx.harness().run(&[failing], None).unwrap();
        assert!(report.all_passed());
    }

    #[test]
    fn test_missing_script_fails_only_that_case() {
        let fx = Fixture::new();
        fx.script("ok.sh", "true\n");

        let mut harness = fx.harness();
        let report = harness.run(&[case("ghost.sh"), case("ok.sh")], None).unwrap();
        assert!(matches!(
            report.cases[0].failure,
            Some(TestFailure::ScriptNotFound { .. })
        ));
        assert!(report.cases[0].result.is_none());
        assert!(report.cases[1].passed());
    }

    #[test]
    fn test_missing_script_path_and_bad_timeout() {
        let fx = Fixture::new();
        fx.script("ok.sh", "true\n");
        let no_path = TestCase {
            name: Some("no path".to_string()),
            ..TestCase::default()
        };
        let mut bad_timeout = case("ok.sh");
        bad_timeout.timeout = Some(-5.0);

        let report = fx.harness().run(&[no_path, bad_timeout], None).unwrap();
        assert!(matches!(
            report.cases[0].failure,
            Some(TestFailure::MissingScriptPath { .. })
        ));
        assert!(matches!(
            report.cases[1].failure,
            Some(TestFailure::InvalidTimeout { .. })
        ));
    }

    #[test]
    fn test_timeout_does_not_stop_the_run() {
        let fx = Fixture::new();
        fx.script("slow.sh", "sleep 5\n");
        fx.script("ok.sh", "true\n");
        let mut slow = case("slow.sh");
        slow.timeout = Some(0.2);

        let report = fx.harness().run(&[slow, case("ok.sh")], None).unwrap();
        let slow_result = report.cases[0].result.as_ref().unwrap();
        assert_eq!(slow_result.returncode, -1);
        assert!(!report.cases[0].passed());
        assert!(report.cases[1].passed());
    }

    #[test]
    fn test_filter_selects_by_id() {
        let fx = Fixture::new();
        fx.script("alpha.sh", "true\n");
        fx.script("beta.sh", "true\n");

        let report = fx
            .harness()
            .run(&[case("alpha.sh"), case("beta.sh")], Some("beta"))
            .unwrap();
        assert_eq!(report.total(), 1);
        assert_eq!(report.cases[0].id, "Test beta");
    }

    #[test]
    fn test_case_ids_fall_back_to_index() {
        let named = case("a.sh");
        let unnamed = TestCase {
            script_path: Some("b.sh".to_string()),
            ..TestCase::default()
        };
        assert_eq!(case_ids(&[named, unnamed]), vec!["Test a", "test_1"]);
    }

    #[test]
    fn test_one_log_file_per_executed_case() {
        let fx = Fixture::new();
        fx.script("a.sh", "echo a\n");
        fx.script("b.sh", "echo b\n");
        fx.script("c.sh", "exit 2\n");

        let mut harness = fx.harness();
        let report = harness
            .run(&[case("a.sh"), case("b.sh"), case("c.sh")], None)
            .unwrap();
        let run_dir = report.run_dir.clone().unwrap();
        harness.finish().unwrap();

        let logs: Vec<_> = fs::read_dir(&run_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name != "result.log")
            .collect();
        assert_eq!(logs.len(), 3);

        let summary = fs::read_to_string(run_dir.join("result.log")).unwrap();
        assert_eq!(summary.matches("] PASSED: ").count(), 2);
        assert_eq!(summary.matches("] FAILED: ").count(), 1);
        assert!(summary.ends_with("Total: 3, Passed: 2, Failed: 1\n"));
    }
}
