//! Run command implementation.
//!
//! Loads the descriptors, runs the selected cases through a [`Harness`],
//! and prints one verdict line per case followed by a summary. Any failed
//! case turns into [`HarnessError::TestsFailed`] so the process exits
//! non-zero.

use super::load_workspace;
use crate::cli::RunArgs;
use crate::config::CliOverrides;
use crate::error::{HarnessError, Result};
use crate::model::{CaseReport, ExecutionResult, RunReport, TestStatus};
use crate::runner::Harness;
use crate::util::first_line;
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct RunOutput<'a> {
    run_dir: Option<&'a Path>,
    total: usize,
    passed: usize,
    failed: usize,
    cases: Vec<CaseOutput<'a>>,
}

#[derive(Serialize)]
struct CaseOutput<'a> {
    id: &'a str,
    name: &'a str,
    script_path: Option<&'a Path>,
    status: TestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a ExecutionResult>,
    log_file: Option<&'a Path>,
}

impl<'a> From<&'a CaseReport> for CaseOutput<'a> {
    fn from(case: &'a CaseReport) -> Self {
        Self {
            id: &case.id,
            name: &case.name,
            script_path: case.script_path.as_deref(),
            status: case.status,
            failure_kind: case.failure.as_ref().map(|f| f.kind()),
            failure: case.failure.as_ref().map(ToString::to_string),
            result: case.result.as_ref(),
            log_file: case.log_file.as_deref(),
        }
    }
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if loading fails, the run logs cannot be written, or
/// any selected case failed.
pub fn execute(args: &RunArgs, json: bool, quiet: bool, cli: &CliOverrides) -> Result<()> {
    let cli = CliOverrides {
        default_timeout: args.default_timeout.or(cli.default_timeout),
        ..cli.clone()
    };
    let workspace = load_workspace(&cli)?;

    let mut harness = Harness::new(workspace.settings, workspace.cwd);
    let run_dir = harness.begin()?;
    if !json && !quiet {
        println!("Test logs will be saved to: {}", run_dir.display());
    }

    let report = harness.run(&workspace.loaded.cases, args.filter.as_deref())?;
    harness.finish()?;
    info!(
        total = report.total(),
        passed = report.passed(),
        failed = report.failed(),
        "Test run completed"
    );

    if json {
        print_json(&report)?;
    } else {
        print_text(&report, quiet);
    }

    if report.all_passed() {
        Ok(())
    } else {
        Err(HarnessError::TestsFailed {
            failed: report.failed(),
            total: report.total(),
        })
    }
}

fn print_text(report: &RunReport, quiet: bool) {
    if !quiet {
        for case in &report.cases {
            match &case.failure {
                None => println!("PASSED {}", case.id),
                Some(failure) => {
                    println!("FAILED {}: {}", case.id, first_line(&failure.to_string()));
                }
            }
        }
    }
    println!("{} passed, {} failed", report.passed(), report.failed());
}

fn print_json(report: &RunReport) -> Result<()> {
    let output = RunOutput {
        run_dir: report.run_dir.as_deref(),
        total: report.total(),
        passed: report.passed(),
        failed: report.failed(),
        cases: report.cases.iter().map(CaseOutput::from).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
