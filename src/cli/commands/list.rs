//! List command implementation.
//!
//! Shows what `run` would execute: ids, scripts and the effective
//! expectations after defaults are applied. Nothing is executed and no run
//! directory is created.

use super::load_workspace;
use crate::cli::ListArgs;
use crate::config::CliOverrides;
use crate::error::Result;
use crate::runner::{case_ids, select_cases};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ListOutput<'a> {
    source: &'a Path,
    cases: Vec<ListedCase<'a>>,
}

#[derive(Serialize)]
struct ListedCase<'a> {
    id: &'a str,
    name: String,
    script_path: Option<&'a str>,
    expected_success: bool,
    timeout: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_output: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_result_file: Option<&'a str>,
}

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if the settings or `Testcase.json` cannot be loaded.
pub fn execute(args: &ListArgs, json: bool, cli: &CliOverrides) -> Result<()> {
    let workspace = load_workspace(cli)?;
    let cases = &workspace.loaded.cases;
    let ids = case_ids(cases);

    let listed: Vec<ListedCase<'_>> = select_cases(&ids, cases, args.filter.as_deref())
        .into_iter()
        .map(|selected| ListedCase {
            id: selected.id,
            name: selected.case.display_name(),
            script_path: selected.case.script_path.as_deref(),
            expected_success: selected.case.expected_success(),
            timeout: selected
                .case
                .timeout_secs(workspace.settings.default_timeout),
            expected_output: selected.case.expected_output(),
            expected_result_file: selected.case.expected_result_file(),
        })
        .collect();

    if json {
        let output = ListOutput {
            source: &workspace.loaded.source,
            cases: listed,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for case in &listed {
        let expectation = if case.expected_success {
            "expect success"
        } else {
            "expect failure"
        };
        println!(
            "{}  {}  ({expectation}, timeout {}s)",
            case.id,
            case.script_path.unwrap_or("<no script_path>"),
            case.timeout
        );
    }
    println!("{} test case(s) in {}", listed.len(), workspace.loaded.source.display());
    Ok(())
}
