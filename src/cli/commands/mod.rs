//! Command implementations.

pub mod completions;
pub mod list;
pub mod run;
pub mod version;

use crate::config::{self, CliOverrides, HarnessSettings, LoadedTestCases, resolve_against};
use crate::error::Result;
use std::env;
use std::path::PathBuf;
use tracing::debug;

/// Settings and descriptors shared by `run` and `list`.
#[derive(Debug)]
pub struct Workspace {
    pub settings: HarnessSettings,
    pub cwd: PathBuf,
    pub loaded: LoadedTestCases,
}

/// Resolve settings and load the descriptor list.
///
/// Paths given on the command line are taken relative to the working
/// directory; everything else resolves against the harness root.
///
/// # Errors
///
/// Returns an error if the settings are invalid or `Testcase.json` is
/// missing or malformed.
pub fn load_workspace(cli: &CliOverrides) -> Result<Workspace> {
    let cwd = env::current_dir()?;
    let cli = CliOverrides {
        root: cli.root.as_deref().map(|p| resolve_against(&cwd, p)),
        logs_dir: cli.logs_dir.as_deref().map(|p| resolve_against(&cwd, p)),
        config: cli.config.as_deref().map(|p| resolve_against(&cwd, p)),
        ..cli.clone()
    };

    let settings = config::load_settings(&cli)?;
    let loaded = match &settings.config_file {
        Some(path) => config::load_test_cases_from(path)?,
        None => config::load_test_cases(&cwd, &settings.root)?,
    };
    debug!(
        source = %loaded.source.display(),
        cases = loaded.cases.len(),
        "Loaded test cases"
    );

    Ok(Workspace {
        settings,
        cwd,
        loaded,
    })
}
