//! Loading of the `Testcase.json` descriptor list.
//!
//! Each list element is either a bare script path or a full descriptor
//! object. Bare paths are expanded at load time; full descriptors pass
//! through untouched so defaults stay a consumption-time concern. Order is
//! preserved and script existence is not checked here.

use super::TESTCASE_FILENAME;
use crate::error::{HarnessError, Result};
use crate::model::{TestCase, TestCaseEntry};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Descriptors plus the file they were read from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTestCases {
    pub source: PathBuf,
    pub cases: Vec<TestCase>,
}

/// Locate `Testcase.json`: the working directory first, then the root.
///
/// Returns the root candidate when neither exists so the caller can report
/// where it last looked.
#[must_use]
pub fn discover_testcase_file(cwd: &Path, root: &Path) -> PathBuf {
    let local = cwd.join(TESTCASE_FILENAME);
    if local.is_file() {
        return local;
    }
    root.join(TESTCASE_FILENAME)
}

/// Discover and load the descriptor list.
///
/// # Errors
///
/// Returns `ConfigNotFound` if no file exists and `ConfigMalformed` if its
/// content is not a list of descriptors.
pub fn load_test_cases(cwd: &Path, root: &Path) -> Result<LoadedTestCases> {
    load_test_cases_from(&discover_testcase_file(cwd, root))
}

/// Load the descriptor list from an explicit path.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file does not exist, `ConfigMalformed`
/// if it cannot be parsed, or an I/O error if it cannot be read.
pub fn load_test_cases_from(path: &Path) -> Result<LoadedTestCases> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(HarnessError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(err.into()),
    };

    let cases = parse_test_cases(&contents, path)?;
    debug!(path = %path.display(), count = cases.len(), "Loaded test cases");
    Ok(LoadedTestCases {
        source: path.to_path_buf(),
        cases,
    })
}

/// Parse and normalise descriptor list content.
///
/// # Errors
///
/// Returns `ConfigMalformed` naming `source` if the JSON is invalid or an
/// element is neither a string nor a descriptor object.
pub fn parse_test_cases(contents: &str, source: &Path) -> Result<Vec<TestCase>> {
    let entries: Vec<TestCaseEntry> =
        serde_json::from_str(contents).map_err(|err| HarnessError::ConfigMalformed {
            path: source.to_path_buf(),
            reason: err.to_string(),
        })?;

    Ok(entries.into_iter().map(TestCase::from).collect())
}
