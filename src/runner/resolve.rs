//! Script path resolution.
//!
//! Candidates are generated in a fixed order and the first existing file
//! wins. The full candidate list is kept so a miss can report every
//! location that was checked.

use std::path::{Path, PathBuf};

/// Ordered candidate locations for `script`.
///
/// - absolute paths are used as given
/// - relative paths try `<root>/<script>`, then `<root>/<script>.sh`,
///   then `<cwd>/<script>`
#[must_use]
pub fn script_candidates(script: &str, root: &Path, cwd: &Path) -> Vec<PathBuf> {
    let path = Path::new(script);
    if path.is_absolute() {
        return vec![path.to_path_buf()];
    }

    let mut candidates = Vec::with_capacity(3);
    for candidate in [
        root.join(path),
        root.join(format!("{script}.sh")),
        cwd.join(path),
    ] {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// Resolve `script` to an existing file.
///
/// # Errors
///
/// Returns every checked candidate when none of them is a file.
pub fn resolve_script(script: &str, root: &Path, cwd: &Path) -> Result<PathBuf, Vec<PathBuf>> {
    let candidates = script_candidates(script, root, cwd);
    candidates
        .iter()
        .find(|candidate| candidate.is_file())
        .cloned()
        .ok_or(candidates)
}
