use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;
use walkdir::WalkDir;

#[derive(Debug)]
pub struct CheckRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

impl CheckRun {
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// A throwaway harness root with its own scripts and `Testcase.json`.
///
/// Transcripts of each CLI invocation go to `cmd_log_dir`, outside the
/// root, so they never mix with the harness' own `logs/`.
pub struct HarnessWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub cmd_log_dir: PathBuf,
}

impl HarnessWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().join("root");
        let cmd_log_dir = temp_dir.path().join("cmd-logs");
        fs::create_dir_all(&root).expect("root dir");
        fs::create_dir_all(&cmd_log_dir).expect("cmd log dir");
        Self {
            temp_dir,
            root,
            cmd_log_dir,
        }
    }

    /// Write a file relative to the root, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dir");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn script(&self, rel: &str, body: &str) -> PathBuf {
        self.write(rel, &format!("#!/bin/sh\n{body}"))
    }

    pub fn testcases(&self, json: &str) -> PathBuf {
        self.write("Testcase.json", json)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// All `test_run_*` directories under the default logs directory.
    pub fn run_dirs(&self) -> Vec<PathBuf> {
        run_dirs_in(&self.logs_dir())
    }

    /// The only run directory; panics if there is not exactly one.
    pub fn single_run_dir(&self) -> PathBuf {
        let dirs = self.run_dirs();
        assert_eq!(dirs.len(), 1, "expected one run dir, got {dirs:?}");
        dirs.into_iter().next().unwrap()
    }
}

pub fn run_dirs_in(logs_dir: &Path) -> Vec<PathBuf> {
    if !logs_dir.exists() {
        return Vec::new();
    }
    let mut dirs: Vec<PathBuf> = WalkDir::new(logs_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("test_run_"))
        .map(walkdir::DirEntry::into_path)
        .collect();
    dirs.sort();
    dirs
}

/// File names of the per-test logs in a run directory (`result.log` excluded).
pub fn test_logs(run_dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = WalkDir::new(run_dir)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name != "result.log")
        .collect();
    names.sort();
    names
}

pub fn read_summary(run_dir: &Path) -> String {
    fs::read_to_string(run_dir.join("result.log")).expect("read result.log")
}

pub fn run_scriptcheck<I, S>(workspace: &HarnessWorkspace, args: I, label: &str) -> CheckRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_scriptcheck_in(
        workspace,
        &workspace.root,
        args,
        std::iter::empty::<(String, String)>(),
        label,
    )
}

pub fn run_scriptcheck_with_env<I, S, E, K, V>(
    workspace: &HarnessWorkspace,
    args: I,
    env_vars: E,
    label: &str,
) -> CheckRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    run_scriptcheck_in(workspace, &workspace.root, args, env_vars, label)
}

/// Run the binary from `cwd` with `--root` pointing at the workspace root.
///
/// `SCRIPTCHECK_SHELL=sh` is set so the suite does not depend on bash;
/// tests that care about the interpreter pass `--shell` or their own env.
pub fn run_scriptcheck_in<I, S, E, K, V>(
    workspace: &HarnessWorkspace,
    cwd: &Path,
    args: I,
    env_vars: E,
    label: &str,
) -> CheckRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("scriptcheck"));
    cmd.current_dir(cwd);
    for key in [
        "SCRIPTCHECK_ROOT",
        "SCRIPTCHECK_LOGS_DIR",
        "SCRIPTCHECK_CONFIG",
        "SCRIPTCHECK_DEFAULT_TIMEOUT",
    ] {
        cmd.env_remove(key);
    }
    cmd.env("SCRIPTCHECK_SHELL", "sh");
    cmd.arg("--root").arg(&workspace.root);
    cmd.args(args);
    cmd.envs(env_vars);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "scriptcheck=debug");
    cmd.env("RUST_BACKTRACE", "1");

    let start = Instant::now();
    let output = cmd.output().expect("run scriptcheck");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.cmd_log_dir.join(format!("{label}.log"));
    let log_body = format!(
        "label: {label}\nstarted: {:?}\nduration: {:?}\nstatus: {}\nargs: {:?}\ncwd: {}\n\nstdout:\n{}\n\nstderr:\n{}\n",
        SystemTime::now(),
        duration,
        output.status,
        cmd.get_args().collect::<Vec<_>>(),
        cwd.display(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    CheckRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}

/// Parse the error object the binary prints on stderr when stdout is not a TTY.
///
/// Diagnostics may precede it, so parsing starts at the first line that
/// opens a JSON object.
pub fn parse_error_json(stderr: &str) -> serde_json::Value {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines
        .iter()
        .position(|line| *line == "{")
        .expect("structured error on stderr");
    serde_json::from_str(&lines[start..].join("\n")).expect("parse error json")
}
