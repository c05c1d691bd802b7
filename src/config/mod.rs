//! Configuration management for `scriptcheck`.
//!
//! Two kinds of configuration exist:
//!
//! - Harness settings (interpreter, logs directory, default timeout),
//!   layered with precedence (highest wins):
//!   1. CLI overrides
//!   2. Environment variables (`SCRIPTCHECK_*`)
//!   3. Settings file (`<root>/scriptcheck.yaml`)
//!   4. Defaults
//! - The test case list (`Testcase.json`), see [`testcases`].
//!
//! The harness root is the directory relative script and expected-result
//! paths are resolved against. It comes from `--root`, then
//! `SCRIPTCHECK_ROOT`, then the directory holding the running executable.

pub mod testcases;

pub use testcases::{
    LoadedTestCases, discover_testcase_file, load_test_cases, load_test_cases_from, parse_test_cases,
};

use crate::error::{HarnessError, Result};
use crate::model::DEFAULT_TIMEOUT_SECS;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Conventional name of the test case list.
pub const TESTCASE_FILENAME: &str = "Testcase.json";
/// Optional settings file inside the harness root.
pub const SETTINGS_FILENAME: &str = "scriptcheck.yaml";
/// Interpreter used when none is configured.
pub const DEFAULT_SHELL: &str = "bash";
/// Logs directory name under the root.
pub const DEFAULT_LOGS_DIRNAME: &str = "logs";

const ENV_PREFIX: &str = "SCRIPTCHECK_";
const ROOT_ENV: &str = "SCRIPTCHECK_ROOT";

const KEY_SHELL: &str = "shell";
const KEY_LOGS_DIR: &str = "logs-dir";
const KEY_DEFAULT_TIMEOUT: &str = "default-timeout";
const KEY_CONFIG: &str = "config";

/// A flat key/value configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        Ok(layer_from_yaml_value(&value))
    }

    /// Build a layer from `SCRIPTCHECK_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_vars(env::vars())
    }

    /// Build a layer from an explicit set of environment pairs.
    #[must_use]
    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            if key == ROOT_ENV {
                continue;
            }
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.insert(stripped, value);
            }
        }
        layer
    }
}

/// `LOGS_DIR`, `logs_dir` and `logs-dir` all name the same key.
fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn layer_from_yaml_value(value: &serde_yaml::Value) -> ConfigLayer {
    let mut layer = ConfigLayer::default();
    let serde_yaml::Value::Mapping(map) = value else {
        return layer;
    };

    for (key, value) in map {
        let Some(key) = key.as_str() else {
            continue;
        };
        let rendered = match value {
            serde_yaml::Value::String(s) => s.clone(),
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        layer.insert(key, rendered);
    }

    layer
}

/// CLI overrides for settings loading.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub shell: Option<String>,
    pub default_timeout: Option<f64>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(path) = &self.logs_dir {
            layer.insert(KEY_LOGS_DIR, path.to_string_lossy());
        }
        if let Some(path) = &self.config {
            layer.insert(KEY_CONFIG, path.to_string_lossy());
        }
        if let Some(shell) = &self.shell {
            layer.insert(KEY_SHELL, shell.clone());
        }
        if let Some(timeout) = self.default_timeout {
            layer.insert(KEY_DEFAULT_TIMEOUT, timeout.to_string());
        }

        layer
    }
}

/// Fully resolved harness settings.
#[derive(Debug, Clone, PartialEq)]
pub struct HarnessSettings {
    /// Directory relative script and expected-result paths resolve against.
    pub root: PathBuf,
    /// Parent of the `test_run_<timestamp>` directories.
    pub logs_dir: PathBuf,
    /// Interpreter scripts are launched under.
    pub shell: String,
    /// Timeout for cases that do not set one.
    pub default_timeout: f64,
    /// Explicit descriptor file; `None` means discover `Testcase.json`.
    pub config_file: Option<PathBuf>,
}

impl HarnessSettings {
    /// Defaults for a given root.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            logs_dir: root.join(DEFAULT_LOGS_DIRNAME),
            root,
            shell: DEFAULT_SHELL.to_string(),
            default_timeout: DEFAULT_TIMEOUT_SECS,
            config_file: None,
        }
    }

    /// Apply a merged layer on top of the defaults for `root`.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Settings` if a value is empty or not parseable.
    pub fn from_layer(root: &Path, layer: &ConfigLayer) -> Result<Self> {
        let mut settings = Self::with_root(root);

        if let Some(shell) = layer.get(KEY_SHELL) {
            let shell = shell.trim();
            if shell.is_empty() {
                return Err(HarnessError::settings(KEY_SHELL, "must not be empty"));
            }
            settings.shell = shell.to_string();
        }

        if let Some(logs_dir) = layer.get(KEY_LOGS_DIR) {
            if logs_dir.trim().is_empty() {
                return Err(HarnessError::settings(KEY_LOGS_DIR, "must not be empty"));
            }
            settings.logs_dir = resolve_against(root, Path::new(logs_dir));
        }

        if let Some(timeout) = layer.get(KEY_DEFAULT_TIMEOUT) {
            settings.default_timeout = parse_timeout(timeout)?;
        }

        if let Some(config) = layer.get(KEY_CONFIG).filter(|c| !c.trim().is_empty()) {
            settings.config_file = Some(resolve_against(root, Path::new(config)));
        }

        Ok(settings)
    }
}

fn parse_timeout(value: &str) -> Result<f64> {
    let parsed: f64 = value.trim().parse().map_err(|_| {
        HarnessError::settings(KEY_DEFAULT_TIMEOUT, format!("'{value}' is not a number"))
    })?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(HarnessError::settings(
            KEY_DEFAULT_TIMEOUT,
            format!("'{value}' must be a finite number of seconds >= 0"),
        ));
    }
    Ok(parsed)
}

/// Join `path` onto `base` unless it is already absolute.
#[must_use]
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Determine the harness root.
///
/// # Errors
///
/// Returns an error if the executable location cannot be determined.
pub fn resolve_root(cli_root: Option<&Path>) -> Result<PathBuf> {
    if let Some(root) = cli_root {
        return Ok(root.to_path_buf());
    }

    if let Ok(root) = env::var(ROOT_ENV) {
        if !root.trim().is_empty() {
            return Ok(PathBuf::from(root));
        }
    }

    let exe = env::current_exe()?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        HarnessError::settings("root", format!("{} has no parent directory", exe.display()))
    })
}

/// Load the settings file from the root directory.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_settings_file(root: &Path) -> Result<ConfigLayer> {
    ConfigLayer::from_yaml(&root.join(SETTINGS_FILENAME))
}

/// Load harness settings with the documented precedence order.
///
/// # Errors
///
/// Returns an error if the settings file cannot be parsed or a value is invalid.
pub fn load_settings(cli: &CliOverrides) -> Result<HarnessSettings> {
    let root = resolve_root(cli.root.as_deref())?;
    let file_layer = load_settings_file(&root)?;
    let env_layer = ConfigLayer::from_env();
    let cli_layer = cli.as_layer();

    let merged = ConfigLayer::merge_layers(&[file_layer, env_layer, cli_layer]);
    let settings = HarnessSettings::from_layer(&root, &merged)?;
    tracing::debug!(
        root = %settings.root.display(),
        logs_dir = %settings.logs_dir.display(),
        shell = %settings.shell,
        default_timeout = settings.default_timeout,
        "Resolved harness settings"
    );
    Ok(settings)
}
