//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Run shell-script test cases declared in Testcase.json
#[derive(Parser, Debug)]
#[command(name = "scriptcheck", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Harness root: relative scripts and expected files resolve here (env: `SCRIPTCHECK_ROOT`)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Directory that receives test_run_<timestamp> folders (default: <root>/logs)
    #[arg(long, global = true)]
    pub logs_dir: Option<PathBuf>,

    /// Test case file (default: ./Testcase.json, then <root>/Testcase.json)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Interpreter used to run scripts (default: bash)
    #[arg(long = "shell", value_name = "SHELL", global = true)]
    pub interpreter: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors and the final summary)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write diagnostics to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the test cases (default)
    Run(RunArgs),

    /// Show the test cases that would run
    List(ListArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Only run cases whose id contains this text
    #[arg(short = 'k', long)]
    pub filter: Option<String>,

    /// Timeout in seconds for cases that do not set one (default: 30)
    #[arg(long)]
    pub default_timeout: Option<f64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only list cases whose id contains this text
    #[arg(short = 'k', long)]
    pub filter: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShellType {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    #[value(name = "powershell")]
    #[value(alias = "pwsh")]
    /// `PowerShell`
    PowerShell,
    /// Elvish
    Elvish,
}
