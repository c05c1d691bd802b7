use clap::Parser;
use scriptcheck::cli::commands;
use scriptcheck::cli::{Cli, Commands, RunArgs};
use scriptcheck::config;
use scriptcheck::logging::init_logging;
use scriptcheck::{HarnessError, StructuredError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let overrides = build_cli_overrides(&cli);
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Run(RunArgs::default()));

    let result = match command {
        Commands::Run(args) => commands::run::execute(&args, cli.json, cli.quiet, &overrides),
        Commands::List(args) => commands::list::execute(&args, cli.json, &overrides),
        Commands::Version => commands::version::execute(cli.json),
        Commands::Completions(args) => commands::completions::execute(&args),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &HarnessError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

fn build_cli_overrides(cli: &Cli) -> config::CliOverrides {
    config::CliOverrides {
        root: cli.root.clone(),
        logs_dir: cli.logs_dir.clone(),
        config: cli.config.clone(),
        shell: cli.interpreter.clone(),
        default_timeout: None,
    }
}
