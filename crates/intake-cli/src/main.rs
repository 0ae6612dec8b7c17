//! Intake CLI - Command-line utility for admitting untrusted files and
//! archives.

mod cli;
mod commands;
mod error;
mod output;
mod progress;

use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status for fatal errors (bad limits, scratch storage, I/O).
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);

    let (operation, result) = match &cli.command {
        cli::Commands::Check(args) => {
            let show_progress =
                !cli.quiet && !cli.json && progress::CliProgress::should_show();
            (
                "check",
                commands::check::execute(args, &*formatter, show_progress),
            )
        }
        cli::Commands::Sniff(args) => (
            "sniff",
            commands::sniff::execute(args, &*formatter).map(|()| ExitCode::SUCCESS),
        ),
        cli::Commands::Completion(args) => {
            commands::completion::execute(args.shell);
            ("completion", Ok(ExitCode::SUCCESS))
        }
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            formatter.format_error(operation, &err);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// the verbosity flags.
fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
