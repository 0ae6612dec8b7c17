//! Check command implementation.

use crate::cli::CheckArgs;
use crate::error::convert_admit_error;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Result;
use intake_core::Intake;
use std::path::PathBuf;
use std::process::ExitCode;
use walkdir::WalkDir;

/// Exit status when `--strict` is set and something was rejected.
pub const EXIT_REJECTED: u8 = 1;

pub fn execute(
    args: &CheckArgs,
    formatter: &dyn OutputFormatter,
    show_progress: bool,
) -> Result<ExitCode> {
    let inputs = collect_inputs(&args.paths, formatter);
    tracing::debug!(inputs = inputs.len(), "inputs collected");

    let mut intake = Intake::new(args.to_config());
    if let Some(workers) = args.workers {
        intake = intake.with_workers(workers as usize);
    }
    if let Some(dir) = &args.scratch_dir {
        intake = intake.with_scratch_root(dir);
    }
    if show_progress {
        intake = intake.with_callback(CliProgress::new(inputs.len()));
    }

    let report = intake.admit(&inputs).map_err(convert_admit_error)?;

    formatter.format_check_report(&report, args.samples)?;

    if args.strict && !report.all_admitted() {
        return Ok(ExitCode::from(EXIT_REJECTED));
    }
    Ok(ExitCode::SUCCESS)
}

/// Expands directories into the regular files below them.
///
/// Other paths are passed through untouched, so a missing path still gets
/// its own `not_found` verdict. Directory entries are sorted by name to keep
/// reports stable across runs.
fn collect_inputs(paths: &[PathBuf], formatter: &dyn OutputFormatter) -> Vec<PathBuf> {
    let mut inputs = Vec::new();

    for path in paths {
        if !path.is_dir() {
            inputs.push(path.clone());
            continue;
        }

        for entry in WalkDir::new(path).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => inputs.push(entry.into_path()),
                Ok(entry) => {
                    if !entry.file_type().is_dir() {
                        tracing::debug!(path = %entry.path().display(), "skipping non-regular file");
                    }
                }
                Err(e) => formatter.format_warning(&format!("cannot walk directory: {e}")),
            }
        }
    }

    inputs
}
