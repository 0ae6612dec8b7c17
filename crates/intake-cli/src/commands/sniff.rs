//! Sniff command implementation

use crate::cli::SniffArgs;
use crate::output::OutputFormatter;
use crate::output::SniffOutcome;
use crate::output::SniffResult;
use anyhow::Result;
use intake_core::detect_path;

pub fn execute(args: &SniffArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let prefix_len = args.prefix_len as usize;

    let results: Vec<_> = args
        .paths
        .iter()
        .map(|path| SniffResult {
            path: path.clone(),
            outcome: match detect_path(path, prefix_len) {
                Ok(Some(detected)) => SniffOutcome::Detected(detected),
                Ok(None) => SniffOutcome::Unknown,
                Err(e) => SniffOutcome::Failed(e.to_string()),
            },
        })
        .collect();

    formatter.format_sniff_results(&results)
}
