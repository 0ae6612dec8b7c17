//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use clap_complete::Shell;
use intake_core::AdmissionConfig;
use intake_core::ProbeErrorPolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "intake")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (and debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Admit files and archives, reporting a verdict for every candidate
    Check(CheckArgs),
    /// Print the sniffed content type of files
    Sniff(SniffArgs),
    /// Generate shell completions
    Completion(CompletionArgs),
}

/// Starting point for limits before individual flags are applied.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Preset {
    /// Secure defaults
    #[default]
    Default,
    /// Tight limits, no nested archives, refuse undeterminable protection
    Strict,
    /// Generous limits for trusted inputs
    Permissive,
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Files or directories to admit (directories are walked recursively)
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Limit preset to start from
    #[arg(long, value_enum, default_value_t = Preset::Default)]
    pub preset: Preset,

    /// Maximum size of any file or archive member (K, M, G, T suffixes)
    #[arg(long, value_parser = parse_byte_size)]
    pub max_file_size: Option<u64>,

    /// Maximum ratio of extracted bytes to archive size
    #[arg(long)]
    pub max_expansion_ratio: Option<f64>,

    /// Maximum archive nesting depth
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Maximum number of members expanded from one archive
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_members: Option<u32>,

    /// Maximum length of content samples in bytes
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_sample_length: Option<u32>,

    /// Maximum number of PDF pages sampled
    #[arg(long)]
    pub max_pdf_pages: Option<usize>,

    /// Maximum number of spreadsheet rows sampled after the header
    #[arg(long)]
    pub max_sheet_rows: Option<usize>,

    /// Reject when a protection probe cannot decide
    #[arg(long)]
    pub reject_on_probe_error: bool,

    /// Number of worker threads (default: one per CPU)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub workers: Option<u32>,

    /// Directory under which the run's scratch area is created
    #[arg(long, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Exit with an error if any candidate is rejected
    #[arg(long)]
    pub strict: bool,

    /// Include content samples in the output
    #[arg(long)]
    pub samples: bool,
}

impl CheckArgs {
    /// Builds the admission policy from the preset and flag overrides.
    pub fn to_config(&self) -> AdmissionConfig {
        let mut config = match self.preset {
            Preset::Default => AdmissionConfig::default(),
            Preset::Strict => AdmissionConfig::strict(),
            Preset::Permissive => AdmissionConfig::permissive(),
        };

        if let Some(size) = self.max_file_size {
            config.max_file_size = size;
        }
        if let Some(ratio) = self.max_expansion_ratio {
            config.max_expansion_ratio = ratio;
        }
        if let Some(depth) = self.max_depth {
            config.max_archive_depth = depth;
        }
        if let Some(members) = self.max_members {
            config.max_archive_members = members as usize;
        }
        if let Some(length) = self.max_sample_length {
            config.max_sample_length = length as usize;
        }
        if let Some(pages) = self.max_pdf_pages {
            config.max_pdf_pages = pages;
        }
        if let Some(rows) = self.max_sheet_rows {
            config.max_sheet_rows = rows;
        }
        if self.reject_on_probe_error {
            config.probe_error_policy = ProbeErrorPolicy::Reject;
        }
        config
    }
}

#[derive(clap::Args)]
pub struct SniffArgs {
    /// Files to sniff
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Number of leading bytes inspected
    #[arg(long, default_value = "8192", value_parser = clap::value_parser!(u32).range(16..))]
    pub prefix_len: u32,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Parse byte size with optional suffix (K, M, G, T)
#[allow(clippy::option_if_let_else)]
fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty byte size".to_string());
    }

    let (num_str, multiplier) = if let Some(stripped) = s.strip_suffix('T') {
        (stripped, 1024_u64.pow(4))
    } else if let Some(stripped) = s.strip_suffix('G') {
        (stripped, 1024_u64.pow(3))
    } else if let Some(stripped) = s.strip_suffix('M') {
        (stripped, 1024_u64.pow(2))
    } else if let Some(stripped) = s.strip_suffix('K') {
        (stripped, 1024)
    } else {
        (s, 1)
    };

    num_str
        .parse::<u64>()
        .map_err(|_| format!("invalid byte size: {s}"))
        .and_then(|n| {
            n.checked_mul(multiplier)
                .ok_or_else(|| format!("byte size overflow: {s}"))
        })
}
