//! Output formatter trait for CLI results.

use anyhow::Result;
use intake_core::BatchReport;
use intake_core::DetectedType;
use serde::Serialize;
use std::path::PathBuf;

/// Result of sniffing one path.
#[derive(Debug)]
pub struct SniffResult {
    pub path: PathBuf,
    pub outcome: SniffOutcome,
}

#[derive(Debug)]
pub enum SniffOutcome {
    Detected(DetectedType),
    Unknown,
    Failed(String),
}

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format the verdicts and summary of an admission run
    fn format_check_report(&self, report: &BatchReport, show_samples: bool) -> Result<()>;

    /// Format sniffer results
    fn format_sniff_results(&self, results: &[SniffResult]) -> Result<()>;

    /// Format a fatal error of `operation`
    fn format_error(&self, operation: &str, error: &anyhow::Error);

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }
}

impl JsonOutput<()> {
    pub fn error(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Error,
            data: None,
            error: Some(error.into()),
        }
    }
}
