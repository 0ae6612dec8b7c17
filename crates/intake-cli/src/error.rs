//! Error conversion utilities for CLI.
//!
//! Converts intake-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance. Rejected files are
//! not errors and never pass through here.

use anyhow::anyhow;
use intake_core::AdmitError;

/// Converts `AdmitError` to user-friendly anyhow error with context
pub fn convert_admit_error(err: AdmitError) -> anyhow::Error {
    match err {
        AdmitError::Scratch { path, source } => {
            anyhow!(
                "Cannot use scratch storage at '{}': {}\n\
                 HINT: Check free space and permissions, or choose another location with --scratch-dir.",
                path.display(),
                source
            )
        }
        AdmitError::InvalidConfig { reason } => {
            anyhow!(
                "Invalid admission limits: {reason}\n\
                 HINT: Limits must be positive; see 'intake check --help' for the accepted flags."
            )
        }
        AdmitError::WorkerPool(reason) => {
            anyhow!(
                "Cannot start worker threads: {reason}\n\
                 HINT: Use --workers to request fewer threads."
            )
        }
        AdmitError::Io(io_err) => {
            anyhow!("I/O error during admission: {io_err}")
        }
    }
}
