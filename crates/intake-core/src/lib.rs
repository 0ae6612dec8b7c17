//! File admission pipeline with content sniffing and security limits.
//!
//! `intake-core` decides, for every input path and every member of every
//! archive nested inside it, whether the content may be handed on: the true
//! type is sniffed from the bytes, size and nesting limits are enforced,
//! encrypted content is refused and a bounded decoded sample proves the
//! content is readable.
//!
//! # Examples
//!
//! ```no_run
//! use intake_core::AdmissionConfig;
//! use intake_core::admit_batch;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AdmissionConfig::default();
//! let report = admit_batch(&["uploads/report.pdf", "uploads/bundle.zip"], &config)?;
//! for verdict in report.verdicts.iter().filter(|v| !v.is_admitted()) {
//!     println!("{}: {:?}", verdict.path.display(), verdict.reason);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod context;
pub mod copy;
pub mod error;
pub mod formats;
pub mod pipeline;
pub mod protection;
pub mod reader;
pub mod report;
pub mod security;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main API types
pub use api::Intake;
pub use api::admit_batch;
pub use api::admit_file;
pub use config::AdmissionConfig;
pub use config::ProbeErrorPolicy;
pub use context::RunContext;
pub use error::AdmitError;
pub use error::RejectReason;
pub use error::Result;
pub use formats::detect_bytes;
pub use formats::detect_path;
pub use protection::ProtectionStatus;
pub use reader::ContentSample;
pub use report::BatchReport;
pub use report::NoopCallback;
pub use report::Outcome;
pub use report::Stage;
pub use report::Verdict;
pub use report::VerdictCallback;

// Re-export types module for easier access
pub use types::CandidateFile;
pub use types::ContentType;
pub use types::DetectedType;
pub use types::SpreadsheetKind;
