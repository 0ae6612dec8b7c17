//! Common traits for archive expanders.

use std::path::Path;
use std::path::PathBuf;

use crate::AdmissionConfig;
use crate::RejectReason;
use crate::Result;
use crate::types::CandidateFile;

/// What happened to one archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberOutcome {
    /// Member was written to scratch storage and awaits its own verdict.
    Extracted {
        /// Member name as stored in the archive.
        name: String,
        /// Location of the extracted bytes.
        path: PathBuf,
        /// Uncompressed size claimed by the header.
        declared_size: u64,
    },
    /// Member was refused without (complete) extraction.
    Rejected {
        /// Member name as stored in the archive.
        name: String,
        /// Uncompressed size claimed by the header.
        declared_size: u64,
        /// Rejection code.
        reason: RejectReason,
        /// Human-readable explanation.
        detail: String,
    },
}

impl MemberOutcome {
    /// Member name as stored in the archive.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Extracted { name, .. } | Self::Rejected { name, .. } => name,
        }
    }
}

/// Result of expanding one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// Every non-directory member, in central-directory order.
    Members(Vec<MemberOutcome>),
    /// Archive structure is unreadable; no members are reported.
    Corrupt {
        /// What failed.
        detail: String,
    },
    /// Archive would expand past its cumulative budget; anything extracted
    /// was discarded.
    OverBudget {
        /// Which limit was hit.
        detail: String,
    },
}

/// Trait for archive expanders.
pub trait ArchiveExpander {
    /// Extracts the members of `archive` into `dest`.
    ///
    /// Rejections of individual members or of the whole archive are reported
    /// in the returned [`Expansion`].
    ///
    /// # Errors
    ///
    /// Returns an error only when scratch storage fails.
    fn expand(
        &mut self,
        archive: &CandidateFile,
        dest: &Path,
        config: &AdmissionConfig,
    ) -> Result<Expansion>;

    /// Returns the archive format name.
    fn format_name(&self) -> &'static str;
}
