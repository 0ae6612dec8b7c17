//! Error types for the admission pipeline.
//!
//! Two families live here. [`RejectReason`] is the per-file taxonomy: every
//! failure at any pipeline stage becomes a rejected verdict carrying one of
//! these codes and the batch continues. [`AdmitError`] is reserved for faults
//! of the environment (scratch storage, worker pool, configuration) that abort
//! the whole run.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `AdmitError`.
pub type Result<T> = std::result::Result<T, AdmitError>;

/// Represents a specific size limit that a candidate ran into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitExceeded {
    /// Single file (or archive member) size limit exceeded.
    FileSize {
        /// File size in bytes.
        size: u64,
        /// Maximum allowed file size in bytes.
        max: u64,
    },
    /// Cumulative extraction budget of one archive exceeded.
    Expansion {
        /// Bytes the archive would expand to.
        extracted: u64,
        /// Budget derived from the archive size and expansion ratio.
        budget: u64,
    },
    /// Member count of one archive exceeded.
    MemberCount {
        /// Current member count.
        count: usize,
        /// Maximum allowed member count.
        max: usize,
    },
    /// Integer overflow detected while summing sizes.
    IntegerOverflow,
}

impl fmt::Display for LimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileSize { size, max } => {
                write!(f, "size limit exceeded: file size ({size} > {max})")
            }
            Self::Expansion { extracted, budget } => {
                write!(
                    f,
                    "size limit exceeded: archive expansion ({extracted} > {budget})"
                )
            }
            Self::MemberCount { count, max } => {
                write!(f, "size limit exceeded: member count ({count} > {max})")
            }
            Self::IntegerOverflow => {
                write!(f, "size limit exceeded: integer overflow in size tracking")
            }
        }
    }
}

/// Reason a candidate was rejected.
///
/// Rejections are never fatal to the batch. The variants are ordered by the
/// pipeline stage that usually produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectReason {
    /// Path does not exist or is not a regular file.
    NotFound,
    /// File, member or archive expansion exceeds a size limit.
    TooLarge,
    /// No known signature matched the leading bytes.
    UnknownType,
    /// Content requires a credential (or protection could not be ruled out
    /// under a rejecting probe policy).
    Protected,
    /// Archive structure or member integrity is broken.
    CorruptArchive,
    /// Archive member path is absolute, traverses upwards or is a link.
    PathTraversalUnsafe,
    /// Archive member lies deeper than the configured nesting limit.
    DepthExceeded,
    /// Content could not be decoded, or the type has no reader.
    Unreadable,
}

impl RejectReason {
    /// Every reason, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::NotFound,
        Self::TooLarge,
        Self::UnknownType,
        Self::Protected,
        Self::CorruptArchive,
        Self::PathTraversalUnsafe,
        Self::DepthExceeded,
        Self::Unreadable,
    ];

    /// Stable machine-readable code for this reason.
    ///
    /// # Examples
    ///
    /// ```
    /// use intake_core::RejectReason;
    ///
    /// assert_eq!(RejectReason::PathTraversalUnsafe.code(), "path_traversal_unsafe");
    /// ```
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::TooLarge => "too_large",
            Self::UnknownType => "unknown_type",
            Self::Protected => "protected",
            Self::CorruptArchive => "corrupt_archive",
            Self::PathTraversalUnsafe => "path_traversal_unsafe",
            Self::DepthExceeded => "depth_exceeded",
            Self::Unreadable => "unreadable",
        }
    }

    /// Returns `true` if the reason indicates hostile or unsafe input rather
    /// than merely unusable input.
    #[must_use]
    pub const fn is_security_relevant(self) -> bool {
        matches!(
            self,
            Self::TooLarge | Self::PathTraversalUnsafe | Self::DepthExceeded | Self::Protected
        )
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Faults that abort an admission run.
#[derive(Error, Debug)]
pub enum AdmitError {
    /// Scratch storage could not be created, written or removed.
    #[error("scratch storage unavailable at {path}: {source}")]
    Scratch {
        /// Location of the scratch area.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// I/O operation on scratch storage failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration values are unusable.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Which value is wrong and why.
        reason: String,
    },

    /// Worker pool could not be started.
    #[error("worker pool unavailable: {0}")]
    WorkerPool(String),
}

impl AdmitError {
    /// Returns `true` if this error comes from the storage environment rather
    /// than from caller input.
    ///
    /// # Examples
    ///
    /// ```
    /// use intake_core::AdmitError;
    ///
    /// let err = AdmitError::InvalidConfig {
    ///     reason: "max_sample_length must be positive".into(),
    /// };
    /// assert!(!err.is_environment_fault());
    /// ```
    #[must_use]
    pub const fn is_environment_fault(&self) -> bool {
        matches!(self, Self::Scratch { .. } | Self::Io(_) | Self::WorkerPool(_))
    }

    /// Returns a context string for this error, if available.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::InvalidConfig { reason } => Some(reason),
            Self::WorkerPool(msg) => Some(msg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_are_unique() {
        let mut codes: Vec<_> = RejectReason::ALL.iter().map(|r| r.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), RejectReason::ALL.len());
    }

    #[test]
    fn test_reason_display_is_code() {
        assert_eq!(RejectReason::TooLarge.to_string(), "too_large");
        assert_eq!(RejectReason::CorruptArchive.to_string(), "corrupt_archive");
    }

    #[test]
    fn test_security_relevant_reasons() {
        assert!(RejectReason::PathTraversalUnsafe.is_security_relevant());
        assert!(RejectReason::DepthExceeded.is_security_relevant());
        assert!(!RejectReason::UnknownType.is_security_relevant());
        assert!(!RejectReason::NotFound.is_security_relevant());
    }

    #[test]
    fn test_limit_display() {
        let limit = LimitExceeded::FileSize {
            size: 52_428_800,
            max: 10_485_760,
        };
        let display = limit.to_string();
        assert!(display.contains("file size"));
        assert!(display.contains("52428800"));

        let limit = LimitExceeded::Expansion {
            extracted: 5000,
            budget: 1000,
        };
        assert!(limit.to_string().contains("archive expansion"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full");
        let err: AdmitError = io_err.into();
        assert!(matches!(err, AdmitError::Io(_)));
        assert!(err.is_environment_fault());
    }

    #[test]
    fn test_scratch_error_display() {
        let err = AdmitError::Scratch {
            path: PathBuf::from("/nonexistent/scratch"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let display = err.to_string();
        assert!(display.contains("scratch storage unavailable"));
        assert!(display.contains("/nonexistent/scratch"));
        assert!(err.is_environment_fault());
    }

    #[test]
    fn test_context() {
        let err = AdmitError::InvalidConfig {
            reason: "bad ratio".into(),
        };
        assert_eq!(err.context(), Some("bad ratio"));

        let err = AdmitError::Io(std::io::Error::other("x"));
        assert_eq!(err.context(), None);
    }
}
