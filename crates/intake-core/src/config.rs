//! Admission policy configuration.

use crate::AdmitError;
use crate::Result;

/// What to do when a protection probe cannot reach a decision.
///
/// A probe is indeterminate when the file cannot be opened or parsed well
/// enough to tell whether it is encrypted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeErrorPolicy {
    /// Treat the candidate as unprotected and let the content reader decide.
    #[default]
    Permit,
    /// Reject the candidate as protected.
    Reject,
}

/// Admission policy with secure default settings.
///
/// The same policy applies to top-level inputs and to every archive member
/// at any depth; members never get a relaxed copy.
///
/// # Examples
///
/// ```
/// use intake_core::AdmissionConfig;
///
/// // Use secure defaults
/// let config = AdmissionConfig::default();
///
/// // Customize for specific needs
/// let custom = AdmissionConfig {
///     max_file_size: 64 * 1024 * 1024, // 64 MiB
///     max_archive_depth: 1,
///     ..Default::default()
/// };
/// assert!(custom.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionConfig {
    /// Maximum size for a single file or archive member in bytes.
    pub max_file_size: u64,

    /// Maximum cumulative extracted size of one archive, as a multiple of
    /// the archive's own size.
    pub max_expansion_ratio: f64,

    /// Maximum nesting depth of archive members. Top-level inputs are depth 0.
    pub max_archive_depth: usize,

    /// Maximum number of members extracted from one archive.
    pub max_archive_members: usize,

    /// Maximum sample length in bytes.
    pub max_sample_length: usize,

    /// Number of leading PDF pages sampled.
    pub max_pdf_pages: usize,

    /// Number of spreadsheet rows sampled after the header row.
    pub max_sheet_rows: usize,

    /// Number of leading bytes inspected by the type sniffer.
    pub sniff_prefix_len: usize,

    /// Stance taken when a protection probe errors.
    pub probe_error_policy: ProbeErrorPolicy,
}

impl Default for AdmissionConfig {
    /// Creates an `AdmissionConfig` with secure default settings.
    ///
    /// Default values:
    /// - `max_file_size`: 10 MiB
    /// - `max_expansion_ratio`: 100.0
    /// - `max_archive_depth`: 3
    /// - `max_archive_members`: 10,000
    /// - `max_sample_length`: 100 bytes
    /// - `max_pdf_pages`: 5
    /// - `max_sheet_rows`: 5
    /// - `sniff_prefix_len`: 8 KiB
    /// - `probe_error_policy`: `Permit`
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10 MiB
            max_expansion_ratio: 100.0,
            max_archive_depth: 3,
            max_archive_members: 10_000,
            max_sample_length: 100,
            max_pdf_pages: 5,
            max_sheet_rows: 5,
            sniff_prefix_len: 8 * 1024,
            probe_error_policy: ProbeErrorPolicy::Permit,
        }
    }
}

impl AdmissionConfig {
    /// Creates a permissive configuration for trusted input sets.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            max_file_size: 256 * 1024 * 1024,
            max_expansion_ratio: 1000.0,
            max_archive_depth: 8,
            max_archive_members: 100_000,
            ..Default::default()
        }
    }

    /// Creates a strict configuration for hostile input sets.
    ///
    /// Nested archives are not expanded and undeterminable protection status
    /// leads to rejection.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_file_size: 2 * 1024 * 1024,
            max_expansion_ratio: 20.0,
            max_archive_depth: 1,
            max_archive_members: 1_000,
            probe_error_policy: ProbeErrorPolicy::Reject,
            ..Default::default()
        }
    }

    /// Checks that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns `AdmitError::InvalidConfig` naming the first bad value.
    pub fn validate(&self) -> Result<()> {
        let reason = if self.max_file_size == 0 {
            "max_file_size must be positive"
        } else if !self.max_expansion_ratio.is_finite() || self.max_expansion_ratio <= 0.0 {
            "max_expansion_ratio must be a positive finite number"
        } else if self.max_archive_members == 0 {
            "max_archive_members must be positive"
        } else if self.max_sample_length == 0 {
            "max_sample_length must be positive"
        } else if self.sniff_prefix_len < 16 {
            "sniff_prefix_len must be at least 16 bytes"
        } else {
            return Ok(());
        };

        Err(AdmitError::InvalidConfig {
            reason: reason.to_string(),
        })
    }

    /// Cumulative extraction budget for an archive of `archive_size` bytes.
    ///
    /// Saturates at `u64::MAX` instead of overflowing.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn expansion_budget(&self, archive_size: u64) -> u64 {
        let budget = archive_size as f64 * self.max_expansion_ratio;
        if budget >= u64::MAX as f64 {
            u64::MAX
        } else {
            budget as u64
        }
    }
}
