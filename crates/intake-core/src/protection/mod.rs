//! Protection detection: does the content require a credential?
//!
//! Probes fail soft. Anything that stops a probe from reaching a decision
//! becomes [`ProtectionStatus::Indeterminate`], which the run's
//! [`ProbeErrorPolicy`] turns into a pass or a rejection.

pub mod pdf;
pub mod zip;

use crate::AdmissionConfig;
use crate::RejectReason;
use crate::config::ProbeErrorPolicy;
use crate::types::CandidateFile;
use crate::types::ContentType;
use crate::types::DetectedType;

/// Result of a protection probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectionStatus {
    /// No credential needed.
    Unprotected,
    /// Content is encrypted or password-gated.
    Protected {
        /// What gave it away.
        reason: String,
    },
    /// Container structure is broken; distinct from encryption.
    Corrupt {
        /// What failed.
        reason: String,
    },
    /// The probe could not decide.
    Indeterminate {
        /// Why the probe failed.
        reason: String,
    },
}

impl ProtectionStatus {
    /// Returns `true` only for a positive encryption finding.
    #[must_use]
    pub const fn is_protected(&self) -> bool {
        matches!(self, Self::Protected { .. })
    }

    /// Explanation attached to a non-clean status.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Unprotected => None,
            Self::Protected { reason }
            | Self::Corrupt { reason }
            | Self::Indeterminate { reason } => Some(reason),
        }
    }

    /// Maps the status to a rejection under `policy`.
    ///
    /// Returns `None` when the candidate may proceed.
    #[must_use]
    pub fn rejection(&self, policy: ProbeErrorPolicy) -> Option<(RejectReason, String)> {
        match self {
            Self::Unprotected => None,
            Self::Protected { reason } => Some((RejectReason::Protected, reason.clone())),
            Self::Corrupt { reason } => Some((RejectReason::CorruptArchive, reason.clone())),
            Self::Indeterminate { reason } => match policy {
                ProbeErrorPolicy::Permit => None,
                ProbeErrorPolicy::Reject => Some((
                    RejectReason::Protected,
                    format!("protection could not be ruled out: {reason}"),
                )),
            },
        }
    }
}

/// Runs the protection probe for the candidate's detected type.
///
/// Types without a probe are always unprotected.
#[must_use]
pub fn probe(
    candidate: &CandidateFile,
    detected: &DetectedType,
    config: &AdmissionConfig,
) -> ProtectionStatus {
    if !detected.capabilities().can_probe_protection {
        return ProtectionStatus::Unprotected;
    }

    let status = match detected.content_type {
        ContentType::Pdf => pdf::probe(&candidate.path),
        ContentType::Zip => zip::probe(&candidate.path, config),
        _ => ProtectionStatus::Unprotected,
    };

    match &status {
        ProtectionStatus::Indeterminate { reason } => tracing::warn!(
            path = %candidate.logical_path.display(),
            %reason,
            policy = ?config.probe_error_policy,
            "protection probe failed"
        ),
        ProtectionStatus::Corrupt { reason } => tracing::warn!(
            path = %candidate.logical_path.display(),
            %reason,
            "container failed integrity check"
        ),
        _ => {}
    }

    status
}
