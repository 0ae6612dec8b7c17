//! Verdicts and batch reporting.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use crate::RejectReason;
use crate::reader::ContentSample;
use crate::types::CandidateFile;
use crate::types::DetectedType;

/// Final decision for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The candidate passed every applicable check.
    Admitted,
    /// The candidate failed a check; see the verdict's reason.
    Rejected,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Admitted => "admitted",
            Self::Rejected => "rejected",
        })
    }
}

/// Last pipeline state a candidate completed before its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Known to the pipeline, nothing checked yet.
    Discovered,
    /// Size guard passed.
    SizeChecked,
    /// Content type established.
    TypeDetected,
    /// Protection probe passed.
    ProtectionChecked,
    /// Archive members were handed back to the pipeline.
    Expanded,
    /// A content sample was decoded.
    ContentChecked,
}

impl Stage {
    /// Lower-case name used in reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::SizeChecked => "size_checked",
            Self::TypeDetected => "type_detected",
            Self::ProtectionChecked => "protection_checked",
            Self::Expanded => "expanded",
            Self::ContentChecked => "content_checked",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The admission decision for one candidate.
///
/// Paths are logical (`outer.zip!/inner.txt` for members), so verdicts stay
/// meaningful after the scratch area is removed and are identical across
/// runs over the same input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Logical path of the candidate.
    pub path: PathBuf,
    /// Archive nesting depth; top-level inputs are 0.
    pub depth: usize,
    /// Logical path of the containing archive, for members.
    pub parent: Option<PathBuf>,
    /// Admitted or rejected.
    pub outcome: Outcome,
    /// Rejection code; `None` for admitted candidates.
    pub reason: Option<RejectReason>,
    /// Human-readable explanation of a rejection.
    pub detail: Option<String>,
    /// Content type, once sniffed.
    pub detected: Option<DetectedType>,
    /// Decoded sample, for admitted non-container candidates.
    pub sample: Option<ContentSample>,
    /// Last completed pipeline state.
    pub stage: Stage,
}

impl Verdict {
    /// Admits `candidate`.
    #[must_use]
    pub fn admitted(
        candidate: &CandidateFile,
        parent: Option<&Path>,
        detected: DetectedType,
        sample: Option<ContentSample>,
        stage: Stage,
    ) -> Self {
        Self {
            path: candidate.logical_path.clone(),
            depth: candidate.depth,
            parent: parent.map(Path::to_path_buf),
            outcome: Outcome::Admitted,
            reason: None,
            detail: None,
            detected: Some(detected),
            sample,
            stage,
        }
    }

    /// Rejects `candidate`.
    #[must_use]
    pub fn rejected(
        candidate: &CandidateFile,
        parent: Option<&Path>,
        reason: RejectReason,
        detail: impl Into<String>,
        detected: Option<DetectedType>,
        stage: Stage,
    ) -> Self {
        Self {
            path: candidate.logical_path.clone(),
            depth: candidate.depth,
            parent: parent.map(Path::to_path_buf),
            outcome: Outcome::Rejected,
            reason: Some(reason),
            detail: Some(detail.into()),
            detected,
            sample: None,
            stage,
        }
    }

    /// Returns `true` for admitted candidates.
    #[inline]
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        self.outcome == Outcome::Admitted
    }
}

/// Ordered verdicts of one run.
///
/// Top-level inputs appear in input order; each is followed by the verdicts
/// of its archive members in discovery order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Verdicts, one per candidate.
    pub verdicts: Vec<Verdict>,

    /// Wall-clock duration of the run.
    pub duration: Duration,
}

impl BatchReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of admitted candidates.
    #[must_use]
    pub fn admitted(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_admitted()).count()
    }

    /// Number of rejected candidates.
    #[must_use]
    pub fn rejected(&self) -> usize {
        self.verdicts.len() - self.admitted()
    }

    /// Rejection counts keyed by reason, in reason order.
    #[must_use]
    pub fn count_by_reason(&self) -> BTreeMap<RejectReason, usize> {
        let mut counts = BTreeMap::new();
        for reason in self.verdicts.iter().filter_map(|v| v.reason) {
            *counts.entry(reason).or_insert(0) += 1;
        }
        counts
    }

    /// Returns `true` if nothing was rejected.
    #[must_use]
    pub fn all_admitted(&self) -> bool {
        self.verdicts.iter().all(Verdict::is_admitted)
    }

    /// Looks up the verdict for a logical path.
    #[must_use]
    pub fn find(&self, path: &Path) -> Option<&Verdict> {
        self.verdicts.iter().find(|v| v.path == path)
    }
}

/// Receives verdicts as they are decided.
///
/// Trees are processed in parallel, so verdicts of different top-level
/// inputs may interleave; within one tree they arrive in discovery order.
///
/// # Examples
///
/// ```
/// use intake_core::Verdict;
/// use intake_core::VerdictCallback;
/// use std::sync::atomic::AtomicUsize;
/// use std::sync::atomic::Ordering;
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl VerdictCallback for Counter {
///     fn on_verdict(&self, _verdict: &Verdict) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait VerdictCallback: Send + Sync {
    /// Called once per candidate when its verdict is recorded.
    fn on_verdict(&self, verdict: &Verdict);

    /// Called after the last verdict of the run.
    fn on_complete(&self, _report: &BatchReport) {}
}

/// No-op implementation of `VerdictCallback`.
#[derive(Debug, Default)]
pub struct NoopCallback;

impl VerdictCallback for NoopCallback {
    fn on_verdict(&self, _verdict: &Verdict) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CandidateId;
    use crate::types::ContentType;

    fn candidate(path: &str) -> CandidateFile {
        CandidateFile::top_level(CandidateId(0), Path::new(path), 0)
    }

    fn text() -> DetectedType {
        DetectedType::heuristic(ContentType::Text, "text/plain")
    }

    #[test]
    fn test_new_report() {
        let report = BatchReport::new();
        assert_eq!(report.admitted(), 0);
        assert_eq!(report.rejected(), 0);
        assert!(report.all_admitted());
    }

    #[test]
    fn test_counters() {
        let report = BatchReport {
            verdicts: vec![
                Verdict::admitted(&candidate("a"), None, text(), None, Stage::ContentChecked),
                Verdict::rejected(
                    &candidate("b"),
                    None,
                    RejectReason::TooLarge,
                    "big",
                    None,
                    Stage::Discovered,
                ),
                Verdict::rejected(
                    &candidate("c"),
                    None,
                    RejectReason::TooLarge,
                    "big",
                    None,
                    Stage::Discovered,
                ),
                Verdict::rejected(
                    &candidate("d"),
                    None,
                    RejectReason::NotFound,
                    "gone",
                    None,
                    Stage::Discovered,
                ),
            ],
            duration: Duration::ZERO,
        };

        assert_eq!(report.admitted(), 1);
        assert_eq!(report.rejected(), 3);
        assert!(!report.all_admitted());

        let counts = report.count_by_reason();
        assert_eq!(counts[&RejectReason::TooLarge], 2);
        assert_eq!(counts[&RejectReason::NotFound], 1);
        assert_eq!(
            counts.keys().copied().collect::<Vec<_>>(),
            [RejectReason::NotFound, RejectReason::TooLarge]
        );
    }

    #[test]
    fn test_find() {
        let report = BatchReport {
            verdicts: vec![Verdict::admitted(
                &candidate("notes.txt"),
                None,
                text(),
                None,
                Stage::ContentChecked,
            )],
            duration: Duration::ZERO,
        };
        assert!(report.find(Path::new("notes.txt")).is_some());
        assert!(report.find(Path::new("other.txt")).is_none());
    }

    #[test]
    fn test_stage_order() {
        assert!(Stage::Discovered < Stage::SizeChecked);
        assert!(Stage::ProtectionChecked < Stage::ContentChecked);
        assert_eq!(Stage::TypeDetected.to_string(), "type_detected");
    }
}
