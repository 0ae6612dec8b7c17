//! Admission pipeline for one top-level input tree.
//!
//! Each candidate moves through
//! `Discovered → SizeChecked → TypeDetected → ProtectionChecked →
//! {Expanded | ContentChecked}` and stops at the first failing check.
//! Archive members are appended to a FIFO work-list instead of recursing, so
//! nesting depth is bounded by data and never by the call stack.
//!
//! Scratch space is given back as soon as it is no longer needed: a member's
//! extracted file goes once its verdict is recorded, and an archive's
//! extraction directory goes with the verdict of its last member.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::RejectReason;
use crate::Result;
use crate::context::RunContext;
use crate::formats::ArchiveExpander;
use crate::formats::Expansion;
use crate::formats::MemberOutcome;
use crate::formats::ZipExpander;
use crate::formats::detect_path;
use crate::protection;
use crate::reader;
use crate::report::Stage;
use crate::report::Verdict;
use crate::report::VerdictCallback;
use crate::security::check_file_size;
use crate::types::CandidateFile;
use crate::types::CandidateId;
use crate::types::Origin;

/// Work-list entry.
enum Pending {
    /// Run the candidate through the checks.
    Evaluate(CandidateId),
    /// Already refused by the expander; only the verdict is left to record.
    Rejected {
        id: CandidateId,
        reason: RejectReason,
        detail: String,
    },
}

/// Candidates of one tree, indexed by [`CandidateId`].
struct Arena {
    candidates: Vec<CandidateFile>,
}

impl Arena {
    fn get(&self, id: CandidateId) -> &CandidateFile {
        &self.candidates[id.index()]
    }

    fn next_id(&self) -> CandidateId {
        CandidateId(self.candidates.len())
    }

    fn push(&mut self, candidate: CandidateFile) {
        self.candidates.push(candidate);
    }

    /// Logical path of the archive a candidate came from.
    fn parent_path(&self, candidate: &CandidateFile) -> Option<PathBuf> {
        match &candidate.origin {
            Origin::TopLevel => None,
            Origin::Member { parent, .. } => Some(self.get(*parent).logical_path.clone()),
        }
    }
}

/// Admits one top-level path and everything nested inside it.
///
/// Verdicts are returned in discovery order and also passed to `callback`
/// as they are decided.
///
/// # Errors
///
/// Returns an error only for scratch storage faults; every problem with the
/// input itself becomes a rejected verdict.
pub fn admit_tree(
    ctx: &RunContext,
    tree: usize,
    root: &Path,
    callback: &dyn VerdictCallback,
) -> Result<Vec<Verdict>> {
    let span = tracing::info_span!("tree", tree, root = %root.display());
    let _entered = span.enter();

    let declared = fs::metadata(root).map_or(0, |meta| meta.len());
    let mut arena = Arena {
        candidates: vec![CandidateFile::top_level(CandidateId(0), root, declared)],
    };
    let mut queue = VecDeque::from([Pending::Evaluate(CandidateId(0))]);
    let mut expander = ZipExpander::new();
    let mut verdicts = Vec::new();
    // Members still waiting for a verdict, per expanded archive
    let mut outstanding: HashMap<CandidateId, usize> = HashMap::new();

    while let Some(next) = queue.pop_front() {
        let discovered = arena.candidates.len();
        let (id, verdict) = match next {
            Pending::Evaluate(id) => (
                id,
                evaluate(ctx, tree, id, &mut arena, &mut queue, &mut expander)?,
            ),
            Pending::Rejected { id, reason, detail } => {
                let candidate = arena.get(id);
                let parent = arena.parent_path(candidate);
                let verdict = Verdict::rejected(
                    candidate,
                    parent.as_deref(),
                    reason,
                    detail,
                    None,
                    Stage::Discovered,
                );
                (id, verdict)
            }
        };

        let members = arena.candidates.len() - discovered;
        if members > 0 {
            outstanding.insert(id, members);
        } else if verdict
            .detected
            .is_some_and(|detected| detected.capabilities().can_expand)
        {
            ctx.release_archive(tree, id);
        }
        release_member(ctx, tree, arena.get(id), &mut outstanding);

        log_verdict(&verdict);
        callback.on_verdict(&verdict);
        verdicts.push(verdict);
    }

    ctx.release_tree(tree);
    Ok(verdicts)
}

/// Drops a member's extracted file, and its archive's directory when this
/// was the last member still pending.
fn release_member(
    ctx: &RunContext,
    tree: usize,
    candidate: &CandidateFile,
    outstanding: &mut HashMap<CandidateId, usize>,
) {
    let Origin::Member { parent, .. } = &candidate.origin else {
        return;
    };

    if !candidate.path.as_os_str().is_empty() {
        ctx.release_member(&candidate.path);
    }

    if let Some(pending) = outstanding.get_mut(parent) {
        *pending -= 1;
        if *pending == 0 {
            outstanding.remove(parent);
            ctx.release_archive(tree, *parent);
        }
    }
}

fn evaluate(
    ctx: &RunContext,
    tree: usize,
    id: CandidateId,
    arena: &mut Arena,
    queue: &mut VecDeque<Pending>,
    expander: &mut dyn ArchiveExpander,
) -> Result<Verdict> {
    let config = ctx.config();
    let candidate = arena.get(id).clone();
    let parent = arena.parent_path(&candidate);
    let parent = parent.as_deref();
    let reject = |reason, detail: String, detected, stage| {
        Verdict::rejected(&candidate, parent, reason, detail, detected, stage)
    };

    // Size guard, before any content is read
    let size = match fs::metadata(&candidate.path) {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => {
            return Ok(reject(
                RejectReason::NotFound,
                "not a regular file".to_string(),
                None,
                Stage::Discovered,
            ));
        }
        Err(e) => {
            return Ok(reject(
                RejectReason::NotFound,
                format!("cannot stat path: {e}"),
                None,
                Stage::Discovered,
            ));
        }
    };
    if let Err(limit) = check_file_size(size, config) {
        return Ok(reject(
            RejectReason::TooLarge,
            limit.to_string(),
            None,
            Stage::Discovered,
        ));
    }
    tracing::debug!(path = %candidate.logical_path.display(), size, "size checked");

    let detected = match detect_path(&candidate.path, config.sniff_prefix_len) {
        Ok(Some(detected)) => detected,
        Ok(None) => {
            return Ok(reject(
                RejectReason::UnknownType,
                "no known signature matched".to_string(),
                None,
                Stage::SizeChecked,
            ));
        }
        Err(e) => {
            return Ok(reject(
                RejectReason::Unreadable,
                format!("cannot read leading bytes: {e}"),
                None,
                Stage::SizeChecked,
            ));
        }
    };
    tracing::debug!(
        path = %candidate.logical_path.display(),
        content_type = %detected.content_type,
        mime = detected.mime,
        "type detected"
    );

    let status = protection::probe(&candidate, &detected, config);
    if let Some((reason, detail)) = status.rejection(config.probe_error_policy) {
        return Ok(reject(reason, detail, Some(detected), Stage::TypeDetected));
    }
    tracing::debug!(path = %candidate.logical_path.display(), "protection checked");

    if detected.capabilities().can_expand {
        let dest = ctx.archive_scratch(tree, candidate.id)?;
        return match expander.expand(&candidate, &dest, config)? {
            Expansion::Members(members) => {
                tracing::debug!(
                    path = %candidate.logical_path.display(),
                    format = expander.format_name(),
                    members = members.len(),
                    "archive expanded"
                );
                enqueue_members(&candidate, members, arena, queue);
                Ok(Verdict::admitted(
                    &candidate,
                    parent,
                    detected,
                    None,
                    Stage::Expanded,
                ))
            }
            Expansion::Corrupt { detail } => Ok(reject(
                RejectReason::CorruptArchive,
                detail,
                Some(detected),
                Stage::ProtectionChecked,
            )),
            Expansion::OverBudget { detail } => Ok(reject(
                RejectReason::TooLarge,
                detail,
                Some(detected),
                Stage::ProtectionChecked,
            )),
        };
    }

    match reader::sample(&candidate, &detected, config) {
        Ok(sample) => Ok(Verdict::admitted(
            &candidate,
            parent,
            detected,
            Some(sample),
            Stage::ContentChecked,
        )),
        Err(unreadable) => Ok(reject(
            RejectReason::Unreadable,
            unreadable.reason,
            Some(detected),
            Stage::ProtectionChecked,
        )),
    }
}

/// Registers expanded members in the arena and queues them in archive order.
fn enqueue_members(
    archive: &CandidateFile,
    members: Vec<MemberOutcome>,
    arena: &mut Arena,
    queue: &mut VecDeque<Pending>,
) {
    for member in members {
        let id = arena.next_id();
        match member {
            MemberOutcome::Extracted {
                name,
                path,
                declared_size,
            } => {
                arena.push(CandidateFile::member(id, archive, &name, path, declared_size));
                queue.push_back(Pending::Evaluate(id));
            }
            MemberOutcome::Rejected {
                name,
                declared_size,
                reason,
                detail,
            } => {
                // Never extracted, so there is no on-disk path
                arena.push(CandidateFile::member(
                    id,
                    archive,
                    &name,
                    PathBuf::new(),
                    declared_size,
                ));
                queue.push_back(Pending::Rejected { id, reason, detail });
            }
        }
    }
}

fn log_verdict(verdict: &Verdict) {
    match verdict.reason {
        None => tracing::info!(
            path = %verdict.path.display(),
            depth = verdict.depth,
            content_type = ?verdict.detected.map(|d| d.content_type.tag()),
            "admitted"
        ),
        Some(reason) => tracing::warn!(
            path = %verdict.path.display(),
            depth = verdict.depth,
            reason = reason.code(),
            detail = verdict.detail.as_deref().unwrap_or_default(),
            "rejected"
        ),
    }
}
