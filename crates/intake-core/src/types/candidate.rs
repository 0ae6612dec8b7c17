//! Candidate files awaiting a verdict.

use std::path::Path;
use std::path::PathBuf;

/// Index of a candidate inside the arena of one input tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateId(pub(crate) usize);

impl CandidateId {
    /// Arena slot of this candidate.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Where a candidate came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Supplied by the caller.
    TopLevel,
    /// Extracted from an archive.
    Member {
        /// Candidate id of the containing archive.
        parent: CandidateId,
        /// Member name exactly as stored in the archive.
        member: String,
    },
}

/// A file (top-level or archive-extracted) awaiting a verdict.
///
/// Immutable once created. `path` is where the bytes live right now (the
/// scratch area for members); `logical_path` is how the file is named in
/// reports and stays meaningful after the scratch area is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Arena slot.
    pub id: CandidateId,
    /// On-disk location of the content.
    pub path: PathBuf,
    /// Report name, e.g. `bundle.zip!/docs/readme.txt`.
    pub logical_path: PathBuf,
    /// Size claimed before reading: file metadata for top-level inputs,
    /// the header's uncompressed size for members. The bytes on disk are
    /// measured again by every stage that depends on them.
    pub declared_size: u64,
    /// Archive nesting depth; top-level inputs are 0.
    pub depth: usize,
    /// Provenance.
    pub origin: Origin,
}

/// Separator between an archive's logical path and a member name.
pub const MEMBER_SEPARATOR: &str = "!/";

impl CandidateFile {
    /// Creates a top-level candidate. `declared_size` is 0 for paths that
    /// could not be stat'ed.
    #[must_use]
    pub fn top_level(id: CandidateId, path: &Path, declared_size: u64) -> Self {
        Self {
            id,
            path: path.to_path_buf(),
            logical_path: path.to_path_buf(),
            declared_size,
            depth: 0,
            origin: Origin::TopLevel,
        }
    }

    /// Creates a member candidate one level below `parent`.
    #[must_use]
    pub fn member(
        id: CandidateId,
        parent: &Self,
        member: &str,
        path: PathBuf,
        declared_size: u64,
    ) -> Self {
        let logical = format!(
            "{}{MEMBER_SEPARATOR}{member}",
            parent.logical_path.display()
        );
        Self {
            id,
            path,
            logical_path: PathBuf::from(logical),
            declared_size,
            depth: parent.depth + 1,
            origin: Origin::Member {
                parent: parent.id,
                member: member.to_string(),
            },
        }
    }

    /// Returns `true` for members extracted from an archive.
    #[must_use]
    pub const fn is_member(&self) -> bool {
        matches!(self.origin, Origin::Member { .. })
    }
}
