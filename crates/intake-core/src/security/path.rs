//! Archive member path validation.
//!
//! Member names come straight from archive headers and are attacker
//! controlled. They are validated as raw strings, before any `Path`
//! interpretation, so that both `/` and `\` separators are caught on every
//! platform.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;

/// Why a member name is unsafe to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsafeMemberPath {
    /// Name contains a NUL byte.
    NullByte,
    /// Name is rooted (`/x`, `\x`) or carries a drive or UNC prefix (`C:`).
    Absolute,
    /// Name contains a `..` segment.
    ParentTraversal,
    /// Name has no normal component (`""`, `"."`, `"./"`).
    Empty,
    /// Entry is a symbolic link.
    Symlink,
}

impl fmt::Display for UnsafeMemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::NullByte => "member name contains a null byte",
            Self::Absolute => "member name is an absolute path",
            Self::ParentTraversal => "member name contains a parent-directory segment",
            Self::Empty => "member name is empty",
            Self::Symlink => "member is a symbolic link",
        };
        f.write_str(msg)
    }
}

/// A validated, normalized, relative member path.
///
/// Can only be constructed through [`MemberPath::validate`]. Joining it onto
/// a directory always stays inside that directory.
///
/// # Examples
///
/// ```
/// use intake_core::security::MemberPath;
/// use intake_core::security::UnsafeMemberPath;
///
/// let safe = MemberPath::validate("docs/./readme.txt").unwrap();
/// assert_eq!(safe.as_path(), std::path::Path::new("docs/readme.txt"));
///
/// assert_eq!(
///     MemberPath::validate("../../etc/passwd"),
///     Err(UnsafeMemberPath::ParentTraversal)
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberPath(PathBuf);

impl MemberPath {
    /// Validates and normalizes a raw member name.
    ///
    /// # Validation Steps
    ///
    /// 1. Reject NUL bytes
    /// 2. Reject rooted names and drive/UNC prefixes
    /// 3. Reject any `..` segment, wherever it appears
    /// 4. Drop `.` and empty segments
    /// 5. Reject names with no remaining segment
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate(raw: &str) -> Result<Self, UnsafeMemberPath> {
        if raw.contains('\0') {
            return Err(UnsafeMemberPath::NullByte);
        }

        if raw.starts_with('/') || raw.starts_with('\\') || has_drive_prefix(raw) {
            return Err(UnsafeMemberPath::Absolute);
        }

        let mut normalized = PathBuf::new();
        for segment in raw.split(['/', '\\']) {
            match segment {
                ".." => return Err(UnsafeMemberPath::ParentTraversal),
                "" | "." => {}
                normal => {
                    if has_drive_prefix(normal) {
                        return Err(UnsafeMemberPath::Absolute);
                    }
                    normalized.push(normal);
                }
            }
        }

        if normalized.as_os_str().is_empty() {
            return Err(UnsafeMemberPath::Empty);
        }

        Ok(Self(normalized))
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Joins this path onto `root`.
    #[must_use]
    pub fn resolve_in(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }
}

/// `C:`, `c:foo`, `C:\x`: anything a Windows path parser treats as a prefix.
fn has_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Returns `true` when a Unix mode describes a symbolic link.
#[must_use]
pub const fn is_symlink_mode(mode: u32) -> bool {
    const S_IFMT: u32 = 0o170_000;
    const S_IFLNK: u32 = 0o120_000;
    mode & S_IFMT == S_IFLNK
}
