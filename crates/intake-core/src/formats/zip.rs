//! ZIP archive expansion.
//!
//! Members are gated in a fixed order before any byte is written: link
//! check, name validation, nesting depth, declared size, member count.
//! Extraction itself is capped by the single-file limit and the archive's
//! remaining expansion budget, so a header that lies about its size cannot
//! push more bytes to disk than the policy allows.

use std::fs;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::Path;

use zip::ZipArchive;

use crate::AdmissionConfig;
use crate::AdmitError;
use crate::RejectReason;
use crate::Result;
use crate::copy::Bounded;
use crate::copy::CopyBuffer;
use crate::copy::CopyError;
use crate::copy::copy_bounded;
use crate::formats::traits::ArchiveExpander;
use crate::formats::traits::Expansion;
use crate::formats::traits::MemberOutcome;
use crate::security::ExpansionBudget;
use crate::security::MemberPath;
use crate::security::UnsafeMemberPath;
use crate::security::check_file_size;
use crate::security::path::is_symlink_mode;
use crate::security::size::sum_declared;
use crate::types::CandidateFile;

/// ZIP archive expander.
///
/// Holds a copy buffer that is reused across archives.
#[derive(Debug, Default)]
pub struct ZipExpander {
    buffer: CopyBuffer,
}

impl ZipExpander {
    /// Creates a new ZIP expander.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArchiveExpander for ZipExpander {
    fn expand(
        &mut self,
        archive: &CandidateFile,
        dest: &Path,
        config: &AdmissionConfig,
    ) -> Result<Expansion> {
        let (file, archive_size) = match open_sized(&archive.path) {
            Ok(opened) => opened,
            Err(e) => {
                return Ok(Expansion::Corrupt {
                    detail: format!("cannot open archive: {e}"),
                });
            }
        };

        let mut zip = match ZipArchive::new(BufReader::new(file)) {
            Ok(zip) => zip,
            Err(e) => {
                return Ok(Expansion::Corrupt {
                    detail: format!("unreadable central directory: {e}"),
                });
            }
        };

        let mut budget = ExpansionBudget::for_archive(archive_size, config);

        let sizes = match declared_sizes(&mut zip) {
            Ok(sizes) => sizes,
            Err(e) => {
                return Ok(Expansion::Corrupt {
                    detail: format!("unreadable member header: {e}"),
                });
            }
        };
        if let Err(limit) = sum_declared(sizes).and_then(|total| budget.check_declared_total(total))
        {
            return Ok(Expansion::OverBudget {
                detail: limit.to_string(),
            });
        }

        let depth = archive.depth + 1;
        let mut outcomes = Vec::new();

        for i in 0..zip.len() {
            let mut entry = match zip.by_index(i) {
                Ok(entry) => entry,
                Err(e) => {
                    discard(dest);
                    return Ok(Expansion::Corrupt {
                        detail: format!("unreadable member #{i}: {e}"),
                    });
                }
            };

            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_string();
            let declared_size = entry.size();

            if entry.unix_mode().is_some_and(is_symlink_mode) {
                outcomes.push(rejected(
                    name,
                    declared_size,
                    RejectReason::PathTraversalUnsafe,
                    UnsafeMemberPath::Symlink.to_string(),
                ));
                continue;
            }

            if let Err(unsafe_path) = MemberPath::validate(&name) {
                outcomes.push(rejected(
                    name,
                    declared_size,
                    RejectReason::PathTraversalUnsafe,
                    unsafe_path.to_string(),
                ));
                continue;
            }

            if depth > config.max_archive_depth {
                outcomes.push(rejected(
                    name,
                    declared_size,
                    RejectReason::DepthExceeded,
                    format!(
                        "member depth {depth} exceeds limit {}",
                        config.max_archive_depth
                    ),
                ));
                continue;
            }

            // A member refused for its size never takes a member slot
            if let Err(limit) =
                check_file_size(declared_size, config).and_then(|()| budget.admit_member())
            {
                outcomes.push(rejected(
                    name,
                    declared_size,
                    RejectReason::TooLarge,
                    limit.to_string(),
                ));
                continue;
            }

            // The archive's name only lives in the logical path; on disk a
            // member is its index, so no crafted name reaches the filesystem.
            let target = dest.join(i.to_string());
            let mut out = File::create(&target).map_err(|source| AdmitError::Scratch {
                path: target.clone(),
                source,
            })?;

            let limit = config.max_file_size.min(budget.remaining());
            let copied = copy_bounded(&mut entry, &mut out, &mut self.buffer, limit);
            drop(out);

            match copied {
                Ok(Bounded::Complete(bytes)) => {
                    if let Err(limit) = budget.record(bytes) {
                        discard(dest);
                        return Ok(Expansion::OverBudget {
                            detail: limit.to_string(),
                        });
                    }
                    tracing::debug!(member = %name, bytes, "member extracted");
                    outcomes.push(MemberOutcome::Extracted {
                        name,
                        path: target,
                        declared_size,
                    });
                }
                Ok(Bounded::LimitReached) if config.max_file_size < budget.remaining() => {
                    let _ = fs::remove_file(&target);
                    outcomes.push(rejected(
                        name,
                        declared_size,
                        RejectReason::TooLarge,
                        format!(
                            "member expanded past {} bytes (header declared {declared_size})",
                            config.max_file_size
                        ),
                    ));
                }
                Ok(Bounded::LimitReached) => {
                    discard(dest);
                    return Ok(Expansion::OverBudget {
                        detail: format!(
                            "size limit exceeded: archive expansion passed its budget of {} bytes",
                            budget.budget()
                        ),
                    });
                }
                Err(CopyError::Read(e)) => {
                    discard(dest);
                    return Ok(Expansion::Corrupt {
                        detail: format!("member '{name}' failed to decompress: {e}"),
                    });
                }
                Err(CopyError::Write(source)) => {
                    return Err(AdmitError::Scratch {
                        path: target,
                        source,
                    });
                }
            }
        }

        Ok(Expansion::Members(outcomes))
    }

    fn format_name(&self) -> &'static str {
        "zip"
    }
}

fn open_sized(path: &Path) -> io::Result<(File, u64)> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    Ok((file, len))
}

/// Uncompressed sizes of all file members, read from the central directory
/// without decompressing anything.
fn declared_sizes<R: io::Read + io::Seek>(
    zip: &mut ZipArchive<R>,
) -> zip::result::ZipResult<Vec<u64>> {
    let mut sizes = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let entry = zip.by_index_raw(i)?;
        if !entry.is_dir() {
            sizes.push(entry.size());
        }
    }
    Ok(sizes)
}

fn rejected(name: String, declared_size: u64, reason: RejectReason, detail: String) -> MemberOutcome {
    MemberOutcome::Rejected {
        name,
        declared_size,
        reason,
        detail,
    }
}

/// Drops everything extracted from an archive that was rejected as a whole.
fn discard(dest: &Path) {
    if let Err(e) = fs::remove_dir_all(dest) {
        tracing::debug!(dest = %dest.display(), error = %e, "failed to discard partial extraction");
    }
}
