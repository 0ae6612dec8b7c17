//! Zip encryption and integrity probe.

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::Path;

use zip::ZipArchive;

use super::ProtectionStatus;
use crate::AdmissionConfig;
use crate::copy::Bounded;
use crate::copy::CopyBuffer;
use crate::copy::CopyError;
use crate::copy::copy_bounded;

/// Probes a zip archive for encrypted members and broken entries.
///
/// Encryption flags are read from the central directory first, so an
/// encrypted archive is reported as protected even when some of its other
/// members are damaged. Unencrypted members are then decompressed into
/// [`io::sink`] to verify their checksums; nothing touches disk. Members over
/// the single-file limit are skipped here and rejected by the expander, and
/// verification stops once the archive's expansion budget is spent.
pub fn probe(path: &Path, config: &AdmissionConfig) -> ProtectionStatus {
    let opened = File::open(path).and_then(|file| {
        let len = file.metadata()?.len();
        Ok((file, len))
    });
    let (file, archive_size) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            return ProtectionStatus::Indeterminate {
                reason: format!("cannot open archive: {e}"),
            };
        }
    };

    let mut archive = match ZipArchive::new(BufReader::new(file)) {
        Ok(archive) => archive,
        Err(e) => {
            return ProtectionStatus::Corrupt {
                reason: format!("unreadable central directory: {e}"),
            };
        }
    };

    for i in 0..archive.len() {
        match archive.by_index_raw(i) {
            Ok(entry) if entry.encrypted() => {
                return ProtectionStatus::Protected {
                    reason: format!("member '{}' is encrypted", entry.name()),
                };
            }
            Ok(_) => {}
            Err(e) => {
                return ProtectionStatus::Corrupt {
                    reason: format!("unreadable member header #{i}: {e}"),
                };
            }
        }
    }

    verify_checksums(&mut archive, archive_size, config)
}

fn verify_checksums<R: io::Read + io::Seek>(
    archive: &mut ZipArchive<R>,
    archive_size: u64,
    config: &AdmissionConfig,
) -> ProtectionStatus {
    let mut buffer = CopyBuffer::new();
    let mut remaining = config.expansion_budget(archive_size);

    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                return ProtectionStatus::Corrupt {
                    reason: format!("unreadable member #{i}: {e}"),
                };
            }
        };

        if entry.is_dir() || entry.size() > config.max_file_size {
            continue;
        }
        if entry.size() > remaining {
            break;
        }

        let limit = config.max_file_size.min(remaining);
        match copy_bounded(&mut entry, &mut io::sink(), &mut buffer, limit) {
            Ok(Bounded::Complete(bytes)) => remaining -= bytes,
            // Lying header; the expander's actual-bytes check rejects it.
            Ok(Bounded::LimitReached) => break,
            Err(CopyError::Read(e)) => {
                return ProtectionStatus::Corrupt {
                    reason: format!("member '{}' failed verification: {e}", entry.name()),
                };
            }
            Err(CopyError::Write(e)) => {
                return ProtectionStatus::Indeterminate {
                    reason: format!("verification aborted: {e}"),
                };
            }
        }
    }

    ProtectionStatus::Unprotected
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::field_reassign_with_default)]
mod tests {
    use super::*;
    use crate::test_utils::ZipTestBuilder;
    use crate::test_utils::corrupt_first_member;
    use crate::test_utils::create_test_zip;
    use crate::test_utils::mark_encrypted;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn probe_bytes(data: &[u8], config: &AdmissionConfig) -> ProtectionStatus {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        probe(file.path(), config)
    }

    #[test]
    fn test_plain_zip_is_unprotected() {
        let data = create_test_zip(&[("a.txt", b"alpha"), ("dir/b.txt", b"beta")]);
        assert_eq!(
            probe_bytes(&data, &AdmissionConfig::default()),
            ProtectionStatus::Unprotected
        );
    }

    #[test]
    fn test_encrypted_member_is_protected() {
        let data = mark_encrypted(create_test_zip(&[("secret.txt", b"hunter2")]));
        let status = probe_bytes(&data, &AdmissionConfig::default());
        assert!(status.is_protected());
        assert!(status.reason().unwrap().contains("secret.txt"));
    }

    #[test]
    fn test_checksum_mismatch_is_corrupt() {
        let data = corrupt_first_member(create_test_zip(&[("a.txt", b"payload bytes")]));
        assert!(matches!(
            probe_bytes(&data, &AdmissionConfig::default()),
            ProtectionStatus::Corrupt { .. }
        ));
    }

    #[test]
    fn test_truncated_archive_is_corrupt() {
        let data = create_test_zip(&[("a.txt", b"alpha")]);
        let truncated = &data[..data.len() / 2];
        assert!(matches!(
            probe_bytes(truncated, &AdmissionConfig::default()),
            ProtectionStatus::Corrupt { .. }
        ));
    }

    #[test]
    fn test_oversize_member_is_skipped() {
        let mut config = AdmissionConfig::default();
        config.max_file_size = 4;
        let data = ZipTestBuilder::new()
            .add_file("big.txt", b"more than four bytes")
            .add_file("ok.txt", b"tiny")
            .build();
        assert_eq!(probe_bytes(&data, &config), ProtectionStatus::Unprotected);
    }

    #[test]
    fn test_missing_archive_is_indeterminate() {
        let status = probe(
            Path::new("/nonexistent/intake/a.zip"),
            &AdmissionConfig::default(),
        );
        assert!(matches!(status, ProtectionStatus::Indeterminate { .. }));
    }
}
