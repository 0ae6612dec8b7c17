//! Hostile-input tests: traversal names, links, bombs and broken archives.

#![allow(clippy::unwrap_used, clippy::field_reassign_with_default)]

use intake_core::AdmissionConfig;
use intake_core::BatchReport;
use intake_core::Intake;
use intake_core::RejectReason;
use intake_core::test_utils::ZipTestBuilder;
use intake_core::test_utils::corrupt_first_member;
use intake_core::test_utils::create_test_zip;
use intake_core::test_utils::mark_encrypted;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Admits `zip` with a dedicated scratch root, which is returned so callers
/// can check nothing was left behind.
fn admit_zip(zip: &[u8], config: AdmissionConfig) -> (TempDir, BatchReport) {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("input.zip");
    fs::write(&input, zip).unwrap();
    let scratch = temp.path().join("scratch");
    fs::create_dir(&scratch).unwrap();

    let report = Intake::new(config)
        .with_scratch_root(&scratch)
        .admit(&[&input])
        .unwrap();
    (temp, report)
}

fn scratch_is_empty(temp: &TempDir) -> bool {
    fs::read_dir(temp.path().join("scratch")).unwrap().count() == 0
}

#[test]
fn test_traversal_variants_rejected() {
    let names = [
        "../escape.txt",
        "a/../../escape.txt",
        "a\\..\\..\\escape.txt",
        "/etc/passwd",
        "\\windows\\system32\\drivers",
        "C:\\boot.ini",
        "c:relative.txt",
    ];
    let entries: Vec<(&str, &[u8])> = names.iter().map(|n| (*n, b"x".as_slice())).collect();
    let (temp, report) = admit_zip(&create_test_zip(&entries), AdmissionConfig::default());

    assert_eq!(report.verdicts.len(), names.len() + 1);
    for verdict in &report.verdicts[1..] {
        assert_eq!(
            verdict.reason,
            Some(RejectReason::PathTraversalUnsafe),
            "{}",
            verdict.path.display()
        );
    }
    assert!(!temp.path().join("escape.txt").exists());
    assert!(scratch_is_empty(&temp));
}

#[cfg(unix)]
#[test]
fn test_symlink_member_rejected() {
    let zip = ZipTestBuilder::new()
        .add_symlink("link", "/etc/passwd")
        .add_file("plain.txt", b"plain")
        .build();
    let (_temp, report) = admit_zip(&zip, AdmissionConfig::default());

    assert_eq!(
        report.verdicts[1].reason,
        Some(RejectReason::PathTraversalUnsafe)
    );
    assert!(report.verdicts[2].is_admitted());
}

#[test]
fn test_compression_bomb_rejected() {
    let zeros = vec![0u8; 4 * 1024 * 1024];
    let zip = ZipTestBuilder::new()
        .add_deflated("zeros.bin", &zeros)
        .build();
    assert!(zip.len() < 64 * 1024, "fixture should compress well");

    let (temp, report) = admit_zip(&zip, AdmissionConfig::default());

    assert_eq!(report.verdicts.len(), 1);
    assert_eq!(report.verdicts[0].reason, Some(RejectReason::TooLarge));
    assert!(scratch_is_empty(&temp));
}

#[test]
fn test_member_above_file_limit() {
    let big = vec![b'a'; 1500];
    let zip = ZipTestBuilder::new()
        .add_deflated("big.txt", &big)
        .add_file("small.txt", b"ok")
        .build();
    assert!(zip.len() < 1024);

    // Both the archive and its expansion fit; only the member limit bites
    let mut config = AdmissionConfig::default();
    config.max_file_size = 1024;
    let (_temp, report) = admit_zip(&zip, config);

    assert_eq!(report.verdicts.len(), 3);
    assert!(report.verdicts[0].is_admitted());
    assert_eq!(report.verdicts[1].reason, Some(RejectReason::TooLarge));
    assert!(report.verdicts[2].is_admitted());
}

#[test]
fn test_encrypted_zip_protected() {
    let zip = mark_encrypted(create_test_zip(&[("secret.txt", b"secret")]));
    let (_temp, report) = admit_zip(&zip, AdmissionConfig::default());

    assert_eq!(report.verdicts.len(), 1);
    assert_eq!(report.verdicts[0].reason, Some(RejectReason::Protected));
}

#[test]
fn test_checksum_mismatch_corrupt() {
    let zip = corrupt_first_member(create_test_zip(&[("data.txt", b"checksummed")]));
    let (temp, report) = admit_zip(&zip, AdmissionConfig::default());

    assert_eq!(report.verdicts.len(), 1);
    assert_eq!(
        report.verdicts[0].reason,
        Some(RejectReason::CorruptArchive)
    );
    assert!(scratch_is_empty(&temp));
}

#[test]
fn test_truncated_zip_corrupt() {
    let zip = create_test_zip(&[("a.txt", b"alpha"), ("b.txt", b"bravo")]);
    let truncated = &zip[..zip.len() / 2];
    let (_temp, report) = admit_zip(truncated, AdmissionConfig::default());

    assert_eq!(
        report.verdicts[0].reason,
        Some(RejectReason::CorruptArchive)
    );
}

#[test]
fn test_strict_preset_stops_below_first_level() {
    let inner = create_test_zip(&[("inner.txt", b"inner")]);
    let zip = create_test_zip(&[("inner.zip", inner.as_slice()), ("top.txt", b"top")]);
    let (_temp, report) = admit_zip(&zip, AdmissionConfig::strict());

    let inner_verdict = report
        .verdicts
        .iter()
        .find(|v| v.path.ends_with(Path::new("input.zip!/inner.zip")))
        .unwrap();
    assert!(inner_verdict.is_admitted());
    // The nested member sits at depth 2, beyond the strict limit of 1
    let nested = report
        .verdicts
        .iter()
        .find(|v| v.path.to_string_lossy().ends_with("inner.txt"))
        .unwrap();
    assert_eq!(nested.reason, Some(RejectReason::DepthExceeded));
}
