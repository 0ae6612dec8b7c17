//! Integration tests for intake-core.
//!
//! These tests run whole admission batches against real files on disk.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::field_reassign_with_default
)]

use intake_core::AdmissionConfig;
use intake_core::ContentType;
use intake_core::Intake;
use intake_core::Outcome;
use intake_core::ProbeErrorPolicy;
use intake_core::RejectReason;
use intake_core::SpreadsheetKind;
use intake_core::Stage;
use intake_core::admit_batch;
use intake_core::admit_file;
use intake_core::test_utils::create_test_pdf;
use intake_core::test_utils::create_test_xlsx;
use intake_core::test_utils::create_test_zip;
use intake_core::test_utils::encrypted_pdf_stub;
use intake_core::test_utils::nested_zip;
use std::fs;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    path
}

#[test]
fn test_small_text_file_admitted_in_full() {
    let temp = TempDir::new().unwrap();
    let body = "abcdefghij".repeat(100);
    let path = write(temp.path(), "kilobyte.txt", body.as_bytes());

    let mut config = AdmissionConfig::default();
    config.max_sample_length = 4096;
    let report = admit_file(&path, &config).unwrap();

    assert_eq!(report.verdicts.len(), 1);
    let verdict = &report.verdicts[0];
    assert_eq!(verdict.outcome, Outcome::Admitted);
    assert_eq!(verdict.detected.unwrap().content_type, ContentType::Text);
    let sample = verdict.sample.as_ref().unwrap();
    assert_eq!(sample.text, body);
    assert!(!sample.truncated);
}

#[test]
fn test_default_sample_is_bounded() {
    let temp = TempDir::new().unwrap();
    let path = write(temp.path(), "long.txt", "word ".repeat(1000).as_bytes());

    let report = admit_file(&path, &AdmissionConfig::default()).unwrap();
    let sample = report.verdicts[0].sample.as_ref().unwrap();
    assert_eq!(sample.text.len(), 100);
    assert!(sample.truncated);
}

#[test]
fn test_oversize_file_rejected_before_reading() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("huge.bin");
    // Sparse: 50 MiB of holes, no bytes written
    File::create(&path)
        .unwrap()
        .set_len(50 * 1024 * 1024)
        .unwrap();

    let report = admit_file(&path, &AdmissionConfig::default()).unwrap();
    let verdict = &report.verdicts[0];
    assert_eq!(verdict.reason, Some(RejectReason::TooLarge));
    assert_eq!(verdict.stage, Stage::Discovered);
    assert!(verdict.detected.is_none());
}

#[test]
fn test_traversal_member_never_extracted() {
    let temp = TempDir::new().unwrap();
    let path = write(
        temp.path(),
        "evil.zip",
        &create_test_zip(&[("../../etc/passwd", b"root:x:0:0"), ("ok.txt", b"fine")]),
    );
    let scratch = TempDir::new().unwrap();

    let report = Intake::new(AdmissionConfig::default())
        .with_scratch_root(scratch.path())
        .admit(&[&path])
        .unwrap();

    assert_eq!(report.verdicts.len(), 3);
    assert!(report.verdicts[0].is_admitted());
    let evil = &report.verdicts[1];
    assert_eq!(evil.reason, Some(RejectReason::PathTraversalUnsafe));
    assert!(evil.path.ends_with("evil.zip!/../../etc/passwd"));
    assert!(report.verdicts[2].is_admitted());

    // Nothing escaped next to the scratch root, and the run cleaned up
    assert!(!scratch.path().join("etc").exists());
    assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[test]
fn test_encrypted_pdf_protected() {
    let temp = TempDir::new().unwrap();
    let path = write(temp.path(), "locked.pdf", &encrypted_pdf_stub());

    let report = admit_file(&path, &AdmissionConfig::default()).unwrap();
    let verdict = &report.verdicts[0];
    assert_eq!(verdict.reason, Some(RejectReason::Protected));
    assert_eq!(verdict.stage, Stage::TypeDetected);
    assert!(verdict.sample.is_none());
}

#[test]
fn test_plain_pdf_sampled() {
    let temp = TempDir::new().unwrap();
    let path = write(temp.path(), "doc.pdf", &create_test_pdf("Quarterly figures"));

    let report = admit_file(&path, &AdmissionConfig::default()).unwrap();
    let verdict = &report.verdicts[0];
    assert!(verdict.is_admitted(), "{verdict:?}");
    assert_eq!(verdict.detected.unwrap().content_type, ContentType::Pdf);
    assert!(
        verdict
            .sample
            .as_ref()
            .unwrap()
            .text
            .contains("Quarterly figures")
    );
}

#[test]
fn test_workbook_sampled_not_expanded() {
    let temp = TempDir::new().unwrap();
    let path = write(
        temp.path(),
        "data.bin",
        &create_test_xlsx(&[&["city", "pop"], &["Oslo", "709000"]]),
    );

    let report = admit_file(&path, &AdmissionConfig::default()).unwrap();
    assert_eq!(report.verdicts.len(), 1);
    let verdict = &report.verdicts[0];
    assert_eq!(
        verdict.detected.unwrap().content_type,
        ContentType::Spreadsheet(SpreadsheetKind::Xlsx)
    );
    assert!(
        verdict
            .sample
            .as_ref()
            .unwrap()
            .text
            .starts_with("city\tpop")
    );
}

#[test]
fn test_nested_zip_depth_limit() {
    let temp = TempDir::new().unwrap();
    let path = write(temp.path(), "nest.zip", &nested_zip(5, b"deep payload"));

    let mut config = AdmissionConfig::default();
    config.max_archive_depth = 3;
    let report = admit_file(&path, &config).unwrap();

    let depths: Vec<_> = report.verdicts.iter().map(|v| v.depth).collect();
    assert_eq!(depths, [0, 1, 2, 3, 4]);
    assert!(report.verdicts[..4].iter().all(|v| v.is_admitted()));
    assert_eq!(
        report.verdicts[4].reason,
        Some(RejectReason::DepthExceeded)
    );
    // The payload lies below the refused archive and is never discovered
    assert!(
        report
            .verdicts
            .iter()
            .all(|v| !v.path.to_string_lossy().ends_with("payload.txt"))
    );
}

#[test]
fn test_nested_zip_within_limit_fully_admitted() {
    let temp = TempDir::new().unwrap();
    let path = write(temp.path(), "nest.zip", &nested_zip(3, b"deep payload"));

    let report = admit_file(&path, &AdmissionConfig::default()).unwrap();
    assert!(report.all_admitted());
    let last = report.verdicts.last().unwrap();
    assert_eq!(last.depth, 3);
    assert_eq!(last.sample.as_ref().unwrap().text, "deep payload");
}

#[test]
fn test_unknown_type_rejected() {
    let temp = TempDir::new().unwrap();
    let path = write(temp.path(), "noise.dat", &[0x00, 0x9f, 0x92, 0x96, 0xff, 0x00, 0x13]);

    let report = admit_file(&path, &AdmissionConfig::default()).unwrap();
    assert_eq!(report.verdicts[0].reason, Some(RejectReason::UnknownType));
}

#[test]
fn test_recognised_type_without_reader_unreadable() {
    let temp = TempDir::new().unwrap();
    let png = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01\x00\x00\x00\x01";
    let path = write(temp.path(), "image.txt", png);

    let report = admit_file(&path, &AdmissionConfig::default()).unwrap();
    let verdict = &report.verdicts[0];
    assert_eq!(verdict.detected.unwrap().content_type, ContentType::Other);
    assert_eq!(verdict.reason, Some(RejectReason::Unreadable));
}

#[test]
fn test_two_runs_identical() {
    let temp = TempDir::new().unwrap();
    let inputs = vec![
        write(temp.path(), "a.txt", b"alpha"),
        write(temp.path(), "b.zip", &create_test_zip(&[("x.txt", b"x"), ("../y", b"y")])),
        write(temp.path(), "c.pdf", &encrypted_pdf_stub()),
        temp.path().join("missing.txt"),
        write(temp.path(), "d.zip", &nested_zip(5, b"z")),
    ];

    let config = AdmissionConfig::default();
    let first = admit_batch(&inputs, &config).unwrap();
    let second = Intake::new(config).with_workers(3).admit(&inputs).unwrap();

    assert_eq!(first.verdicts, second.verdicts);
    assert_eq!(first.count_by_reason(), second.count_by_reason());
}

#[test]
fn test_batch_survives_mixed_failures() {
    let temp = TempDir::new().unwrap();
    let inputs = vec![
        temp.path().join("gone.txt"),
        write(temp.path(), "ok.txt", b"fine"),
        write(temp.path(), "broken.zip", b"PK\x03\x04 definitely not a zip"),
    ];

    let report = admit_batch(&inputs, &AdmissionConfig::default()).unwrap();
    let reasons: Vec<_> = report.verdicts.iter().map(|v| v.reason).collect();
    assert_eq!(
        reasons,
        [
            Some(RejectReason::NotFound),
            None,
            Some(RejectReason::CorruptArchive)
        ]
    );
}

#[test]
fn test_member_count_cap() {
    let temp = TempDir::new().unwrap();
    let path = write(
        temp.path(),
        "many.zip",
        &create_test_zip(&[("1.txt", b"1"), ("2.txt", b"2"), ("3.txt", b"3")]),
    );

    let mut config = AdmissionConfig::default();
    config.max_archive_members = 2;
    let report = admit_file(&path, &config).unwrap();

    assert_eq!(report.verdicts.len(), 4);
    assert!(report.verdicts[1].is_admitted());
    assert!(report.verdicts[2].is_admitted());
    assert_eq!(report.verdicts[3].reason, Some(RejectReason::TooLarge));
}

#[test]
fn test_strict_preset_refuses_indeterminate_pdf() {
    let temp = TempDir::new().unwrap();
    // Signature matches, structure is garbage, no encryption marker
    let path = write(temp.path(), "odd.pdf", b"%PDF-1.7\n garbage without objects");

    let lenient = admit_file(&path, &AdmissionConfig::default()).unwrap();
    assert_eq!(lenient.verdicts[0].reason, Some(RejectReason::Unreadable));

    let mut config = AdmissionConfig::default();
    config.probe_error_policy = ProbeErrorPolicy::Reject;
    let strict = admit_file(&path, &config).unwrap();
    assert_eq!(strict.verdicts[0].reason, Some(RejectReason::Protected));
}

#[test]
fn test_overlong_member_name_does_not_abort_batch() {
    let temp = TempDir::new().unwrap();
    let ok = write(temp.path(), "ok.txt", b"fine");
    let long_name = format!("{}.txt", "a".repeat(300));
    let zip = write(
        temp.path(),
        "long.zip",
        &create_test_zip(&[(long_name.as_str(), b"payload")]),
    );

    let report = admit_batch(&[ok, zip], &AdmissionConfig::default()).unwrap();

    assert_eq!(report.verdicts.len(), 3);
    assert!(report.all_admitted());
    let member = &report.verdicts[2];
    assert_eq!(member.depth, 1);
    assert!(member.path.to_string_lossy().ends_with(&long_name));
    assert_eq!(member.sample.as_ref().unwrap().text, "payload");
}

#[test]
fn test_plain_pdf_mentioning_encrypt_is_admitted() {
    let temp = TempDir::new().unwrap();
    let path = write(
        temp.path(),
        "howto.pdf",
        &create_test_pdf("Set the /Encrypt key to protect files"),
    );

    let report = admit_file(&path, &AdmissionConfig::default()).unwrap();

    let verdict = &report.verdicts[0];
    assert_eq!(verdict.outcome, Outcome::Admitted);
    assert!(verdict.sample.as_ref().unwrap().text.contains("Encrypt"));
}
