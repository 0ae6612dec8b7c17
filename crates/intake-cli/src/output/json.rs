//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use super::formatter::SniffOutcome;
use super::formatter::SniffResult;
use anyhow::Result;
use intake_core::BatchReport;
use intake_core::Verdict;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::io::{self};

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct CheckOutput {
    summary: Summary,
    verdicts: Vec<VerdictOutput>,
}

#[derive(Serialize)]
struct Summary {
    total: usize,
    admitted: usize,
    rejected: usize,
    rejected_by_reason: BTreeMap<&'static str, usize>,
    duration_ms: u128,
}

#[derive(Serialize)]
struct VerdictOutput {
    path: String,
    depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime: Option<&'static str>,
    stage: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample: Option<SampleOutput>,
}

#[derive(Serialize)]
struct SampleOutput {
    text: String,
    truncated: bool,
}

impl VerdictOutput {
    fn new(verdict: &Verdict, show_samples: bool) -> Self {
        Self {
            path: verdict.path.display().to_string(),
            depth: verdict.depth,
            parent: verdict.parent.as_ref().map(|p| p.display().to_string()),
            outcome: if verdict.is_admitted() {
                "admitted"
            } else {
                "rejected"
            },
            reason: verdict.reason.map(|r| r.code()),
            detail: verdict.detail.clone(),
            content_type: verdict.detected.map(|d| d.content_type.tag()),
            mime: verdict.detected.map(|d| d.mime),
            stage: verdict.stage.name(),
            sample: verdict
                .sample
                .as_ref()
                .filter(|_| show_samples)
                .map(|s| SampleOutput {
                    text: s.text.clone(),
                    truncated: s.truncated,
                }),
        }
    }
}

fn check_output(report: &BatchReport, show_samples: bool) -> CheckOutput {
    CheckOutput {
        summary: Summary {
            total: report.verdicts.len(),
            admitted: report.admitted(),
            rejected: report.rejected(),
            rejected_by_reason: report
                .count_by_reason()
                .into_iter()
                .map(|(reason, count)| (reason.code(), count))
                .collect(),
            duration_ms: report.duration.as_millis(),
        },
        verdicts: report
            .verdicts
            .iter()
            .map(|v| VerdictOutput::new(v, show_samples))
            .collect(),
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_check_report(&self, report: &BatchReport, show_samples: bool) -> Result<()> {
        let output = JsonOutput::success("check", check_output(report, show_samples));
        Self::output(&output)
    }

    fn format_sniff_results(&self, results: &[SniffResult]) -> Result<()> {
        #[derive(Serialize)]
        struct SniffOutput {
            path: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            content_type: Option<&'static str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            mime: Option<&'static str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            confident: Option<bool>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<String>,
        }

        let data: Vec<_> = results
            .iter()
            .map(|result| {
                let path = result.path.display().to_string();
                match &result.outcome {
                    SniffOutcome::Detected(detected) => SniffOutput {
                        path,
                        content_type: Some(detected.content_type.tag()),
                        mime: Some(detected.mime),
                        confident: Some(detected.confident),
                        error: None,
                    },
                    SniffOutcome::Unknown => SniffOutput {
                        path,
                        content_type: None,
                        mime: None,
                        confident: None,
                        error: Some("unknown type".to_string()),
                    },
                    SniffOutcome::Failed(reason) => SniffOutput {
                        path,
                        content_type: None,
                        mime: None,
                        confident: None,
                        error: Some(reason.clone()),
                    },
                }
            })
            .collect();

        Self::output(&JsonOutput::success("sniff", data))
    }

    fn format_error(&self, operation: &str, error: &anyhow::Error) {
        let output = JsonOutput::error(operation, format!("{error:#}"));
        let _ = Self::output(&output);
    }

    fn format_warning(&self, message: &str) {
        // Stdout carries exactly one document; warnings go to stderr
        let output = JsonOutput::error("warning", message);
        if let Ok(json) = serde_json::to_string(&output) {
            let _ = writeln!(io::stderr(), "{json}");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use intake_core::AdmissionConfig;
    use intake_core::admit_batch;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_check_output_structure() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.txt");
        fs::write(&path, "alpha").unwrap();
        let report = admit_batch(
            &[path, temp.path().join("missing")],
            &AdmissionConfig::default(),
        )
        .unwrap();

        let value = serde_json::to_value(JsonOutput::success(
            "check",
            check_output(&report, true),
        ))
        .unwrap();

        assert_eq!(value["operation"], "check");
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["summary"]["admitted"], 1);
        assert_eq!(value["data"]["summary"]["rejected_by_reason"]["not_found"], 1);
        assert_eq!(value["data"]["verdicts"][0]["content_type"], "text");
        assert_eq!(value["data"]["verdicts"][0]["sample"]["text"], "alpha");
        assert_eq!(value["data"]["verdicts"][1]["reason"], "not_found");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_samples_omitted_unless_requested() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.txt");
        fs::write(&path, "alpha").unwrap();
        let report = admit_batch(&[path], &AdmissionConfig::default()).unwrap();

        let value = serde_json::to_value(check_output(&report, false)).unwrap();
        assert!(value["verdicts"][0].get("sample").is_none());
    }

    #[test]
    fn test_error_envelope() {
        let value = serde_json::to_value(JsonOutput::error("check", "boom")).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "boom");
        assert!(value.get("data").is_none());
    }
}
