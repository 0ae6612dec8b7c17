//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use super::formatter::SniffOutcome;
use super::formatter::SniffResult;
use anyhow::Result;
use console::Term;
use console::style;
use intake_core::BatchReport;
use intake_core::Verdict;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        let mut count = 0;

        for c in s.chars().rev() {
            if count == 3 {
                result.push(',');
                count = 0;
            }
            result.push(c);
            count += 1;
        }

        result.chars().rev().collect()
    }

    fn verdict_line(&self, verdict: &Verdict) -> String {
        let indent = "  ".repeat(verdict.depth);
        let path = verdict.path.display();
        let tag = verdict.detected.map(|d| d.content_type.tag());

        match (verdict.reason, self.use_colors) {
            (None, true) => format!(
                "{indent}{} {path} {}",
                style("✓").green().bold(),
                style(format!("[{}]", tag.unwrap_or("?"))).dim()
            ),
            (None, false) => format!("{indent}admitted {path} [{}]", tag.unwrap_or("?")),
            (Some(reason), true) => format!(
                "{indent}{} {path} {}: {}",
                style("✗").red().bold(),
                style(reason.code()).red(),
                verdict.detail.as_deref().unwrap_or_default()
            ),
            (Some(reason), false) => format!(
                "{indent}rejected {path} {}: {}",
                reason.code(),
                verdict.detail.as_deref().unwrap_or_default()
            ),
        }
    }

    fn sample_line(verdict: &Verdict) -> Option<String> {
        let sample = verdict.sample.as_ref()?;
        let indent = "  ".repeat(verdict.depth + 2);
        let text = sample.text.replace('\n', "\\n").replace('\t', "\\t");
        let ellipsis = if sample.truncated { "..." } else { "" };
        Some(format!("{indent}\"{text}\"{ellipsis}"))
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_check_report(&self, report: &BatchReport, show_samples: bool) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        for verdict in &report.verdicts {
            self.term.write_line(&self.verdict_line(verdict))?;
            if self.verbose {
                if let Some(detected) = verdict.detected {
                    self.term.write_line(&format!(
                        "{}  {} (stage: {})",
                        "  ".repeat(verdict.depth + 1),
                        detected.mime,
                        verdict.stage
                    ))?;
                }
            }
            if show_samples || self.verbose {
                if let Some(line) = Self::sample_line(verdict) {
                    self.term.write_line(&line)?;
                }
            }
        }

        self.term.write_line("")?;
        let summary = format!(
            "{} checked: {} admitted, {} rejected",
            Self::format_number(report.verdicts.len()),
            Self::format_number(report.admitted()),
            Self::format_number(report.rejected())
        );
        if self.use_colors {
            let styled = if report.all_admitted() {
                style(summary).green().bold()
            } else {
                style(summary).yellow().bold()
            };
            self.term.write_line(&styled.to_string())?;
        } else {
            self.term.write_line(&summary)?;
        }

        for (reason, count) in report.count_by_reason() {
            self.term.write_line(&format!(
                "  {:<22} {}",
                reason.code(),
                Self::format_number(count)
            ))?;
        }

        if self.verbose {
            self.term
                .write_line(&format!("  Duration: {:?}", report.duration))?;
        }

        Ok(())
    }

    fn format_sniff_results(&self, results: &[SniffResult]) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        for result in results {
            let path = result.path.display();
            let line = match &result.outcome {
                SniffOutcome::Detected(detected) => {
                    let hint = if detected.confident { "" } else { " (heuristic)" };
                    if self.use_colors {
                        format!(
                            "{path}: {} {}{hint}",
                            style(detected.content_type.tag()).cyan().bold(),
                            detected.mime
                        )
                    } else {
                        format!("{path}: {} {}{hint}", detected.content_type.tag(), detected.mime)
                    }
                }
                SniffOutcome::Unknown => format!("{path}: unknown"),
                SniffOutcome::Failed(reason) => format!("{path}: error: {reason}"),
            };
            self.term.write_line(&line)?;
        }

        Ok(())
    }

    fn format_error(&self, _operation: &str, error: &anyhow::Error) {
        let err_term = Term::stderr();
        if self.use_colors {
            let _ = err_term.write_line(&format!("{} {error:?}", style("error:").red().bold()));
        } else {
            let _ = err_term.write_line(&format!("error: {error:?}"));
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let err_term = Term::stderr();
        if self.use_colors {
            let _ = err_term.write_line(&format!("{} {message}", style("warning:").yellow().bold()));
        } else {
            let _ = err_term.write_line(&format!("warning: {message}"));
        }
    }
}
