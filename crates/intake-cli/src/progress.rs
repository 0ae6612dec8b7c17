//! Progress bar implementation for admission runs.

use console::Term;
use indicatif::ProgressBar;
use indicatif::ProgressState;
use indicatif::ProgressStyle;
use intake_core::BatchReport;
use intake_core::Verdict;
use intake_core::VerdictCallback;
use std::fmt::Write;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

/// CLI progress bar wrapper implementing `VerdictCallback`.
///
/// The bar advances once per top-level input; member verdicts only update
/// the candidate and rejection counters shown next to it. Verdicts arrive
/// from several worker threads, so the counters are atomics.
pub struct CliProgress {
    bar: ProgressBar,
    candidates: AtomicUsize,
    rejected: AtomicUsize,
}

impl CliProgress {
    /// Creates a progress bar for `inputs` top-level paths.
    #[must_use]
    pub fn new(inputs: usize) -> Self {
        let bar = ProgressBar::new(inputs as u64);

        // Template: "Checking [████████░░░░] 42/100 inputs (318 candidates, 3 rejected, 12s)"
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} inputs ({prefix}, {eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .with_key("eta", |state: &ProgressState, w: &mut dyn Write| {
                    write!(w, "{}", humanize_duration(state.eta())).unwrap_or(());
                })
                .progress_chars("█▓░"),
        );
        bar.set_message("Checking");
        bar.set_prefix("0 candidates, 0 rejected");

        Self {
            bar,
            candidates: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
        }
    }

    /// Checks if we should show progress (TTY detection).
    ///
    /// The bar draws on stderr, so that is the stream that must be a terminal.
    #[must_use]
    pub fn should_show() -> bool {
        Term::stderr().is_term()
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl VerdictCallback for CliProgress {
    fn on_verdict(&self, verdict: &Verdict) {
        let candidates = self.candidates.fetch_add(1, Ordering::Relaxed) + 1;
        let rejected = if verdict.is_admitted() {
            self.rejected.load(Ordering::Relaxed)
        } else {
            self.rejected.fetch_add(1, Ordering::Relaxed) + 1
        };
        self.bar
            .set_prefix(format!("{candidates} candidates, {rejected} rejected"));

        // A tree's own verdict is always its first one
        if verdict.depth == 0 {
            self.bar.inc(1);
        }
    }

    fn on_complete(&self, _report: &BatchReport) {
        self.bar.finish_and_clear();
    }
}

/// Converts duration to human-readable format.
fn humanize_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h{}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}
