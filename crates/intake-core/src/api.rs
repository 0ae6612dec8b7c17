//! High-level public API for admitting files.

use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;

use crate::AdmissionConfig;
use crate::AdmitError;
use crate::BatchReport;
use crate::Result;
use crate::context::RunContext;
use crate::pipeline::admit_tree;
use crate::report::NoopCallback;
use crate::report::Verdict;
use crate::report::VerdictCallback;

/// Admits a batch of paths with the given policy.
///
/// Each path and, for archives, every nested member receives exactly one
/// verdict. Rejections never abort the batch.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or scratch storage
/// fails.
///
/// # Examples
///
/// ```no_run
/// use intake_core::AdmissionConfig;
/// use intake_core::admit_batch;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AdmissionConfig::default();
/// let report = admit_batch(&["notes.txt", "bundle.zip"], &config)?;
/// for verdict in &report.verdicts {
///     println!("{}: {}", verdict.path.display(), verdict.outcome);
/// }
/// # Ok(())
/// # }
/// ```
pub fn admit_batch<P: AsRef<Path> + Sync>(
    paths: &[P],
    config: &AdmissionConfig,
) -> Result<BatchReport> {
    Intake::new(config.clone()).admit(paths)
}

/// Admits a single path (and its archive members, if any).
///
/// # Errors
///
/// Same as [`admit_batch`].
pub fn admit_file<P: AsRef<Path>>(path: P, config: &AdmissionConfig) -> Result<BatchReport> {
    admit_batch(&[path.as_ref()], config)
}

/// Builder for admission runs with non-default execution settings.
///
/// # Examples
///
/// ```no_run
/// use intake_core::AdmissionConfig;
/// use intake_core::Intake;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let report = Intake::new(AdmissionConfig::strict())
///     .with_workers(4)
///     .with_scratch_root("/var/tmp")
///     .admit(&["upload-1.pdf", "upload-2.zip"])?;
/// println!("{} admitted, {} rejected", report.admitted(), report.rejected());
/// # Ok(())
/// # }
/// ```
pub struct Intake {
    config: AdmissionConfig,
    workers: Option<usize>,
    scratch_root: Option<PathBuf>,
    callback: Option<Box<dyn VerdictCallback>>,
}

impl Intake {
    /// Creates a builder using rayon's global pool and the system temp
    /// directory.
    #[must_use]
    pub fn new(config: AdmissionConfig) -> Self {
        Self {
            config,
            workers: None,
            scratch_root: None,
            callback: None,
        }
    }

    /// Processes top-level inputs on a dedicated pool of `workers` threads.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Places the run's scratch directory under `root`.
    #[must_use]
    pub fn with_scratch_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Registers a callback invoked for every verdict.
    #[must_use]
    pub fn with_callback<C: VerdictCallback + 'static>(mut self, callback: C) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Admission policy of this builder.
    #[must_use]
    pub const fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Runs the admission pipeline over `paths`.
    ///
    /// Trees are processed in parallel; the report lists them in input
    /// order regardless of completion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the worker pool
    /// cannot start, or scratch storage fails.
    pub fn admit<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Result<BatchReport> {
        let start = Instant::now();
        let ctx = RunContext::create(self.config.clone(), self.scratch_root.as_deref())?;
        let callback: &dyn VerdictCallback = self.callback.as_deref().unwrap_or(&NoopCallback);

        tracing::info!(inputs = paths.len(), "admission run started");

        let trees = match self.workers {
            Some(workers) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("intake-worker-{i}"))
                    .build()
                    .map_err(|e| AdmitError::WorkerPool(e.to_string()))?;
                pool.install(|| admit_trees(&ctx, paths, callback))
            }
            None => admit_trees(&ctx, paths, callback),
        }?;

        if let Err(e) = ctx.close() {
            tracing::warn!(error = %e, "scratch cleanup failed");
        }

        let report = BatchReport {
            verdicts: trees.into_iter().flatten().collect(),
            duration: start.elapsed(),
        };
        tracing::info!(
            admitted = report.admitted(),
            rejected = report.rejected(),
            elapsed_ms = u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
            "admission run finished"
        );
        callback.on_complete(&report);
        Ok(report)
    }
}

fn admit_trees<P: AsRef<Path> + Sync>(
    ctx: &RunContext,
    paths: &[P],
    callback: &dyn VerdictCallback,
) -> Result<Vec<Vec<Verdict>>> {
    paths
        .par_iter()
        .enumerate()
        .map(|(tree, path)| admit_tree(ctx, tree, path.as_ref(), callback))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::field_reassign_with_default)]
mod tests {
    use super::*;
    use crate::RejectReason;
    use std::fs;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Counting {
        verdicts: Arc<AtomicUsize>,
        completed: Arc<AtomicUsize>,
    }

    impl VerdictCallback for Counting {
        fn on_verdict(&self, _verdict: &Verdict) {
            self.verdicts.fetch_add(1, Ordering::Relaxed);
        }

        fn on_complete(&self, _report: &BatchReport) {
            self.completed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_empty_batch() {
        let paths: [&str; 0] = [];
        let report = admit_batch(&paths, &AdmissionConfig::default()).unwrap();
        assert!(report.verdicts.is_empty());
        assert!(report.all_admitted());
    }

    #[test]
    fn test_report_keeps_input_order() {
        let dir = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for i in 0..16 {
            let path = dir.path().join(format!("f{i}.txt"));
            fs::write(&path, format!("file {i}")).unwrap();
            paths.push(path);
        }

        let report = Intake::new(AdmissionConfig::default())
            .with_workers(4)
            .admit(&paths)
            .unwrap();
        let reported: Vec<_> = report.verdicts.iter().map(|v| v.path.clone()).collect();
        assert_eq!(reported, paths);
    }

    #[test]
    fn test_callback_sees_every_verdict() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "alpha").unwrap();

        let counting = Counting::default();
        let report = Intake::new(AdmissionConfig::default())
            .with_callback(counting.clone())
            .admit(&[path.as_path(), Path::new("/nonexistent/intake/b")])
            .unwrap();

        assert_eq!(report.verdicts.len(), 2);
        assert_eq!(counting.verdicts.load(Ordering::Relaxed), 2);
        assert_eq!(counting.completed.load(Ordering::Relaxed), 1);
        assert_eq!(report.verdicts[1].reason, Some(RejectReason::NotFound));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let mut config = AdmissionConfig::default();
        config.max_sample_length = 0;
        let result = admit_file("anything", &config);
        assert!(matches!(result, Err(AdmitError::InvalidConfig { .. })));
    }

    #[test]
    fn test_scratch_root_used_and_cleaned() {
        let root = TempDir::new().unwrap();
        let input = root.path().join("input.txt");
        fs::write(&input, "hello").unwrap();

        let report = Intake::new(AdmissionConfig::default())
            .with_scratch_root(root.path())
            .admit(&[&input])
            .unwrap();
        assert!(report.all_admitted());

        // Only the input remains; the run's scratch directory is gone
        let leftovers: Vec<_> = fs::read_dir(root.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, [std::ffi::OsString::from("input.txt")]);
    }
}
