//! Per-run state shared by every tree of a batch.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::AdmissionConfig;
use crate::AdmitError;
use crate::Result;
use crate::types::CandidateId;

/// Prefix of the run's scratch directory.
const SCRATCH_PREFIX: &str = "intake-";

/// Configuration and scratch storage for one admission run.
///
/// The scratch directory is removed when the context is dropped, on every
/// exit path. Call [`RunContext::close`] to observe removal failures.
#[derive(Debug)]
pub struct RunContext {
    config: AdmissionConfig,
    scratch: TempDir,
}

impl RunContext {
    /// Creates a context with scratch storage in the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns `AdmitError::InvalidConfig` if the configuration does not
    /// validate, or `AdmitError::Scratch` if the scratch directory cannot be
    /// created.
    pub fn new(config: AdmissionConfig) -> Result<Self> {
        Self::create(config, None)
    }

    /// Creates a context with scratch storage under `scratch_root`, or the
    /// system temp directory when `None`.
    ///
    /// # Errors
    ///
    /// Same as [`RunContext::new`].
    pub fn create(config: AdmissionConfig, scratch_root: Option<&Path>) -> Result<Self> {
        config.validate()?;

        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let scratch = match scratch_root {
            Some(root) => builder.tempdir_in(root).map_err(|source| AdmitError::Scratch {
                path: root.to_path_buf(),
                source,
            })?,
            None => builder.tempdir().map_err(|source| AdmitError::Scratch {
                path: std::env::temp_dir(),
                source,
            })?,
        };

        tracing::debug!(scratch = %scratch.path().display(), "run context created");
        Ok(Self { config, scratch })
    }

    /// Admission policy of this run.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Root of the run's scratch area.
    #[inline]
    #[must_use]
    pub fn scratch_root(&self) -> &Path {
        self.scratch.path()
    }

    /// Creates and returns the extraction directory for one archive.
    ///
    /// Directories are keyed by tree index and candidate id, so archives
    /// with identical names never share a directory.
    ///
    /// # Errors
    ///
    /// Returns `AdmitError::Scratch` if the directory cannot be created.
    pub fn archive_scratch(&self, tree: usize, archive: CandidateId) -> Result<PathBuf> {
        let dir = self.archive_dir(tree, archive);
        fs::create_dir_all(&dir).map_err(|source| AdmitError::Scratch {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    /// Deletes one extracted member once its verdict is recorded.
    ///
    /// Paths outside the scratch area are never touched.
    pub fn release_member(&self, path: &Path) {
        if path.starts_with(self.scratch.path()) {
            report_release(path, fs::remove_file(path));
        }
    }

    /// Deletes an archive's extraction directory once all of its members
    /// have a verdict.
    pub fn release_archive(&self, tree: usize, archive: CandidateId) {
        let dir = self.archive_dir(tree, archive);
        report_release(&dir, fs::remove_dir_all(&dir));
    }

    /// Deletes a tree's scratch directory after its last verdict.
    pub fn release_tree(&self, tree: usize) {
        let dir = self.tree_dir(tree);
        report_release(&dir, fs::remove_dir_all(&dir));
    }

    fn tree_dir(&self, tree: usize) -> PathBuf {
        self.scratch.path().join(format!("t{tree}"))
    }

    fn archive_dir(&self, tree: usize, archive: CandidateId) -> PathBuf {
        self.tree_dir(tree).join(format!("c{}", archive.index()))
    }

    /// Removes the scratch area, reporting failures.
    ///
    /// # Errors
    ///
    /// Returns `AdmitError::Scratch` if removal fails.
    pub fn close(self) -> Result<()> {
        let path = self.scratch.path().to_path_buf();
        self.scratch
            .close()
            .map_err(|source| AdmitError::Scratch { path, source })
    }
}

/// Scratch that is already gone is fine; anything else is logged and left
/// for the end-of-run cleanup.
fn report_release(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => tracing::trace!(path = %path.display(), "scratch released"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to release scratch"),
    }
}
