use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Local};
use serde::Serialize;
use walkdir::WalkDir;

use super::ArchiveError;

// ── Result types ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize)]
pub struct SweepReport {
    /// Files older than the retention window (deleted unless `dry_run`).
    pub expired: Vec<ExpiredFile>,
    pub files_deleted: usize,
    /// Category directories removed (or that would be) because they were empty.
    pub dirs_removed: Vec<PathBuf>,
    /// Individual files or directories that could not be read or removed.
    pub errors: usize,
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
pub struct ExpiredFile {
    pub path: PathBuf,
    pub modified: DateTime<Local>,
}

// ── Retention manager ────────────────────────────────────────────────────────

/// Evicts archive files past their retention window and prunes the category
/// directories they leave empty.
///
/// Only files strictly older than `max_age` are touched, so digests written
/// concurrently by the pipeline are never candidates.
#[derive(Debug, Clone)]
pub struct RetentionManager {
    base_dir: PathBuf,
    max_age: Duration,
}

impl RetentionManager {
    pub fn new(base_dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_age,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Run a sweep against the current time.
    pub fn sweep(&self, dry_run: bool) -> Result<SweepReport, ArchiveError> {
        self.sweep_at(SystemTime::now(), dry_run)
    }

    /// Run a sweep as if the current time were `now`.
    ///
    /// Phase 1 walks the whole tree and deletes every regular file modified
    /// before `now - max_age`; a file modified exactly at the cutoff is kept.
    /// Phase 2 removes immediate child directories of the base that are empty
    /// afterwards. Per-file failures are logged and counted; only failing to
    /// list the base directory aborts the sweep. A base that does not exist yet
    /// is an empty archive, not an error.
    pub fn sweep_at(&self, now: SystemTime, dry_run: bool) -> Result<SweepReport, ArchiveError> {
        let mut report = SweepReport {
            dry_run,
            ..Default::default()
        };

        if let Err(source) = std::fs::read_dir(&self.base_dir) {
            if source.kind() == std::io::ErrorKind::NotFound {
                tracing::debug!(base = %self.base_dir.display(), "archive base does not exist, nothing to sweep");
                return Ok(report);
            }
            return Err(ArchiveError::ListBase {
                path: self.base_dir.clone(),
                source,
            });
        }

        let cutoff = now.checked_sub(self.max_age).unwrap_or(SystemTime::UNIX_EPOCH);
        let removed = self.evict_files(cutoff, dry_run, &mut report);
        self.prune_empty_dirs(&removed, dry_run, &mut report);

        tracing::info!(
            base = %self.base_dir.display(),
            expired = report.expired.len(),
            deleted = report.files_deleted,
            dirs_removed = report.dirs_removed.len(),
            errors = report.errors,
            dry_run,
            "archive sweep complete"
        );

        Ok(report)
    }

    /// Phase 1. Returns the paths that are gone (or would be, in a dry run).
    fn evict_files(
        &self,
        cutoff: SystemTime,
        dry_run: bool,
        report: &mut SweepReport,
    ) -> HashSet<PathBuf> {
        let mut removed = HashSet::new();

        for item in WalkDir::new(&self.base_dir).min_depth(1) {
            let entry = match item {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read archive entry, skipping");
                    report.errors += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let modified = match entry.metadata().map_err(std::io::Error::from).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!(path = %entry.path().display(), error = %e, "failed to stat archive file, skipping");
                    report.errors += 1;
                    continue;
                }
            };

            if modified >= cutoff {
                continue;
            }

            let path = entry.into_path();
            if !dry_run {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to delete expired archive file");
                    report.errors += 1;
                    continue;
                }
                tracing::debug!(path = %path.display(), "deleted expired archive file");
                report.files_deleted += 1;
            }

            report.expired.push(ExpiredFile {
                path: path.clone(),
                modified: DateTime::<Local>::from(modified),
            });
            removed.insert(path);
        }

        removed
    }

    /// Phase 2. One level only: nested directories are left alone.
    fn prune_empty_dirs(&self, removed: &HashSet<PathBuf>, dry_run: bool, report: &mut SweepReport) {
        let children = match std::fs::read_dir(&self.base_dir) {
            Ok(children) => children,
            Err(e) => {
                tracing::warn!(base = %self.base_dir.display(), error = %e, "failed to list archive base for pruning");
                report.errors += 1;
                return;
            }
        };

        for child in children {
            let child = match child {
                Ok(child) => child,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read archive directory entry");
                    report.errors += 1;
                    continue;
                }
            };

            let is_dir = child.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }

            let dir = child.path();
            match is_empty_after(&dir, removed) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::warn!(path = %dir.display(), error = %e, "failed to read category directory");
                    report.errors += 1;
                    continue;
                }
            }

            if !dry_run {
                if let Err(e) = std::fs::remove_dir(&dir) {
                    tracing::warn!(path = %dir.display(), error = %e, "failed to remove empty category directory");
                    report.errors += 1;
                    continue;
                }
                tracing::debug!(path = %dir.display(), "removed empty category directory");
            }
            report.dirs_removed.push(dir);
        }
    }
}

/// Whether `dir` has no entries other than those in `removed`.
fn is_empty_after(dir: &Path, removed: &HashSet<PathBuf>) -> std::io::Result<bool> {
    for child in std::fs::read_dir(dir)? {
        if !removed.contains(&child?.path()) {
            return Ok(false);
        }
    }
    Ok(true)
}
