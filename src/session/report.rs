//! Reports returned by session operations.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A file that could not be extracted during a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    /// Filename
    pub name: String,
    /// Absolute path
    pub path: PathBuf,
    /// Error message
    pub error: String,
}

/// Outcome of one [`Session::sync`](super::Session::sync).
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    /// PDFs found across all roots
    pub discovered: usize,
    /// Cached files still current
    pub valid: usize,
    /// Files extracted for the first time
    pub new: usize,
    /// Files re-extracted because they changed
    pub stale: usize,
    /// Cached files dropped because they left the disk
    pub removed: Vec<String>,
    /// Cached files kept because their root was offline
    pub retained: usize,
    /// Files extracted successfully in this run
    pub extracted: usize,
    /// Files that failed in this run
    pub failed: Vec<FailedFile>,
    /// Earlier failures skipped because the file has not changed
    pub known_failures: usize,
    /// Files not started because of cancellation or the deadline
    pub skipped: usize,
    /// Whether the run was interrupted
    pub interrupted: bool,
    /// Whether the run hit the extraction deadline
    pub timed_out: bool,
    /// Non-fatal scan errors
    pub scan_errors: Vec<String>,
    /// Filenames shadowed by a later root
    pub shadowed: usize,
    /// Rows in the rebuilt index, if it was rebuilt
    pub indexed: Option<usize>,
    /// Extraction workers used
    pub workers: usize,
    /// Wall time in milliseconds
    pub elapsed_ms: u64,
}

impl SyncReport {
    /// Whether any file failed to extract in this run.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Whether the cache or index changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.new + self.stale > 0 || !self.removed.is_empty() || self.has_failures()
    }

    /// One-line human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} PDF(s): {} up to date, {} extracted, {} removed",
            self.discovered,
            self.valid,
            self.extracted,
            self.removed.len()
        );
        if self.has_failures() {
            line.push_str(&format!(", {} file(s) failed to extract", self.failed.len()));
        }
        if self.skipped > 0 {
            line.push_str(&format!(", {} skipped", self.skipped));
        }
        line
    }
}

/// Cache and index statistics.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    /// Configured roots
    pub roots: Vec<PathBuf>,
    /// Files in the cache
    pub cached_files: usize,
    /// Pages in the cache
    pub total_pages: usize,
    /// Files recorded as failed
    pub failed_files: usize,
    /// Rows in the index, `None` if it is not built
    pub indexed_files: Option<usize>,
    /// Extraction and search workers
    pub workers: usize,
    /// Cache file location
    pub cache_path: PathBuf,
    /// Cache file size in bytes, if it exists
    pub cache_bytes: Option<u64>,
    /// Index location
    pub index_path: PathBuf,
    /// Index size in bytes, if it exists
    pub index_bytes: Option<u64>,
    /// When the cache was last modified
    pub updated_at: DateTime<Utc>,
}
