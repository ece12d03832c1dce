//! Parallel text extraction.
//!
//! # Overview
//!
//! [`extract_all`] fans one extraction task per file out over a dedicated,
//! bounded rayon pool and collects the results into an [`ExtractionBatch`].
//! Tasks share nothing but an atomic progress counter. A file that fails to
//! extract is recorded as an [`ExtractionFailure`] and never aborts the rest
//! of the batch.
//!
//! The batch is merged into the cache by the caller in a single step.
//!
//! # Example
//!
//! ```no_run
//! use magsearch::extraction::{extract_all, ExtractionConfig};
//! use magsearch::retry::RetryPolicy;
//! use magsearch::scanner::{PathResolver, PdfPageExtractor, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let resolver = PathResolver::build(&[PathBuf::from("/magazines")], &WalkerConfig::default());
//! let extractor = PdfPageExtractor::new(RetryPolicy::default());
//! let batch = extract_all(resolver.files().to_vec(), &extractor, &ExtractionConfig::default());
//! println!("{} extracted, {} failed", batch.extracted.len(), batch.failures.len());
//! ```

mod pool;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::cache::PdfFile;
use crate::progress::ProgressCallback;
use crate::scanner::{ExtractError, FileEntry};

pub use pool::{extract_all, pool_size};

/// Default upper bound on extraction workers.
pub const MAX_WORKERS: usize = 12;

/// Configuration for an extraction batch.
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Upper bound on worker threads; the pool never exceeds the machine's
    /// available parallelism.
    pub max_workers: usize,
    /// Optional shutdown flag, checked before each file.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
    /// Optional batch deadline measured from the start of the batch.
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("max_workers", &self.max_workers)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_workers: MAX_WORKERS,
            shutdown_flag: None,
            progress_callback: None,
            timeout: None,
        }
    }
}

impl ExtractionConfig {
    /// Set the worker cap.
    #[must_use]
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Set the batch deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// A successfully extracted file.
#[derive(Debug, Clone)]
pub struct ExtractedPdf {
    /// The file as discovered on disk
    pub entry: FileEntry,
    /// Page texts in page order
    pub pages: Vec<String>,
}

/// A file whose extraction failed.
#[derive(Debug)]
pub struct ExtractionFailure {
    /// Filename
    pub name: String,
    /// Absolute path
    pub path: PathBuf,
    /// Modification time observed at scan time
    pub mtime: SystemTime,
    /// What went wrong
    pub error: ExtractError,
}

/// Outcome of one extraction batch.
#[derive(Debug, Default)]
pub struct ExtractionBatch {
    /// Files extracted successfully, in input order
    pub extracted: Vec<ExtractedPdf>,
    /// Files that failed, in input order
    pub failures: Vec<ExtractionFailure>,
    /// Files never started because of cancellation or the deadline
    pub skipped: Vec<FileEntry>,
    /// Whether the batch was cut short by the shutdown flag
    pub interrupted: bool,
    /// Whether the batch ran past its deadline
    pub timed_out: bool,
    /// Wall time of the batch
    pub elapsed: Duration,
}

impl ExtractionBatch {
    /// Page texts of every extracted file, keyed by filename.
    #[must_use]
    pub fn pages(&self) -> HashMap<&str, &[String]> {
        self.extracted
            .iter()
            .map(|e| (e.entry.name.as_str(), e.pages.as_slice()))
            .collect()
    }

    /// Whether every input file was attempted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Convert the batch into cache entries and failure records.
    #[must_use]
    pub fn into_cache_parts(self) -> (Vec<PdfFile>, Vec<(String, SystemTime)>) {
        let files = self
            .extracted
            .into_iter()
            .map(|e| PdfFile::new(e.entry.name, e.entry.path, e.entry.modified, e.pages))
            .collect();
        let failed = self
            .failures
            .into_iter()
            .map(|f| (f.name, f.mtime))
            .collect();
        (files, failed)
    }
}
