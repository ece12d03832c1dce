//! The bounded worker pool behind [`extract_all`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use rayon::prelude::*;

use super::{ExtractedPdf, ExtractionBatch, ExtractionConfig, ExtractionFailure};
use crate::scanner::{FileEntry, PageExtractor};

enum Outcome {
    Extracted(ExtractedPdf),
    Failed(ExtractionFailure),
    Interrupted(FileEntry),
    TimedOut(FileEntry),
}

/// Number of workers used for a cap of `max_workers`.
///
/// The pool never exceeds the machine's available parallelism and always
/// has at least one worker.
#[must_use]
pub fn pool_size(max_workers: usize) -> usize {
    let available = thread::available_parallelism().map_or(1, usize::from);
    available.min(max_workers).max(1)
}

/// Extract every file in `files` on a bounded worker pool.
///
/// Each file is extracted independently. Failures are isolated per file.
/// The shutdown flag and deadline are checked before each file is started,
/// never in the middle of one; files not started are returned in
/// [`ExtractionBatch::skipped`].
#[must_use]
pub fn extract_all(
    files: Vec<FileEntry>,
    extractor: &dyn PageExtractor,
    config: &ExtractionConfig,
) -> ExtractionBatch {
    let started = Instant::now();
    let total = files.len();

    if files.is_empty() {
        log::debug!("Extraction: No files to process");
        return ExtractionBatch::default();
    }

    let workers = pool_size(config.max_workers);
    log::info!(
        "Extracting text from {} file(s) with {} worker(s)",
        total,
        workers
    );

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start("extracting", total);
    }

    let deadline = config.timeout.map(|t| started + t);
    let completed = AtomicUsize::new(0);

    let run = || -> Vec<Outcome> {
        files
            .into_par_iter()
            .map(|entry| {
                if config.is_shutdown_requested() {
                    log::debug!("Extraction: Shutdown requested, skipping {}", entry.name);
                    return Outcome::Interrupted(entry);
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    log::debug!("Extraction: Deadline passed, skipping {}", entry.name);
                    return Outcome::TimedOut(entry);
                }

                let result = extractor.extract_pages(&entry.path);

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(ref callback) = config.progress_callback {
                    callback.on_progress(done, &entry.name);
                    callback.on_item_completed(entry.size);
                }

                match result {
                    Ok(pages) => {
                        log::trace!("Extracted {} page(s) from {}", pages.len(), entry.name);
                        Outcome::Extracted(ExtractedPdf { entry, pages })
                    }
                    Err(error) => {
                        log::warn!("Extraction failed for {}: {}", entry.name, error);
                        Outcome::Failed(ExtractionFailure {
                            name: entry.name,
                            path: entry.path,
                            mtime: entry.modified,
                            error,
                        })
                    }
                }
            })
            .collect()
    };

    let outcomes = match rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("magsearch-extract-{i}"))
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(e) => {
            log::warn!(
                "Failed to create extraction pool ({}), using global pool with {} threads",
                e,
                rayon::current_num_threads()
            );
            run()
        }
    };

    let mut batch = ExtractionBatch::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Extracted(e) => batch.extracted.push(e),
            Outcome::Failed(f) => batch.failures.push(f),
            Outcome::Interrupted(entry) => {
                batch.interrupted = true;
                batch.skipped.push(entry);
            }
            Outcome::TimedOut(entry) => {
                batch.timed_out = true;
                batch.skipped.push(entry);
            }
        }
    }
    batch.elapsed = started.elapsed();

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end("extracting");
    }

    log::info!(
        "Extraction complete: {} extracted, {} failed, {} skipped in {:.2?}",
        batch.extracted.len(),
        batch.failures.len(),
        batch.skipped.len(),
        batch.elapsed
    );

    batch
}
