//! Candidate selection and the parallel page scan.

use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;

use super::context::{find_matches, fold_case, ContextWindow};
use super::MatchRecord;
use crate::cache::{CacheStore, PdfFile};
use crate::extraction::pool_size;
use crate::index::TextIndex;

/// Files with more pages than this have their pages scanned in parallel.
pub const PARALLEL_PAGE_THRESHOLD: usize = 20;

/// Search tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Context window sizing
    pub context: ContextWindow,
    /// Upper bound on scan threads
    pub max_workers: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            context: ContextWindow::default(),
            max_workers: crate::extraction::MAX_WORKERS,
        }
    }
}

/// Runs searches against cache snapshots.
pub struct SearchEngine {
    index: Option<TextIndex>,
    options: SearchOptions,
    pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine")
            .field("index", &self.index)
            .field("options", &self.options)
            .field("pool", &self.pool.as_ref().map(rayon::ThreadPool::current_num_threads))
            .finish()
    }
}

impl SearchEngine {
    /// Create an engine. Without an index every search scans all files.
    #[must_use]
    pub fn new(index: Option<TextIndex>, options: SearchOptions) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(pool_size(options.max_workers))
            .thread_name(|i| format!("magsearch-search-{i}"))
            .build()
            .map_err(|e| log::warn!("Failed to create search pool ({}), using global pool", e))
            .ok();
        Self {
            index,
            options,
            pool,
        }
    }

    /// The options this engine was built with.
    #[must_use]
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Search `snapshot` for `keyword`, files in filename order.
    ///
    /// An empty or whitespace-only keyword yields no results.
    #[must_use]
    pub fn search(&self, snapshot: &CacheStore, keyword: &str) -> Vec<MatchRecord> {
        self.search_ordered(snapshot, keyword, |_| None)
    }

    /// Search `snapshot` for `keyword`, files ordered by `position`.
    ///
    /// Files for which `position` returns `None` follow the positioned ones
    /// in filename order.
    #[must_use]
    pub fn search_ordered<F>(
        &self,
        snapshot: &CacheStore,
        keyword: &str,
        position: F,
    ) -> Vec<MatchRecord>
    where
        F: Fn(&str) -> Option<usize> + Sync,
    {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            log::debug!("Empty keyword, nothing to search");
            return Vec::new();
        }

        let candidates = self.index.as_ref().and_then(|i| i.query_candidates(keyword));
        if candidates.is_none() {
            log::debug!("Index unavailable, scanning all {} cached file(s)", snapshot.len());
        }

        let run = || {
            scan_ordered(
                snapshot,
                candidates.as_ref(),
                keyword,
                &self.options.context,
                &position,
            )
        };
        let records = match self.pool {
            Some(ref pool) => pool.install(run),
            None => run(),
        };

        log::info!("Search {:?}: {} match(es)", keyword, records.len());
        records
    }
}

/// Scan the pages of `snapshot`'s files for `keyword`, in filename order.
///
/// Only files named in `candidates` are scanned when it is `Some`;
/// candidates that are not in the snapshot are ignored.
#[must_use]
pub fn scan(
    snapshot: &CacheStore,
    candidates: Option<&HashSet<String>>,
    keyword: &str,
    window: &ContextWindow,
) -> Vec<MatchRecord> {
    scan_ordered(snapshot, candidates, keyword, window, |_| None)
}

/// [`scan`] with files ordered by `position`, unpositioned files last.
#[must_use]
pub fn scan_ordered<F>(
    snapshot: &CacheStore,
    candidates: Option<&HashSet<String>>,
    keyword: &str,
    window: &ContextWindow,
    position: F,
) -> Vec<MatchRecord>
where
    F: Fn(&str) -> Option<usize>,
{
    let needle = fold_case(keyword.trim());
    if needle.is_empty() {
        return Vec::new();
    }

    let mut files: Vec<&PdfFile> = match candidates {
        Some(names) => snapshot.files().filter(|f| names.contains(&f.name)).collect(),
        None => snapshot.files().collect(),
    };
    files.sort_by_cached_key(|f| position(&f.name).unwrap_or(usize::MAX));

    let per_file: Vec<Vec<MatchRecord>> = files
        .par_iter()
        .map(|file| scan_file(file, &needle, window))
        .collect();

    per_file.into_iter().flatten().collect()
}

fn scan_file(file: &PdfFile, needle: &str, window: &ContextWindow) -> Vec<MatchRecord> {
    let per_page: Vec<Vec<MatchRecord>> = if file.pages.len() > PARALLEL_PAGE_THRESHOLD {
        file.pages
            .par_iter()
            .enumerate()
            .map(|(i, text)| scan_page(file, i + 1, text, needle, window))
            .collect()
    } else {
        file.pages
            .iter()
            .enumerate()
            .map(|(i, text)| scan_page(file, i + 1, text, needle, window))
            .collect()
    };
    per_page.into_iter().flatten().collect()
}

fn scan_page(
    file: &PdfFile,
    page: usize,
    text: &Arc<str>,
    needle: &str,
    window: &ContextWindow,
) -> Vec<MatchRecord> {
    find_matches(text, needle)
        .into_iter()
        .map(|hit| {
            let offset = hit.start;
            let snippet = window.snippet(text, hit);
            MatchRecord {
                filename: file.name.clone(),
                page,
                offset,
                snippet: snippet.text,
                highlight: snippet.highlight,
                page_count: file.page_count(),
                path: file.path.clone(),
                page_text: Arc::clone(text),
            }
        })
        .collect()
}
