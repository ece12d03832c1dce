//! The search session: one configured library of magazines.
//!
//! A [`Session`] owns the loaded cache, the path resolver, the text index and
//! the search engine. Searches read an immutable snapshot of the cache
//! (`Arc<CacheStore>`) and never block on a running sync. A sync works on a
//! private copy of the store and publishes it in one swap after the copy has
//! been written to disk, so readers only ever see a complete generation.
//!
//! ```text
//!  scan roots ─► classify ─► extract (pool) ─► merge ─► save ─► swap ─► reindex
//! ```
//!
//! Only one sync merges at a time; a second caller waits for the first.

pub mod report;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

use thiserror::Error;

use crate::cache::{CacheError, CacheStore};
use crate::config::Config;
use crate::extraction::{extract_all, pool_size, ExtractionConfig};
use crate::index::{IndexError, TextIndex};
use crate::progress::{NoProgress, ProgressCallback};
use crate::scanner::{PageExtractor, PathResolver, PdfPageExtractor, ResolveError};
use crate::search::{MatchRecord, PostFilter, SearchEngine};

pub use report::{FailedFile, SessionStats, SyncReport};

/// Errors returned by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Loading or saving the cache failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The index could not be rebuilt or cleared.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The result filter blacklist did not compile.
    #[error("Invalid filter blacklist: {0}")]
    Filter(#[from] regex::Error),

    /// A file outside the cache could not be accessed.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

/// A configured magazine library with its cache, index and search engine.
pub struct Session {
    config: Config,
    resolver: RwLock<Arc<PathResolver>>,
    cache: RwLock<Arc<CacheStore>>,
    merge_lock: Mutex<()>,
    index: TextIndex,
    engine: SearchEngine,
    extractor: Arc<dyn PageExtractor>,
    shutdown_flag: Arc<AtomicBool>,
    filter: PostFilter,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("roots", &self.config.root_dirs)
            .field("cached", &self.snapshot().len())
            .field("index", &self.index)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Open a session: load the cache and prepare the index and engine.
    ///
    /// A corrupted or incompatible cache file is discarded with a warning
    /// and rebuilt by the next [`sync`](Self::sync).
    ///
    /// # Errors
    ///
    /// Fails if the cache file exists but cannot be read, or if the filter
    /// blacklist is invalid.
    pub fn open(config: Config) -> Result<Self, SessionError> {
        let store = CacheStore::load_or_rebuild(&config.cache_path)?;
        log::debug!(
            "Loaded {} cached file(s) from {}",
            store.len(),
            config.cache_path.display()
        );

        let filter = PostFilter::new(&config.filter)?;
        let index = TextIndex::new(&config.index_path);
        let engine = SearchEngine::new(Some(index.clone()), config.search_options());
        let extractor: Arc<dyn PageExtractor> = Arc::new(PdfPageExtractor::new(config.retry));

        Ok(Self {
            resolver: RwLock::new(Arc::new(PathResolver::default())),
            cache: RwLock::new(Arc::new(store)),
            merge_lock: Mutex::new(()),
            index,
            engine,
            extractor,
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            filter,
            config,
        })
    }

    /// Replace the page extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn PageExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Share a shutdown flag with the scan and extraction loops.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = flag;
        self
    }

    /// The configuration this session runs with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The current cache generation.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CacheStore> {
        Arc::clone(&self.cache.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn publish(&self, store: CacheStore) -> Arc<CacheStore> {
        let store = Arc::new(store);
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&store);
        store
    }

    fn resolver(&self) -> Arc<PathResolver> {
        Arc::clone(&self.resolver.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn interrupted(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }

    /// Walk every root and replace the path resolver.
    ///
    /// Returns the new resolver. An interrupted walk is returned but not
    /// installed.
    pub fn scan(&self) -> Arc<PathResolver> {
        let resolver = Arc::new(PathResolver::scan(
            &self.config.root_dirs,
            &self.config.walker_config(),
            Some(Arc::clone(&self.shutdown_flag)),
        ));
        if !self.interrupted() {
            *self.resolver.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&resolver);
        }
        resolver
    }

    /// Bring the cache and index in line with the files on disk.
    ///
    /// New and changed PDFs are extracted in parallel; PDFs that disappeared
    /// are dropped. Files that fail to extract are reported and recorded so
    /// they are retried only once they change.
    ///
    /// If the scan itself is interrupted the cache is left untouched. If
    /// extraction is interrupted, the files that finished are still merged
    /// and persisted.
    ///
    /// # Errors
    ///
    /// Fails if the updated cache cannot be written. The in-memory cache is
    /// then left at its previous generation.
    pub fn sync(&self, progress: Option<Arc<dyn ProgressCallback>>) -> Result<SyncReport, SessionError> {
        let _merge = self.merge_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let started = Instant::now();
        let progress: Arc<dyn ProgressCallback> = progress.unwrap_or_else(|| Arc::new(NoProgress));

        progress.on_phase_start("scanning", 0);
        let resolver = self.scan();
        progress.on_phase_end("scanning");

        let mut report = SyncReport {
            discovered: resolver.len(),
            scan_errors: resolver.errors().iter().map(ToString::to_string).collect(),
            shadowed: resolver.shadowed(),
            workers: pool_size(self.config.max_workers),
            ..SyncReport::default()
        };

        if self.interrupted() {
            log::warn!("Scan interrupted, cache left unchanged");
            report.interrupted = true;
            report.elapsed_ms = elapsed_ms(started);
            return Ok(report);
        }

        let mut store = CacheStore::clone(&self.snapshot());
        let plan = store.sync_with_offline_roots(resolver.files(), resolver.offline_roots());
        report.valid = plan.valid;
        report.new = plan.new.len();
        report.stale = plan.stale.len();
        report.retained = plan.retained;
        report.known_failures = plan.known_failures;

        let extraction = ExtractionConfig::default()
            .with_max_workers(self.config.max_workers)
            .with_shutdown_flag(Arc::clone(&self.shutdown_flag))
            .with_progress_callback(Arc::clone(&progress))
            .with_timeout(self.config.extraction_timeout());
        let batch = extract_all(plan.to_extract(), self.extractor.as_ref(), &extraction);

        report.extracted = batch.extracted.len();
        report.skipped = batch.skipped.len();
        report.interrupted = batch.interrupted;
        report.timed_out = batch.timed_out;
        report.failed = batch
            .failures
            .iter()
            .map(|f| FailedFile {
                name: f.name.clone(),
                path: f.path.clone(),
                error: f.error.to_string(),
            })
            .collect();
        report.removed = plan.removed;

        let store = if report.changed() {
            let (files, failed) = batch.into_cache_parts();
            store.merge(files, failed);
            store.save(&self.config.cache_path)?;
            self.publish(store)
        } else {
            self.snapshot()
        };

        if report.changed() || self.index.row_count() != Some(store.len()) {
            progress.on_phase_start("indexing", store.len());
            report.indexed = self.reindex(&store);
            progress.on_phase_end("indexing");
        }

        report.elapsed_ms = elapsed_ms(started);
        log::info!("{} in {} ms", report.summary(), report.elapsed_ms);
        Ok(report)
    }

    /// Rebuild the index from `store`. A failed rebuild disables the index
    /// so searches fall back to scanning every cached file.
    fn reindex(&self, store: &CacheStore) -> Option<usize> {
        match self.index.rebuild(store) {
            Ok(rows) => Some(rows),
            Err(e) => {
                log::warn!("Failed to rebuild index: {}; searching without it", e);
                if let Err(e) = self.index.clear() {
                    log::warn!("Failed to clear index: {}", e);
                }
                None
            }
        }
    }

    /// Search the current cache generation for `keyword`.
    ///
    /// Files are ordered as the latest scan discovered them. Result paths
    /// come from the latest scan when the file was seen there,
    /// otherwise from the cache. With `apply_filter` the configured page and
    /// blacklist filter runs over the results.
    #[must_use]
    pub fn search(&self, keyword: &str, apply_filter: bool) -> Vec<MatchRecord> {
        let snapshot = self.snapshot();
        let resolver = self.resolver();
        let mut records = self
            .engine
            .search_ordered(&snapshot, keyword, |name| resolver.position(name));

        if !resolver.is_empty() {
            for record in &mut records {
                if let Some(entry) = resolver.entry(&record.filename) {
                    record.path.clone_from(&entry.path);
                }
            }
        }

        if apply_filter && self.config.filter.is_active() {
            let before = records.len();
            records = self.filter.apply(records);
            log::debug!("Filter removed {} of {} match(es)", before - records.len(), before);
        }
        records
    }

    /// Rebuild the index from the current cache generation.
    ///
    /// # Errors
    ///
    /// Returns the index error if the database cannot be written.
    pub fn rebuild_index(&self) -> Result<usize, SessionError> {
        let _merge = self.merge_lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.index.rebuild(&self.snapshot())?)
    }

    /// Delete the cache file and empty the index.
    ///
    /// # Errors
    ///
    /// Fails if the cache file exists but cannot be removed, or the index
    /// cannot be cleared.
    pub fn clear(&self) -> Result<(), SessionError> {
        let _merge = self.merge_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match fs::remove_file(&self.config.cache_path) {
            Ok(()) => log::info!("Removed {}", self.config.cache_path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.config.cache_path.clone(),
                    source,
                })
            }
        }
        self.index.clear()?;
        self.publish(CacheStore::new());
        Ok(())
    }

    /// Resolve a filename to its absolute path using the latest scan.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] (with a suggestion when a similar
    /// name exists) if no scan has seen the file.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, ResolveError> {
        self.resolver().resolve(filename)
    }

    /// Cache and index statistics.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        let snapshot = self.snapshot();
        SessionStats {
            roots: self.config.root_dirs.clone(),
            cached_files: snapshot.len(),
            total_pages: snapshot.total_pages(),
            failed_files: snapshot.failures().len(),
            indexed_files: self.index.row_count(),
            workers: pool_size(self.config.max_workers),
            cache_path: self.config.cache_path.clone(),
            cache_bytes: file_size(&self.config.cache_path),
            index_path: self.config.index_path.clone(),
            index_bytes: file_size(&self.config.index_path),
            updated_at: snapshot.metadata.updated_at,
        }
    }
}

fn file_size(path: &std::path::Path) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
