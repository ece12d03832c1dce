//! Filename → absolute path lookup across the configured roots.
//!
//! The resolver is built once per session by walking every root in
//! configuration order. When the same filename appears under more than one
//! root, the root scanned **last** wins; the shadowed path is logged at
//! debug level and counted in [`PathResolver::shadowed`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use thiserror::Error;

use super::path_utils::{file_name_key, normalize_name};
use super::{FileEntry, ScanError, Walker, WalkerConfig};

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.85;

/// Errors returned by [`PathResolver::resolve`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The filename was not seen during the scan.
    #[error("PDF not found: {name}{}", suggestion_hint(.suggestion))]
    NotFound {
        /// The requested filename
        name: String,
        /// Closest known filename, if any is similar enough
        suggestion: Option<String>,
    },
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean '{s}'?)"))
        .unwrap_or_default()
}

/// In-memory filename → path lookup built from one scan of all roots.
#[derive(Debug, Default)]
pub struct PathResolver {
    /// Discovered files in discovery order (after last-write-wins replacement)
    files: Vec<FileEntry>,
    /// Filename key → position in `files`
    by_name: HashMap<String, usize>,
    /// Non-fatal errors encountered while scanning
    errors: Vec<ScanError>,
    /// Number of entries replaced by a later root
    shadowed: usize,
    /// Roots that could not be listed at all
    offline_roots: Vec<PathBuf>,
}

impl PathResolver {
    /// Scan all roots and build the lookup.
    #[must_use]
    pub fn build(roots: &[PathBuf], config: &WalkerConfig) -> Self {
        Self::scan(roots, config, None)
    }

    /// Scan all roots, stopping early when `shutdown_flag` is raised.
    #[must_use]
    pub fn scan(
        roots: &[PathBuf],
        config: &WalkerConfig,
        shutdown_flag: Option<Arc<AtomicBool>>,
    ) -> Self {
        let mut resolver = Self::default();

        for root in roots {
            let mut walker = Walker::new(root, config.clone());
            if let Some(ref flag) = shutdown_flag {
                walker = walker.with_shutdown_flag(Arc::clone(flag));
            }

            let before = resolver.files.len();
            for result in walker.walk() {
                match result {
                    Ok(entry) => resolver.insert(entry),
                    Err(e) => {
                        if e.path() == root.as_path() {
                            resolver.offline_roots.push(root.clone());
                        }
                        resolver.errors.push(e);
                    }
                }
            }
            log::debug!(
                "Scanned {}: {} new PDF(s)",
                root.display(),
                resolver.files.len() - before
            );
        }

        log::info!(
            "Path resolver: {} PDF(s) across {} root(s), {} shadowed, {} error(s)",
            resolver.files.len(),
            roots.len(),
            resolver.shadowed,
            resolver.errors.len()
        );
        resolver
    }

    /// Build a resolver from pre-discovered entries (later entries win).
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = FileEntry>) -> Self {
        let mut resolver = Self::default();
        for entry in entries {
            resolver.insert(entry);
        }
        resolver
    }

    fn insert(&mut self, entry: FileEntry) {
        match self.by_name.get(&entry.name) {
            Some(&idx) => {
                log::debug!(
                    "{} shadows {}",
                    entry.path.display(),
                    self.files[idx].path.display()
                );
                self.files[idx] = entry;
                self.shadowed += 1;
            }
            None => {
                self.by_name.insert(entry.name.clone(), self.files.len());
                self.files.push(entry);
            }
        }
    }

    /// Resolve a filename (or any path ending in a known filename) to its
    /// absolute path.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::NotFound`] if the filename was not seen
    /// during the scan. Callers should skip the file and continue.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, ResolveError> {
        self.entry(filename)
            .map(|e| e.path.clone())
            .ok_or_else(|| ResolveError::NotFound {
                name: filename.to_string(),
                suggestion: self.suggest(filename),
            })
    }

    /// Look up the full entry for a filename.
    #[must_use]
    pub fn entry(&self, filename: &str) -> Option<&FileEntry> {
        let key = normalize_name(filename);
        let idx = self.by_name.get(&key).or_else(|| {
            file_name_key(Path::new(filename)).and_then(|base| self.by_name.get(&base))
        })?;
        self.files.get(*idx)
    }

    fn suggest(&self, filename: &str) -> Option<String> {
        let wanted = normalize_name(filename).to_lowercase();
        self.by_name
            .keys()
            .map(|k| (strsim::jaro_winkler(&wanted, &k.to_lowercase()), k))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.0.total_cmp(&b.0).then_with(|| b.1.cmp(a.1)))
            .map(|(_, k)| k.clone())
    }

    /// Discovery position of a filename key, if it was seen.
    ///
    /// A file found under several roots keeps the position of its first
    /// discovery.
    #[must_use]
    pub fn position(&self, filename: &str) -> Option<usize> {
        self.by_name.get(filename).copied()
    }

    /// All discovered files in discovery order.
    #[must_use]
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Non-fatal errors encountered while scanning.
    #[must_use]
    pub fn errors(&self) -> &[ScanError] {
        &self.errors
    }

    /// Number of entries replaced by a later root.
    #[must_use]
    pub fn shadowed(&self) -> usize {
        self.shadowed
    }

    /// Roots that were missing or unreadable during the scan.
    #[must_use]
    pub fn offline_roots(&self) -> &[PathBuf] {
        &self.offline_roots
    }

    /// Number of distinct filenames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no PDF was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
