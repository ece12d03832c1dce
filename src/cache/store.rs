//! The in-memory cache store and its staleness classification.
//!
//! [`CacheStore::sync`] compares the files discovered on disk against the
//! stored entries and decides what needs re-extraction:
//!
//! | on disk | in cache | stored vs disk mtime | class           |
//! |---------|----------|----------------------|-----------------|
//! | yes     | no       | -                    | new             |
//! | yes     | yes      | stored < disk        | stale           |
//! | yes     | yes      | stored >= disk       | valid           |
//! | no      | yes      | -                    | removed         |
//!
//! The comparison is strict so that filesystems with coarse timestamps do
//! not cause endless re-extraction.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entry::PdfFile;
use crate::scanner::FileEntry;

/// Current version of the cache file format.
pub const CACHE_VERSION: u32 = 1;

/// Metadata stored alongside the cached files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Format version.
    pub version: u32,
    /// When the store was first created.
    pub created_at: DateTime<Utc>,
    /// When the store was last modified.
    pub updated_at: DateTime<Utc>,
    /// Files whose extraction failed, with the mtime they failed at.
    #[serde(default)]
    pub failed: BTreeMap<String, SystemTime>,
}

impl Default for CacheMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            version: CACHE_VERSION,
            created_at: now,
            updated_at: now,
            failed: BTreeMap::new(),
        }
    }
}

/// Classification of the discovered files against the store.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    /// Files whose cached text is still current
    pub valid: usize,
    /// Files never extracted before
    pub new: Vec<FileEntry>,
    /// Files whose on-disk mtime advanced past the stored one
    pub stale: Vec<FileEntry>,
    /// Cached filenames no longer present on disk (already dropped)
    pub removed: Vec<String>,
    /// Files that failed before and have not changed since
    pub known_failures: usize,
    /// Cached files kept because their root could not be listed
    pub retained: usize,
}

impl SyncPlan {
    /// Files that need (re-)extraction: new first, then stale.
    #[must_use]
    pub fn to_extract(&self) -> Vec<FileEntry> {
        self.new.iter().chain(self.stale.iter()).cloned().collect()
    }

    /// Whether the sync changes nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.new.is_empty() && self.stale.is_empty() && self.removed.is_empty()
    }
}

/// Mapping from filename to extracted magazine, plus metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStore {
    /// Store metadata
    pub metadata: CacheMetadata,
    /// Cached files keyed by filename
    files: BTreeMap<String, PdfFile>,
}

impl CacheStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cached file.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PdfFile> {
        self.files.get(name)
    }

    /// Whether a filename is cached.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    /// Iterate cached files in filename order.
    pub fn files(&self) -> impl Iterator<Item = &PdfFile> {
        self.files.values()
    }

    /// Iterate cached filenames in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of cached files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total number of cached pages.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.files.values().map(PdfFile::page_count).sum()
    }

    /// Insert or replace an entry wholesale.
    pub fn insert(&mut self, file: PdfFile) {
        self.metadata.failed.remove(&file.name);
        self.files.insert(file.name.clone(), file);
    }

    /// Remove an entry.
    pub fn remove(&mut self, name: &str) -> Option<PdfFile> {
        self.metadata.failed.remove(name);
        self.files.remove(name)
    }

    /// Record that extraction of `name` failed at `mtime`.
    ///
    /// Any previously cached text for the file is dropped: it no longer
    /// reflects the file on disk.
    pub fn record_failure(&mut self, name: &str, mtime: SystemTime) {
        self.files.remove(name);
        self.metadata.failed.insert(name.to_string(), mtime);
    }

    /// Files recorded as failed.
    #[must_use]
    pub fn failures(&self) -> &BTreeMap<String, SystemTime> {
        &self.metadata.failed
    }

    /// Classify `discovered` against the store and drop removed entries.
    ///
    /// Valid entries are left untouched. The returned plan lists new and
    /// stale files for the extraction pool.
    pub fn sync(&mut self, discovered: &[FileEntry]) -> SyncPlan {
        self.sync_with_offline_roots(discovered, &[])
    }

    /// Like [`sync`](Self::sync), but cached files located under one of
    /// `offline` are kept instead of being treated as removed.
    pub fn sync_with_offline_roots(
        &mut self,
        discovered: &[FileEntry],
        offline: &[PathBuf],
    ) -> SyncPlan {
        let mut plan = SyncPlan::default();
        let on_disk: HashSet<&str> = discovered.iter().map(|f| f.name.as_str()).collect();

        for entry in discovered {
            match self.files.get(&entry.name) {
                None => match self.metadata.failed.get(&entry.name) {
                    Some(failed_at) if entry.modified <= *failed_at => {
                        log::trace!("Known failure, unchanged: {}", entry.name);
                        plan.known_failures += 1;
                    }
                    _ => plan.new.push(entry.clone()),
                },
                Some(cached) if cached.mtime < entry.modified => {
                    log::debug!("Stale: {}", entry.name);
                    plan.stale.push(entry.clone());
                }
                Some(_) => plan.valid += 1,
            }
        }

        for (name, file) in &self.files {
            if on_disk.contains(name.as_str()) {
                continue;
            }
            if offline.iter().any(|root| file.path.starts_with(root)) {
                plan.retained += 1;
            } else {
                plan.removed.push(name.clone());
            }
        }
        for name in &plan.removed {
            log::debug!("Removed from disk: {}", name);
            self.files.remove(name);
        }
        self.metadata
            .failed
            .retain(|name, _| on_disk.contains(name.as_str()));

        if !plan.removed.is_empty() {
            self.touch();
        }

        log::info!(
            "Cache sync: {} valid, {} new, {} stale, {} removed, {} retained, {} known failure(s)",
            plan.valid,
            plan.new.len(),
            plan.stale.len(),
            plan.removed.len(),
            plan.retained,
            plan.known_failures
        );
        plan
    }

    /// Merge one extraction batch into the store.
    pub fn merge(
        &mut self,
        extracted: impl IntoIterator<Item = PdfFile>,
        failed: impl IntoIterator<Item = (String, SystemTime)>,
    ) {
        for file in extracted {
            self.insert(file);
        }
        for (name, mtime) in failed {
            self.record_failure(&name, mtime);
        }
        self.touch();
    }

    /// Update the modification timestamp.
    pub fn touch(&mut self) {
        self.metadata.updated_at = Utc::now();
    }
}
