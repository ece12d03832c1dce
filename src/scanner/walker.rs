//! PDF discovery over one root directory using jwalk.
//!
//! # Overview
//!
//! The [`Walker`] lists the PDF files under a root directory, either just
//! the direct children (the default, matching a flat folder per magazine
//! title) or the whole tree when `recursive` is set. Children are sorted by
//! name so discovery order is deterministic.
//!
//! # Features
//!
//! - Flat or recursive traversal
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Hidden file filtering
//! - Retried metadata reads for flaky network shares
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use magsearch::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/mnt/mags/Tourenfahrer"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.name, file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::path_utils::{file_name_key, is_pdf};
use super::{FileEntry, ScanError, WalkerConfig};
use crate::retry::is_transient;

/// Directory walker for PDF discovery under a single root.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given root.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build gitignore matcher from the configured patterns.
    fn build_gitignore(&self) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(&self.root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    fn should_ignore(&self, path: &Path, gitignore: &Option<Gitignore>) -> bool {
        let Some(gi) = gitignore else {
            return false;
        };
        let relative_path = path.strip_prefix(&self.root).unwrap_or(path);
        let path_str = relative_path.to_string_lossy();
        let normalized_path = if cfg!(windows) {
            path_str.replace('\\', "/")
        } else {
            path_str.into_owned()
        };
        gi.matched_path_or_any_parents(normalized_path, false)
            .is_ignore()
    }

    /// Verify the root is a readable directory, retrying transient failures.
    fn check_root(&self) -> Result<(), ScanError> {
        let what = format!("list {}", self.root.display());
        self.config
            .retry
            .run(&what, is_transient, || std::fs::read_dir(&self.root).map(|_| ()))
            .map_err(|e| self.map_io_error(&self.root, e))?;
        Ok(())
    }

    /// Walk the root, yielding one entry per PDF file found.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. A missing or unreadable root yields exactly one error.
    pub fn walk(&self) -> Box<dyn Iterator<Item = Result<FileEntry, ScanError>> + '_> {
        if !self.root.is_dir() {
            let err = if self.root.exists() {
                ScanError::NotADirectory(self.root.clone())
            } else {
                ScanError::NotFound(self.root.clone())
            };
            log::warn!("Skipping root: {}", err);
            return Box::new(std::iter::once(Err(err)));
        }
        if let Err(e) = self.check_root() {
            log::warn!("Skipping root: {}", e);
            return Box::new(std::iter::once(Err(e)));
        }

        let gitignore = self.build_gitignore();
        let max_depth = if self.config.recursive { usize::MAX } else { 1 };

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(self.config.skip_hidden)
            .max_depth(max_depth)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        Box::new(walk_dir.into_iter().filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return None;
            }

            match entry_result {
                Ok(entry) => {
                    let path = entry.path();
                    let file_type = entry.file_type();
                    if path == self.root || file_type.is_dir() {
                        return None;
                    }
                    if !is_pdf(&path) {
                        return None;
                    }
                    if self.should_ignore(&path, &gitignore) {
                        log::trace!("Ignoring file: {}", path.display());
                        return None;
                    }
                    Some(self.process_file_entry(path))
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    Some(Err(ScanError::Io {
                        path,
                        source: std::io::Error::other(e.to_string()),
                    }))
                }
            }
        }))
    }

    /// Stat a discovered PDF and build its [`FileEntry`].
    fn process_file_entry(&self, path: PathBuf) -> Result<FileEntry, ScanError> {
        let what = format!("stat {}", path.display());
        let metadata = self
            .config
            .retry
            .run(&what, is_transient, || std::fs::metadata(&path))
            .map_err(|e| self.map_io_error(&path, e))?;

        if !metadata.is_file() {
            return Err(ScanError::NotFound(path));
        }

        let name = file_name_key(&path).ok_or_else(|| ScanError::NotFound(path.clone()))?;
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let path = std::path::absolute(&path).unwrap_or(path);

        Ok(FileEntry::new(name, path, metadata.len(), modified))
    }

    fn map_io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path.to_path_buf())
            }
            ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path.to_path_buf())
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                }
            }
        }
    }
}
