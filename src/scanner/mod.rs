//! Scanner module for PDF discovery, path resolution and page extraction.
//!
//! This module provides functionality for:
//! - Walking the configured root directories for PDF files using jwalk
//! - Building the filename → absolute path lookup ([`PathResolver`])
//! - Extracting per-page text from a single PDF ([`PdfPageExtractor`])
//! - Unicode filename normalization
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and PDF discovery
//! - [`resolver`]: Filename → path lookup across roots (last root wins)
//! - [`document`]: The [`PageExtractor`] seam and its pdf-extract implementation
//! - [`path_utils`]: NFC normalization of filename keys
//!
//! # Example
//!
//! ```no_run
//! use magsearch::scanner::{PathResolver, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let roots = vec![PathBuf::from("/mnt/mags/Ride"), PathBuf::from("/mnt/mags/Bike")];
//! let resolver = PathResolver::build(&roots, &WalkerConfig::default());
//! match resolver.resolve("Ride_2023_04.pdf") {
//!     Ok(path) => println!("{}", path.display()),
//!     Err(e) => eprintln!("Warning: {}", e),
//! }
//! ```

pub mod document;
pub mod path_utils;
pub mod resolver;
pub mod walker;

use std::path::PathBuf;
use std::time::SystemTime;

// Re-export main types
pub use document::{ExtractError, PageExtractor, PdfPageExtractor};
pub use resolver::{PathResolver, ResolveError};
pub use walker::Walker;

/// Metadata for a discovered PDF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// NFC-normalized bare filename (the cache key)
    pub name: String,
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

impl FileEntry {
    /// Create a new FileEntry.
    ///
    /// # Arguments
    ///
    /// * `name` - Normalized filename key
    /// * `path` - Absolute path to the file
    /// * `size` - File size in bytes
    /// * `modified` - Last modification time
    #[must_use]
    pub fn new(name: impl Into<String>, path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            name: name.into(),
            path,
            size,
            modified,
        }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Descend into subdirectories of each root.
    /// When false only the root's direct children are listed.
    pub recursive: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,

    /// Transient I/O retry policy for listing and metadata reads.
    pub retry: crate::retry::RetryPolicy,
}

impl WalkerConfig {
    /// Create a new walker configuration.
    #[must_use]
    pub fn new(recursive: bool, skip_hidden: bool, ignore_patterns: Vec<String>) -> Self {
        Self {
            recursive,
            skip_hidden,
            ignore_patterns,
            retry: crate::retry::RetryPolicy::default(),
        }
    }

    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: crate::retry::RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::PermissionDenied(path) | Self::NotFound(path) | Self::NotADirectory(path) => path,
            Self::Io { path, .. } => path,
        }
    }
}
