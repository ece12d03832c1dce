//! Cache entry definitions.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One extracted magazine in the cache.
///
/// Page texts are shared (`Arc<str>`) so that snapshots of the cache and
/// search results can hand them out without copying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfFile {
    /// NFC-normalized bare filename (unique key)
    pub name: String,
    /// Absolute path at the time of extraction
    pub path: PathBuf,
    /// Modification time observed when the file was scanned for extraction
    pub mtime: SystemTime,
    /// Page texts in page order, whitespace-normalized
    pub pages: Vec<Arc<str>>,
    /// When the extraction finished
    pub extracted_at: DateTime<Utc>,
}

impl PdfFile {
    /// Create a new entry stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>, path: PathBuf, mtime: SystemTime, pages: Vec<String>) -> Self {
        Self {
            name: name.into(),
            path,
            mtime,
            pages: pages.into_iter().map(Arc::from).collect(),
            extracted_at: Utc::now(),
        }
    }

    /// Number of pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All pages joined with a single space.
    #[must_use]
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(" ")
    }
}
