//! Keyword search over cached page texts.
//!
//! # Overview
//!
//! A search runs in two tiers:
//! 1. **Candidates**: the [`TextIndex`](crate::index::TextIndex) narrows the
//!    cached files to those whose concatenated text contains the keyword.
//!    When the index is unavailable every cached file is a candidate.
//! 2. **Page scan**: each candidate's pages are scanned for every
//!    case-insensitive occurrence (see [`context`]), producing one
//!    [`MatchRecord`] per occurrence.
//!
//! Results are ordered by file discovery order, then page, then offset within
//! the page. Files the path resolver has not seen follow in filename order.
//! [`filter`] and [`group`] are optional stages applied to the result list.

pub mod context;
pub mod engine;
pub mod filter;
pub mod group;

use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

pub use context::{find_matches, fold_case, ContextWindow, Snippet, CONTEXT_CHARS};
pub use engine::{scan, scan_ordered, SearchEngine, SearchOptions, PARALLEL_PAGE_THRESHOLD};
pub use filter::{FilterConfig, PostFilter};
pub use group::{group_by_file, FileGroup};

/// One occurrence of the keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    /// Cache key of the file
    pub filename: String,
    /// 1-based page number
    pub page: usize,
    /// Character offset of the match within the page
    pub offset: usize,
    /// Context window around the match
    pub snippet: String,
    /// Byte range of the match inside `snippet`
    pub highlight: Range<usize>,
    /// Number of pages in the file
    pub page_count: usize,
    /// Absolute path of the file
    pub path: PathBuf,
    /// The whole page the match was found on
    #[serde(skip)]
    pub page_text: Arc<str>,
}

impl MatchRecord {
    /// The matched text as it appears on the page.
    #[must_use]
    pub fn matched(&self) -> &str {
        self.snippet.get(self.highlight.clone()).unwrap_or_default()
    }
}
