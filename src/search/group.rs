//! Grouping of match records by file.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use super::MatchRecord;

/// All matches found in one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileGroup {
    /// Cache key of the file
    pub filename: String,
    /// Absolute path of the file
    pub path: PathBuf,
    /// Number of pages in the file
    pub page_count: usize,
    /// Matches in page/offset order
    pub matches: Vec<MatchRecord>,
}

impl FileGroup {
    /// Number of matches in the file.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Whether the group holds no matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Distinct page numbers with at least one match, ascending.
    #[must_use]
    pub fn pages(&self) -> Vec<usize> {
        let mut pages: Vec<usize> = self.matches.iter().map(|m| m.page).collect();
        pages.dedup();
        pages
    }
}

/// Group records by file, files with the most matches first.
///
/// Files with equal counts keep the order in which they first appear in
/// `records`. Records inside a group keep their relative order.
#[must_use]
pub fn group_by_file(records: Vec<MatchRecord>) -> Vec<FileGroup> {
    let mut groups: Vec<FileGroup> = Vec::new();
    let mut slot: HashMap<String, usize> = HashMap::new();

    for record in records {
        let idx = *slot.entry(record.filename.clone()).or_insert_with(|| {
            groups.push(FileGroup {
                filename: record.filename.clone(),
                path: record.path.clone(),
                page_count: record.page_count,
                matches: Vec::new(),
            });
            groups.len() - 1
        });
        groups[idx].matches.push(record);
    }

    groups.sort_by(|a, b| b.len().cmp(&a.len()));
    groups
}
