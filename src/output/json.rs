//! JSON output formatter for search results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "keyword": "BMW",
//!   "matches": [
//!     {
//!       "filename": "Ride_2023_04.pdf",
//!       "page": 2,
//!       "offset": 27,
//!       "snippet": "... the BMW R 1250 GS ...",
//!       "highlight": { "start": 8, "end": 11 },
//!       "page_count": 84,
//!       "path": "/mnt/mags/Ride_2023_04.pdf"
//!     }
//!   ],
//!   "summary": {
//!     "total_matches": 1,
//!     "files": 1,
//!     "exit_code": 0,
//!     "exit_code_name": "MS000"
//!   }
//! }
//! ```
//!
//! With grouping enabled, `matches` is replaced by `groups`, one object per
//! file with its matches nested inside.

use std::io::Write;

use serde::Serialize;

use crate::error::ExitCode;
use crate::search::{FileGroup, MatchRecord};

/// Summary block of the JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Number of matches
    pub total_matches: usize,
    /// Number of distinct files with matches
    pub files: usize,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "MS000")
    pub exit_code_name: String,
}

/// Complete JSON output structure.
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a> {
    /// The keyword as searched
    pub keyword: &'a str,
    /// Flat match list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<&'a [MatchRecord]>,
    /// Matches grouped per file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<&'a [FileGroup]>,
    /// Summary statistics
    pub summary: JsonSummary,
}

impl<'a> JsonOutput<'a> {
    /// Flat output.
    #[must_use]
    pub fn new(keyword: &'a str, records: &'a [MatchRecord], exit_code: ExitCode) -> Self {
        let mut files: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
        files.dedup();
        Self {
            keyword,
            matches: Some(records),
            groups: None,
            summary: summary(records.len(), files.len(), exit_code),
        }
    }

    /// Grouped output.
    #[must_use]
    pub fn grouped(keyword: &'a str, groups: &'a [FileGroup], exit_code: ExitCode) -> Self {
        let total = groups.iter().map(FileGroup::len).sum();
        Self {
            keyword,
            matches: None,
            groups: Some(groups),
            summary: summary(total, groups.len(), exit_code),
        }
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        write_json(writer, self)
    }
}

fn summary(total_matches: usize, files: usize, exit_code: ExitCode) -> JsonSummary {
    JsonSummary {
        total_matches,
        files,
        exit_code: exit_code.as_i32(),
        exit_code_name: exit_code.code_prefix().to_string(),
    }
}

/// Write any serializable value as pretty JSON followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write, T: Serialize + ?Sized>(
    writer: &mut W,
    value: &T,
) -> Result<(), JsonOutputError> {
    let json = serde_json::to_string_pretty(value)?;
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
