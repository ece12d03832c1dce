//! CSV output formatter for search results.
//!
//! One row is written per match.
//!
//! # Columns
//!
//! - `filename`: Cache key of the magazine
//! - `page`: 1-based page number
//! - `page_count`: Pages in the magazine
//! - `offset`: Character offset of the match within the page
//! - `matched`: The matched text as it appears on the page
//! - `snippet`: Context window around the match
//! - `path`: Absolute path to the file
//!
//! # Example
//!
//! ```no_run
//! use magsearch::output::csv::CsvOutput;
//!
//! let output = CsvOutput::new(&[]);
//! output.write_to(std::io::stdout()).unwrap();
//! ```

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::search::MatchRecord;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    filename: &'a str,
    page: usize,
    page_count: usize,
    offset: usize,
    matched: &'a str,
    snippet: &'a str,
    path: String,
}

impl<'a> From<&'a MatchRecord> for CsvRow<'a> {
    fn from(record: &'a MatchRecord) -> Self {
        Self {
            filename: &record.filename,
            page: record.page,
            page_count: record.page_count,
            offset: record.offset,
            matched: record.matched(),
            snippet: &record.snippet,
            path: record.path.to_string_lossy().into_owned(),
        }
    }
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    records: &'a [MatchRecord],
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(records: &'a [MatchRecord]) -> Self {
        Self { records }
    }

    /// Write the CSV output to the given writer.
    ///
    /// The header row is written even when there are no matches.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        if self.records.is_empty() {
            csv_writer.write_record([
                "filename",
                "page",
                "page_count",
                "offset",
                "matched",
                "snippet",
                "path",
            ])?;
        }
        for record in self.records {
            csv_writer.serialize(CsvRow::from(record))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
