//! Per-page PDF text extraction and normalization.
//!
//! The [`PageExtractor`] trait is the seam between the extraction pool and
//! the PDF library: the pool only needs "path in, page texts out". The
//! default implementation, [`PdfPageExtractor`], reads the file (retrying
//! transient share errors) and runs pdf-extract page by page.
//!
//! Extraction is all-or-nothing per file. Any failure, including a panic
//! inside the PDF parser on a malformed document, is reported as an
//! [`ExtractError`] for that file only.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::retry::{is_transient, RetryPolicy};

/// Errors that can occur while extracting one document.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The PDF could not be parsed (corrupt, encrypted, unsupported).
    #[error("Failed to extract text from PDF {path}: {message}")]
    Pdf {
        /// Path to the PDF file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// The PDF parser panicked on this document.
    #[error("PDF parser crashed on {path}: {message}")]
    Panicked {
        /// Path to the PDF file
        path: PathBuf,
        /// Panic payload, if it was a string
        message: String,
    },
}

impl ExtractError {
    /// Path of the document that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Pdf { path, .. } | Self::Panicked { path, .. } => path,
        }
    }
}

/// Produces the ordered page texts of one document.
///
/// Implementations must be safe to call from several worker threads at
/// once and must not share mutable state between calls.
pub trait PageExtractor: Send + Sync {
    /// Extract every page's text, in page order.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractError`] if the document cannot be read or parsed.
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, ExtractError>;
}

/// pdf-extract backed page extractor.
#[derive(Debug, Clone, Default)]
pub struct PdfPageExtractor {
    retry: RetryPolicy,
}

impl PdfPageExtractor {
    /// Create an extractor using the given retry policy for file reads.
    #[must_use]
    pub fn new(retry: RetryPolicy) -> Self {
        Self { retry }
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, ExtractError> {
        let what = format!("read {}", path.display());
        self.retry
            .run(&what, is_transient, || fs::read(path))
            .map_err(|source| ExtractError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}

impl PageExtractor for PdfPageExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        let bytes = self.read(path)?;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&bytes)
        }));

        match outcome {
            Ok(Ok(pages)) => Ok(pages.iter().map(|p| normalize_page(p)).collect()),
            Ok(Err(e)) => Err(ExtractError::Pdf {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(ExtractError::Panicked {
                    path: path.to_path_buf(),
                    message,
                })
            }
        }
    }
}

/// Collapse every whitespace run to a single space and trim the ends.
#[must_use]
pub fn normalize_page(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
