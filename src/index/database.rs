//! SQLite-backed text index.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};
use thiserror::Error;

use crate::cache::{CacheStore, PdfFile};
use crate::search::fold_case;

const CREATE_TEXT_INDEX_TABLE: &str = r#"
CREATE TABLE text_index (
    filename   TEXT PRIMARY KEY,
    full_text  TEXT NOT NULL,
    page_count INTEGER NOT NULL
)
"#;

/// Errors from building or maintaining the index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The index directory could not be created.
    #[error("Failed to create index directory {path}: {source}")]
    Io {
        /// Directory path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The database could not be opened.
    #[error("Failed to open index database {path}: {source}")]
    Open {
        /// Database path
        path: PathBuf,
        /// The underlying SQLite error
        #[source]
        source: rusqlite::Error,
    },

    /// A statement failed.
    #[error("Index database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result alias for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// One row of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    /// Cache key of the file
    pub filename: String,
    /// All pages joined with a single space, case-folded
    pub full_text: String,
    /// Number of pages
    pub page_count: usize,
}

impl IndexRow {
    /// Derive the row for a cached file.
    #[must_use]
    pub fn from_pdf(file: &PdfFile) -> Self {
        Self {
            filename: file.name.clone(),
            full_text: fold_case(&file.full_text()),
            page_count: file.page_count(),
        }
    }
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Handle on the index database at a fixed path.
///
/// Every operation opens its own connection, so the handle can be shared
/// across threads freely.
#[derive(Debug, Clone)]
pub struct TextIndex {
    path: PathBuf,
}

impl TextIndex {
    /// Create a handle. Nothing is touched on disk until the first rebuild.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_rw(&self) -> IndexResult<Connection> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| IndexError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Connection::open(&self.path).map_err(|source| IndexError::Open {
            path: self.path.clone(),
            source,
        })
    }

    fn open_ro(&self) -> Option<Connection> {
        if !self.path.is_file() {
            return None;
        }
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| log::debug!("Index unavailable at {}: {}", self.path.display(), e))
        .ok()
    }

    /// Drop and recreate the index from `cache`.
    ///
    /// The whole rebuild runs in one transaction; on failure the previous
    /// index is left as it was.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if the database cannot be opened or written.
    pub fn rebuild(&self, cache: &CacheStore) -> IndexResult<usize> {
        let mut conn = self.open_rw()?;
        let tx = conn.transaction()?;

        tx.execute("DROP TABLE IF EXISTS text_index", [])?;
        tx.execute(CREATE_TEXT_INDEX_TABLE, [])?;

        let mut rows = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO text_index (filename, full_text, page_count) VALUES (?1, ?2, ?3)",
            )?;
            for file in cache.files() {
                let row = IndexRow::from_pdf(file);
                stmt.execute(params![row.filename, row.full_text, row.page_count as i64])?;
                rows += 1;
            }
        }

        tx.commit()?;
        log::info!("Rebuilt text index with {} file(s)", rows);
        Ok(rows)
    }

    /// Filenames whose concatenated text contains `keyword`, ignoring case.
    ///
    /// Returns `None` when the index has never been built or cannot be
    /// read; the caller should then scan every cached file.
    #[must_use]
    pub fn query_candidates(&self, keyword: &str) -> Option<HashSet<String>> {
        let conn = self.open_ro()?;
        let pattern = format!("%{}%", escape_like(&fold_case(keyword)));

        let query = || -> rusqlite::Result<HashSet<String>> {
            let mut stmt = conn
                .prepare("SELECT filename FROM text_index WHERE full_text LIKE ?1 ESCAPE '\\'")?;
            let names = stmt.query_map(params![pattern], |row| row.get::<_, String>(0))?;
            let names = names.collect::<rusqlite::Result<HashSet<String>>>();
            names
        };

        match query() {
            Ok(names) => {
                log::debug!("Index: {} candidate file(s) for {:?}", names.len(), keyword);
                Some(names)
            }
            Err(e) => {
                log::debug!("Index query failed, falling back to full scan: {}", e);
                None
            }
        }
    }

    /// Number of indexed files, or `None` if the index is unavailable.
    #[must_use]
    pub fn row_count(&self) -> Option<usize> {
        let conn = self.open_ro()?;
        conn.query_row("SELECT COUNT(*) FROM text_index", [], |row| row.get::<_, i64>(0))
            .ok()
            .map(|n| n as usize)
    }

    /// Read one row back.
    #[must_use]
    pub fn row(&self, filename: &str) -> Option<IndexRow> {
        let conn = self.open_ro()?;
        conn.query_row(
            "SELECT filename, full_text, page_count FROM text_index WHERE filename = ?1",
            params![filename],
            |row| {
                Ok(IndexRow {
                    filename: row.get(0)?,
                    full_text: row.get(1)?,
                    page_count: row.get::<_, i64>(2)? as usize,
                })
            },
        )
        .ok()
    }

    /// Drop the index table. Searches fall back to a full scan afterwards.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if the database exists but cannot be
    /// modified.
    pub fn clear(&self) -> IndexResult<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let conn = self.open_rw()?;
        conn.execute("DROP TABLE IF EXISTS text_index", [])?;
        log::info!("Cleared text index at {}", self.path.display());
        Ok(())
    }
}
