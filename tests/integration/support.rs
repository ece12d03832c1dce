//! Shared fixtures for the integration tests.
//!
//! Test "PDFs" are plain UTF-8 files whose pages are separated by form
//! feeds; [`TextExtractor`] reads them back. A file whose content starts
//! with `CORRUPT` fails to extract.

use magsearch::config::Config;
use magsearch::retry::RetryPolicy;
use magsearch::scanner::{ExtractError, PageExtractor};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub struct TextExtractor {
    delay: Duration,
}

impl TextExtractor {
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    /// Sleep for `delay` on every file to simulate parser cost.
    pub fn slow(delay: Duration) -> Self {
        Self { delay }
    }
}

impl PageExtractor for TextExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let text = fs::read_to_string(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if text.starts_with("CORRUPT") {
            return Err(ExtractError::Pdf {
                path: path.to_path_buf(),
                message: "invalid cross-reference table".into(),
            });
        }
        Ok(text.split('\x0c').map(str::to_string).collect())
    }
}

/// Write a test PDF with the given pages.
pub fn write_pdf(dir: &Path, name: &str, pages: &[&str]) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, pages.join("\x0c")).unwrap();
    path
}

/// Set a file's modification time to `secs` after the epoch.
pub fn set_mtime(path: &Path, secs: i64) {
    filetime::set_file_mtime(path, filetime::FileTime::from_unix_time(secs, 0)).unwrap();
}

pub fn mtime(path: &Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

/// Configuration keeping all state under `state` and scanning `roots`.
pub fn config_for(state: &Path, roots: Vec<PathBuf>) -> Config {
    Config {
        root_dirs: roots,
        cache_path: state.join("pdf_cache.json"),
        index_path: state.join("text_index.db"),
        max_workers: 4,
        retry: RetryPolicy::none(),
        ..Config::default()
    }
}
