//! Durable storage for the cache store.
//!
//! The whole store is written as one JSON document wrapped in an envelope
//! carrying a SHA-256 checksum of the payload. Writes go to a temporary
//! file in the destination directory which is then renamed over the
//! target, so a crash mid-write leaves the previous file intact.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;

use super::store::{CacheStore, CACHE_VERSION};

/// Errors from loading or saving the cache file.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the cache file failed.
    #[error("Cache I/O error for {path}: {source}")]
    Io {
        /// Cache file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The store could not be serialized.
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The file exists but its content is not a valid cache.
    #[error("Cache file {path} is corrupted: {reason}")]
    Corrupt {
        /// Cache file path
        path: PathBuf,
        /// What was wrong
        reason: String,
    },

    /// The file was written by an incompatible version.
    #[error("Unsupported cache version: {found}. Current version is {expected}.")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Version this build writes
        expected: u32,
    },
}

/// Result alias for cache persistence.
pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Serialize, Deserialize)]
struct CacheEnvelope {
    /// SHA-256 of the exact `store` bytes.
    checksum: String,
    store: Box<RawValue>,
}

#[derive(Deserialize)]
struct VersionProbe {
    metadata: MetadataProbe,
}

#[derive(Deserialize)]
struct MetadataProbe {
    version: u32,
}

fn checksum(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl CacheStore {
    /// Atomically replace the cache file at `path` with this store.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if serialization or any filesystem step
    /// fails. The previous file at `path` is left untouched in that case.
    pub fn save(&self, path: &Path) -> CacheResult<()> {
        let io_err = |source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };

        let payload = serde_json::value::to_raw_value(self)?;
        let envelope = CacheEnvelope {
            checksum: checksum(payload.get()),
            store: payload,
        };

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, &envelope)?;
            writer.flush().map_err(io_err)?;
        }
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;

        log::debug!(
            "Saved cache with {} file(s) to {}",
            self.len(),
            path.display()
        );
        Ok(())
    }

    /// Load the cache file at `path`.
    ///
    /// A missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Corrupt`] on parse or checksum failure,
    /// [`CacheError::UnsupportedVersion`] for a foreign format version, and
    /// [`CacheError::Io`] if the file exists but cannot be read.
    pub fn load(path: &Path) -> CacheResult<Self> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No cache at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let corrupt = |reason: String| CacheError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        let envelope: CacheEnvelope = serde_json::from_str(&content)
            .map_err(|e| corrupt(format!("invalid envelope: {e}")))?;

        if checksum(envelope.store.get()) != envelope.checksum {
            return Err(corrupt("checksum mismatch".to_string()));
        }

        let probe: VersionProbe = serde_json::from_str(envelope.store.get())
            .map_err(|e| corrupt(format!("missing metadata: {e}")))?;
        if probe.metadata.version != CACHE_VERSION {
            return Err(CacheError::UnsupportedVersion {
                found: probe.metadata.version,
                expected: CACHE_VERSION,
            });
        }

        let store: CacheStore = serde_json::from_str(envelope.store.get())
            .map_err(|e| corrupt(format!("invalid store: {e}")))?;

        log::debug!(
            "Loaded cache with {} file(s) from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// Load the cache, discarding a corrupted or incompatible file.
    ///
    /// The discarded store is rebuilt by the next sync.
    ///
    /// # Errors
    ///
    /// Only I/O failures other than "not found" are returned.
    pub fn load_or_rebuild(path: &Path) -> CacheResult<Self> {
        match Self::load(path) {
            Err(e @ (CacheError::Corrupt { .. } | CacheError::UnsupportedVersion { .. })) => {
                log::warn!("{}; rebuilding cache from scratch", e);
                Ok(Self::new())
            }
            other => other,
        }
    }
}
