//! Incremental page-text cache.
//!
//! This module keeps the extracted page texts of every magazine so that a
//! new session only re-extracts what changed on disk.
//!
//! # Architecture
//!
//! The caching system is split into three components:
//!
//! * [`entry`]: The [`PdfFile`] record stored per magazine.
//! * [`store`]: The in-memory [`CacheStore`], staleness classification and
//!   batch merge.
//! * [`persist`]: Checksummed, atomically replaced JSON persistence.
//!
//! # Cache Invalidation
//!
//! Entries are keyed by bare filename and validated by modification time
//! alone. A file is re-extracted when its on-disk mtime is strictly newer
//! than the stored one; cached files that disappeared from disk are dropped.

pub mod entry;
pub mod persist;
pub mod store;

pub use entry::PdfFile;
pub use persist::{CacheError, CacheResult};
pub use store::{CacheMetadata, CacheStore, SyncPlan, CACHE_VERSION};
