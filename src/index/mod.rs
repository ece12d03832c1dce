//! Secondary full-text candidate index.
//!
//! The index holds one row per cached magazine with all of its pages
//! concatenated. It cannot report pages or context; it only narrows the set
//! of files the search engine has to scan page by page.
//!
//! The index is derived data. It is rebuilt wholesale from a cache snapshot
//! and may be deleted at any time.

pub mod database;

pub use database::{IndexError, IndexResult, IndexRow, TextIndex};
