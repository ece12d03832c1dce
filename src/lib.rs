//! magsearch - Incremental full-text search over a PDF magazine collection
//!
//! The text of every page is extracted once, in parallel, and kept in a
//! modification-time-tracked cache. A SQLite index narrows each search to the
//! files that contain the keyword; the cached pages of those files are then
//! scanned for every occurrence, reported with its page and context.
//!
//! # Modules
//!
//! - [`scanner`]: root walking, filename resolution and page extraction
//! - [`extraction`]: the bounded parallel extraction pool
//! - [`cache`]: the persisted page-text cache and its staleness rules
//! - [`index`]: the SQLite candidate index
//! - [`search`]: keyword search, context windows, filtering and grouping
//! - [`session`]: ties the above together behind one handle
//! - [`output`]: text, JSON and CSV rendering
//!
//! # Example
//!
//! ```no_run
//! use magsearch::config::Config;
//! use magsearch::session::Session;
//! use std::path::PathBuf;
//!
//! let config = Config {
//!     root_dirs: vec![PathBuf::from("/mnt/magazines")],
//!     ..Config::default()
//! };
//! let session = Session::open(config).unwrap();
//! let report = session.sync(None).unwrap();
//! println!("{}", report.summary());
//!
//! for hit in session.search("BMW", true) {
//!     println!("{} p.{}: {}", hit.filename, hit.page, hit.snippet);
//! }
//! ```

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod index;
pub mod logging;
pub mod output;
pub mod progress;
pub mod retry;
pub mod scanner;
pub mod search;
pub mod session;
pub mod signal;

pub use app::{run_app, run_with_output};
