//! Command-line interface definitions for magsearch.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options control verbosity, color and configuration; subcommands map one-to-one
//! onto the session operations.
//!
//! # Example
//!
//! ```bash
//! # Bring the cache and index up to date
//! magsearch sync --root /mnt/magazines
//!
//! # Search, grouped by magazine
//! magsearch search "BMW R 1300" --group
//!
//! # JSON for scripting
//! magsearch search BMW --output json
//!
//! # Verbose mode for debugging
//! magsearch -v sync
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Incremental full-text search over a PDF magazine collection.
///
/// magsearch extracts the text of every page once, keeps it in a
/// modification-time-tracked cache and answers keyword searches with the
/// page and surrounding context of every occurrence.
#[derive(Debug, Parser)]
#[command(name = "magsearch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML)
    ///
    /// If not specified, config.toml in the platform configuration directory is used when present.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the roots, extract new or changed PDFs and rebuild the index
    Sync(SyncArgs),
    /// Search the cached pages for a keyword
    Search(SearchArgs),
    /// Rebuild the text index from the current cache
    RebuildIndex,
    /// Delete the cache and the index
    Clear,
    /// Show cache and index statistics
    Stats(StatsArgs),
    /// Print the absolute path of a magazine
    Resolve(ResolveArgs),
}

/// Options that override where and how magazines are discovered.
#[derive(Debug, Args, Default, Clone)]
pub struct ScanArgs {
    /// Magazine root directory (can be specified multiple times, scanned in order)
    ///
    /// Replaces root_dirs from the configuration.
    #[arg(short, long = "root", value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Descend into subdirectories of each root
    #[arg(long)]
    pub recursive: bool,

    /// Glob patterns to ignore (can be specified multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,
}

/// Arguments for the sync subcommand.
#[derive(Debug, Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Maximum number of extraction workers
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Stop starting new extractions after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format for the sync report
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the search subcommand.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Keyword or phrase to search for (case-insensitive)
    #[arg(value_name = "KEYWORD", allow_hyphen_values = true)]
    pub keyword: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Group matches by magazine, most matches first
    #[arg(short, long)]
    pub group: bool,

    /// Disable the page-range and blacklist post-filter
    #[arg(long)]
    pub no_filter: bool,

    /// Context characters on each side of a match
    #[arg(long, value_name = "N")]
    pub context: Option<usize>,

    /// Show at most N matches
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,

    /// Sync the cache before searching
    #[arg(long)]
    pub sync: bool,

    #[command(flatten)]
    pub scan: ScanArgs,
}

/// Arguments for the stats subcommand.
#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Output format (csv is treated as text)
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the resolve subcommand.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Bare filename (or any path ending in one)
    #[arg(value_name = "FILENAME")]
    pub filename: String,

    #[command(flatten)]
    pub scan: ScanArgs,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with highlighted matches
    #[default]
    Text,
    /// JSON for scripting
    Json,
    /// CSV, one row per match
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}
