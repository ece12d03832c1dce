//! Application configuration management.
//!
//! Configuration is layered with figment, later layers overriding earlier
//! ones:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file, either given with `--config` or `config.toml` in the
//!    platform configuration directory
//! 3. Environment variables prefixed with `MAGSEARCH_` (`__` separates
//!    nested keys, e.g. `MAGSEARCH_RETRY__ATTEMPTS=5`)
//! 4. Command-line flags, applied by the caller
//!
//! The resulting [`Config`] is treated as immutable for the whole session.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extraction::MAX_WORKERS;
use crate::retry::RetryPolicy;
use crate::scanner::WalkerConfig;
use crate::search::{ContextWindow, FilterConfig, SearchOptions, CONTEXT_CHARS};

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "MAGSEARCH_";

/// Top-level keys accepted in the configuration file.
const KNOWN_KEYS: &[&str] = &[
    "root_dirs",
    "recursive",
    "skip_hidden",
    "ignore_patterns",
    "max_workers",
    "context_chars",
    "context_word_boundary",
    "cache_path",
    "index_path",
    "extraction_timeout_secs",
    "retry",
    "filter",
];

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or did not match the schema.
    #[error("Invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// The merged configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directories holding the magazines, scanned in this order
    pub root_dirs: Vec<PathBuf>,
    /// Descend into subdirectories of each root
    pub recursive: bool,
    /// Skip hidden files and directories
    pub skip_hidden: bool,
    /// Gitignore-style patterns for files to leave out
    pub ignore_patterns: Vec<String>,
    /// Upper bound on extraction and search workers
    pub max_workers: usize,
    /// Context characters on each side of a match
    pub context_chars: usize,
    /// Widen context windows to whole words
    pub context_word_boundary: bool,
    /// Cache file location
    pub cache_path: PathBuf,
    /// Index database location
    pub index_path: PathBuf,
    /// Deadline for one extraction batch in seconds, 0 for none
    pub extraction_timeout_secs: u64,
    /// Retry policy for file system access
    pub retry: RetryPolicy,
    /// Result post-filter
    pub filter: FilterConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            root_dirs: Vec::new(),
            recursive: false,
            skip_hidden: true,
            ignore_patterns: Vec::new(),
            max_workers: MAX_WORKERS,
            context_chars: CONTEXT_CHARS,
            context_word_boundary: false,
            cache_path: data_dir.join("pdf_cache.json"),
            index_path: data_dir.join("text_index.db"),
            extraction_timeout_secs: 0,
            retry: RetryPolicy::default(),
            filter: FilterConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "magsearch")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".magsearch"))
}

impl Config {
    /// Default platform-specific configuration file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "magsearch").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load the layered configuration.
    ///
    /// When `config_file` is `None` the platform default file is used if it
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicit file is missing, a layer fails
    /// to parse, or the result is invalid.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_file {
            Some(path) if !path.is_file() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_config_path().filter(|p| p.is_file()),
        };

        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(ref path) = file {
            log::debug!("Loading configuration from {}", path.display());
            warn_unknown_keys(path);
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::from_figment(figment)
    }

    /// Extract and validate a configuration from a prepared figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if extraction or validation fails.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::Invalid("max_workers must be at least 1".into()));
        }
        if self.retry.attempts == 0 {
            return Err(ConfigError::Invalid("retry.attempts must be at least 1".into()));
        }
        if self.cache_path == self.index_path {
            return Err(ConfigError::Invalid(
                "cache_path and index_path must differ".into(),
            ));
        }
        Ok(())
    }

    /// Scanner settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::new(self.recursive, self.skip_hidden, self.ignore_patterns.clone())
            .with_retry(self.retry)
    }

    /// Search settings derived from this configuration.
    #[must_use]
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            context: ContextWindow::new(self.context_chars, self.context_word_boundary),
            max_workers: self.max_workers,
        }
    }

    /// Extraction batch deadline, if any.
    #[must_use]
    pub fn extraction_timeout(&self) -> Option<Duration> {
        (self.extraction_timeout_secs > 0).then(|| Duration::from_secs(self.extraction_timeout_secs))
    }
}

/// Unknown top-level keys in a TOML file, each with the closest known key.
#[must_use]
pub fn unknown_keys(content: &str) -> Vec<(String, Option<&'static str>)> {
    let Ok(table) = content.parse::<toml::Table>() else {
        return Vec::new();
    };
    table
        .keys()
        .filter(|k| !KNOWN_KEYS.contains(&k.as_str()))
        .map(|k| {
            let suggestion = KNOWN_KEYS
                .iter()
                .map(|known| (strsim::jaro_winkler(k, known), *known))
                .filter(|(score, _)| *score >= 0.8)
                .max_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, known)| known);
            (k.clone(), suggestion)
        })
        .collect()
}

fn warn_unknown_keys(path: &Path) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };
    for (key, suggestion) in unknown_keys(&content) {
        match suggestion {
            Some(s) => log::warn!(
                "Unknown configuration key '{}' in {} (did you mean '{}'?)",
                key,
                path.display(),
                s
            ),
            None => log::warn!("Unknown configuration key '{}' in {}", key, path.display()),
        }
    }
}
