//! Heuristic post-filtering of search results.
//!
//! Magazines carry covers, tables of contents and advertisements that
//! produce noise for most keywords. This stage drops matches on the first or
//! last N pages of each file and matches whose snippet contains a
//! blacklisted term. It has no accuracy guarantee and is off by default.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::MatchRecord;

/// Post-filter settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Drop matches on the first N pages of each file
    pub skip_first_pages: usize,
    /// Drop matches on the last N pages of each file
    pub skip_last_pages: usize,
    /// Drop matches whose snippet contains any of these terms (case-insensitive)
    pub blacklist: Vec<String>,
}

impl FilterConfig {
    /// Whether the filter would drop anything at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.skip_first_pages > 0 || self.skip_last_pages > 0 || !self.blacklist.is_empty()
    }
}

/// Compiled post-filter.
#[derive(Debug, Clone)]
pub struct PostFilter {
    skip_first: usize,
    skip_last: usize,
    blacklist: Option<Regex>,
}

impl PostFilter {
    /// Compile a filter from its settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the blacklist is too large to compile.
    pub fn new(config: &FilterConfig) -> Result<Self, regex::Error> {
        let terms: Vec<String> = config
            .blacklist
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(regex::escape)
            .collect();

        let blacklist = if terms.is_empty() {
            None
        } else {
            Some(
                RegexBuilder::new(&terms.join("|"))
                    .case_insensitive(true)
                    .build()?,
            )
        };

        Ok(Self {
            skip_first: config.skip_first_pages,
            skip_last: config.skip_last_pages,
            blacklist,
        })
    }

    /// Whether a single record survives the filter.
    #[must_use]
    pub fn keep(&self, record: &MatchRecord) -> bool {
        if record.page <= self.skip_first {
            return false;
        }
        if record.page.saturating_add(self.skip_last) > record.page_count {
            return false;
        }
        !self
            .blacklist
            .as_ref()
            .is_some_and(|re| re.is_match(&record.snippet))
    }

    /// Drop every record that does not survive the filter, preserving order.
    #[must_use]
    pub fn apply(&self, records: Vec<MatchRecord>) -> Vec<MatchRecord> {
        let before = records.len();
        let kept: Vec<MatchRecord> = records.into_iter().filter(|r| self.keep(r)).collect();
        if kept.len() != before {
            log::debug!("Post-filter dropped {} of {} match(es)", before - kept.len(), before);
        }
        kept
    }
}
