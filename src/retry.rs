//! Bounded retry with exponential backoff for transient I/O.
//!
//! Magazine roots frequently live on a network share, where listing a
//! directory or reading a file can fail transiently. Operations wrapped in
//! [`RetryPolicy::run`] are attempted up to `attempts` times, sleeping
//! `delay_ms * 2^n` between attempts. Errors the caller classifies as
//! permanent are returned immediately.
//!
//! # Example
//!
//! ```
//! use magsearch::retry::{is_transient, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3, 0);
//! let listing = policy.run("list /tmp", is_transient, || std::fs::read_dir("/tmp").map(|_| ()));
//! assert!(listing.is_ok());
//! ```

use std::io;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry policy for transient I/O failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of attempts (at least 1).
    pub attempts: u32,
    /// Base delay in milliseconds; doubled after every failed attempt.
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 2000,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt count and base delay.
    #[must_use]
    pub fn new(attempts: u32, delay_ms: u64) -> Self {
        Self { attempts, delay_ms }
    }

    /// A policy that tries exactly once.
    #[must_use]
    pub fn none() -> Self {
        Self::new(1, 0)
    }

    /// Delay before retry number `attempt` (0-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.delay_ms.saturating_mul(factor))
    }

    /// Run `op`, retrying while `is_retryable` accepts the error.
    ///
    /// # Errors
    ///
    /// Returns the last error once attempts are exhausted, or the first
    /// error that `is_retryable` rejects.
    pub fn run<T, E, R, F>(&self, what: &str, is_retryable: R, mut op: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        R: Fn(&E) -> bool,
        F: FnMut() -> Result<T, E>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt + 1 < attempts && is_retryable(&e) => {
                    let wait = self.backoff(attempt);
                    log::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        what,
                        attempt + 1,
                        attempts,
                        e,
                        wait
                    );
                    thread::sleep(wait);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Classify an I/O error as transient (worth retrying).
///
/// Missing files, permission problems and malformed data are permanent.
#[must_use]
pub fn is_transient(error: &io::Error) -> bool {
    !matches!(
        error.kind(),
        io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::InvalidInput
            | io::ErrorKind::InvalidData
            | io::ErrorKind::Unsupported
            | io::ErrorKind::AlreadyExists
    )
}
