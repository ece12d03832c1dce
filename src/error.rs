//! Structured error handling and exit codes.

use serde::Serialize;

/// Process exit codes.
///
/// - 0: Success (completed normally, results found)
/// - 1: General error (unexpected failure)
/// - 2: No matches (search completed, nothing found)
/// - 3: Partial success (completed, but some files failed to extract)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the command completed.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No matches: the search completed without results.
    NoMatches = 2,
    /// Partial success: completed, but some files could not be extracted.
    PartialSuccess = 3,
    /// Interrupted: stopped by the user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "MS000",
            Self::GeneralError => "MS001",
            Self::NoMatches => "MS002",
            Self::PartialSuccess => "MS003",
            Self::Interrupted => "MS130",
        }
    }
}

/// Error type signalling that the user interrupted the command.
#[derive(Debug, thiserror::Error)]
#[error("Operation interrupted by user")]
pub struct Interrupted;

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "MS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

/// Map an application error to its exit code.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if err.downcast_ref::<Interrupted>().is_some() {
        ExitCode::Interrupted
    } else {
        ExitCode::GeneralError
    }
}
