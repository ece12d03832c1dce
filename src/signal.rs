//! Ctrl+C handling for cooperative cancellation.
//!
//! A single `Arc<AtomicBool>` is shared between the signal handler and every
//! long-running loop (directory walk, extraction batch). The loops check it
//! between files, never in the middle of one, so an interrupted sync still
//! merges and persists every file that finished.
//!
//! ```rust,no_run
//! use magsearch::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let flag = handler.get_flag();
//! // hand `flag` to the walker and the extraction pool
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code after an interrupt (128 + SIGINT).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request shutdown without a signal.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// The flag to hand to walkers and worker pools.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear a previous request.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler.
///
/// The hook is registered once per process. Later calls return the same
/// handler with its flag cleared, so repeated `run_app` calls (as in tests)
/// share one hook.
///
/// # Errors
///
/// Returns [`SignalError`] if the hook cannot be registered and none was
/// registered before.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted. Finishing files in progress...");
        let _ = stderr.flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => Ok(GLOBAL_HANDLER.get_or_init(|| handler).clone()),
        Err(ctrlc::Error::MultipleHandlers) => {
            log::debug!("Ctrl+C handler already registered, using unhooked handler");
            Ok(GLOBAL_HANDLER.get_or_init(ShutdownHandler::new).clone())
        }
        Err(e) => Err(e.into()),
    }
}
