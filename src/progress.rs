//! Progress reporting.
//!
//! [`ProgressCallback`] is how long-running operations report progress; the
//! session and the extraction pool accept any implementation. [`Progress`]
//! renders the phases as indicatif bars on stderr:
//!
//! | phase        | display                         |
//! |--------------|---------------------------------|
//! | `scanning`   | spinner with a running file count |
//! | `extracting` | bar with position, rate and ETA |
//! | `indexing`   | spinner                         |

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Receives progress updates from long-running operations.
pub trait ProgressCallback: Send + Sync {
    /// A phase started with `total` items (0 when unknown).
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Item number `current` (1-based) was processed.
    fn on_progress(&self, current: usize, name: &str);

    /// An item of `bytes` bytes was processed.
    fn on_item_completed(&self, _bytes: u64) {}

    /// A phase finished.
    fn on_phase_end(&self, phase: &str);

    /// Free-form status message.
    fn on_message(&self, _message: &str) {}
}

/// A callback that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_phase_start(&self, _phase: &str, _total: usize) {}
    fn on_progress(&self, _current: usize, _name: &str) {}
    fn on_phase_end(&self, _phase: &str) {}
}

/// Terminal progress display using indicatif.
pub struct Progress {
    active: Mutex<Option<(String, ProgressBar)>>,
    quiet: bool,
}

impl Progress {
    /// Create a reporter. A quiet reporter draws nothing.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            active: Mutex::new(None),
            quiet,
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<(String, ProgressBar)>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn make_bar(phase: &str, total: usize) -> ProgressBar {
        let pb = match phase {
            "extracting" => {
                let pb = ProgressBar::new(total as u64);
                pb.set_style(Self::bar_style());
                pb
            }
            _ => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(Self::spinner_style());
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
        };
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_message(phase_label(phase).to_string());
        pb
    }
}

fn phase_label(phase: &str) -> &str {
    match phase {
        "scanning" => "Scanning roots",
        "extracting" => "Extracting text",
        "indexing" => "Rebuilding index",
        other => other,
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }
        let mut active = self.active();
        if let Some((_, old)) = active.take() {
            old.finish_and_clear();
        }
        *active = Some((phase.to_string(), Self::make_bar(phase, total)));
    }

    fn on_progress(&self, current: usize, name: &str) {
        if self.quiet {
            return;
        }
        if let Some((_, ref pb)) = *self.active() {
            pb.set_position(current as u64);
            pb.set_message(truncate_name(name, 40));
        }
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }
        let mut active = self.active();
        if active.as_ref().is_some_and(|(p, _)| p == phase) {
            if let Some((_, pb)) = active.take() {
                pb.finish_with_message(format!("{} complete", phase_label(phase)));
            }
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        if let Some((_, ref pb)) = *self.active() {
            pb.set_message(message.to_string());
        }
    }
}

/// Shorten a filename to at most `max` characters, keeping its end.
fn truncate_name(name: &str, max: usize) -> String {
    let count = name.chars().count();
    if count <= max {
        return name.to_string();
    }
    let keep = max.saturating_sub(3);
    let tail: String = name.chars().skip(count - keep).collect();
    format!("...{tail}")
}
