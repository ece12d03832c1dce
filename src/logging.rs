//! Logging setup using the `log` facade and `env_logger` backend.
//!
//! Log levels are determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! The PDF parsing crates log every malformed object they skip; they are
//! capped at `error` unless `RUST_LOG` says otherwise or `-vv` is given.
//!
//! Debug builds prefix every line with a timestamp (and the module path at
//! `-v` and above); release builds print level and message only.

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Crates whose logs are too noisy for normal operation.
const NOISY_MODULES: &[&str] = &["lopdf", "pdf_extract"];

/// Initialize logging from the CLI verbosity flags.
///
/// Call once at startup. Later calls are ignored.
///
/// ```rust,no_run
/// magsearch::logging::init_logging(1, false);
/// log::debug!("visible at -v");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    let from_env = env::var("RUST_LOG").is_ok();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
        if verbose < 2 {
            for module in NOISY_MODULES {
                builder.filter_module(module, LevelFilter::Error);
            }
        }
    }

    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
        return;
    }

    if from_env {
        log::debug!("Logging initialized from RUST_LOG={:?}", env::var("RUST_LOG").ok());
    } else {
        log::debug!("Logging initialized at level: {:?}", determine_level(verbose, quiet));
    }
}

fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(debug_assertions)]
fn configure_format(builder: &mut Builder, verbose: u8) {
    builder.format(move |buf, record| {
        let timestamp = buf.timestamp_millis();
        let level = record.level();
        let style = buf.default_level_style(level);
        if verbose >= 1 {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                timestamp,
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(buf, "{} {style}{:<5}{style:#} {}", timestamp, level, record.args())
        }
    });
}

#[cfg(not(debug_assertions))]
fn configure_format(builder: &mut Builder, _verbose: u8) {
    builder.format(|buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
    });
}
