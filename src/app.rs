//! Command dispatch.
//!
//! [`run_app`] wires the parsed command line to a [`Session`]: it sets up
//! logging, layers the CLI flags over the loaded configuration, installs the
//! Ctrl+C handler and renders the result of the chosen command.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::cli::{Cli, Commands, OutputFormat, ScanArgs, SearchArgs, SyncArgs};
use crate::config::Config;
use crate::error::{ExitCode, Interrupted};
use crate::logging::init_logging;
use crate::output::{write_json, CsvOutput, JsonOutput, TextOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::search::group_by_file;
use crate::session::{Session, SyncReport};
use crate::signal::install_handler;

/// Run the command described by `cli`, writing results to stdout.
///
/// # Errors
///
/// Returns an error if configuration, the cache or the chosen command fails.
/// An interrupted sync returns [`Interrupted`].
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let color = !cli.no_color && io::stdout().is_terminal();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_output(cli, &mut out, color)
}

/// Run the command described by `cli`, writing results to `out`.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_with_output<W: Write>(cli: Cli, out: &mut W, color: bool) -> Result<ExitCode> {
    init_logging(cli.verbose, cli.quiet);

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    match &cli.command {
        Commands::Sync(args) => apply_sync_args(&mut config, args),
        Commands::Search(args) => apply_search_args(&mut config, args),
        Commands::Resolve(args) => apply_scan_args(&mut config, &args.scan),
        Commands::RebuildIndex | Commands::Clear | Commands::Stats(_) => {}
    }
    config.validate().context("Invalid configuration")?;
    log::debug!("Configuration: {:?}", config);

    let handler = install_handler()?;
    let session = Session::open(config)
        .context("Failed to open cache")?
        .with_shutdown_flag(handler.get_flag());

    let progress: Arc<dyn ProgressCallback> =
        Arc::new(Progress::new(cli.quiet || !io::stderr().is_terminal()));
    let text = TextOutput::new(color);

    match cli.command {
        Commands::Sync(args) => {
            require_roots(&session)?;
            let report = session.sync(Some(progress)).context("Sync failed")?;
            match args.output {
                OutputFormat::Json => write_json(out, &report)?,
                OutputFormat::Text | OutputFormat::Csv => text.write_sync_report(out, &report)?,
            }
            sync_exit_code(&report)
        }
        Commands::Search(args) => run_search(&session, &args, progress, text, out),
        Commands::RebuildIndex => {
            let rows = session.rebuild_index().context("Failed to rebuild index")?;
            writeln!(out, "Indexed {rows} file(s)")?;
            Ok(ExitCode::Success)
        }
        Commands::Clear => {
            session.clear().context("Failed to clear cache")?;
            writeln!(out, "Cache and index cleared")?;
            Ok(ExitCode::Success)
        }
        Commands::Stats(args) => {
            let stats = session.stats();
            match args.output {
                OutputFormat::Json => write_json(out, &stats)?,
                OutputFormat::Text | OutputFormat::Csv => text.write_stats(out, &stats)?,
            }
            Ok(ExitCode::Success)
        }
        Commands::Resolve(args) => {
            require_roots(&session)?;
            session.scan();
            let path = session.resolve(&args.filename)?;
            writeln!(out, "{}", path.display())?;
            Ok(ExitCode::Success)
        }
    }
}

fn run_search<W: Write>(
    session: &Session,
    args: &SearchArgs,
    progress: Arc<dyn ProgressCallback>,
    text: TextOutput,
    out: &mut W,
) -> Result<ExitCode> {
    let mut partial = false;
    if args.sync {
        require_roots(session)?;
        let report = session.sync(Some(progress)).context("Sync failed")?;
        log::info!("{}", report.summary());
        if report.interrupted {
            return Err(Interrupted.into());
        }
        partial = report.has_failures();
    }

    let mut records = session.search(&args.keyword, !args.no_filter);
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }

    let code = if records.is_empty() {
        ExitCode::NoMatches
    } else if partial {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    };

    match (args.output, args.group) {
        (OutputFormat::Json, true) => {
            let groups = group_by_file(records);
            JsonOutput::grouped(&args.keyword, &groups, code).write_to(out)?;
        }
        (OutputFormat::Json, false) => JsonOutput::new(&args.keyword, &records, code).write_to(out)?,
        (OutputFormat::Csv, _) => CsvOutput::new(&records).write_to(&mut *out)?,
        (OutputFormat::Text, true) => text.write_groups(out, &group_by_file(records))?,
        (OutputFormat::Text, false) => text.write_matches(out, &records)?,
    }
    Ok(code)
}

fn sync_exit_code(report: &SyncReport) -> Result<ExitCode> {
    if report.interrupted {
        return Err(Interrupted.into());
    }
    Ok(if report.has_failures() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    })
}

fn require_roots(session: &Session) -> Result<()> {
    if session.config().root_dirs.is_empty() {
        bail!("No magazine roots configured; set root_dirs or pass --root");
    }
    Ok(())
}

fn apply_scan_args(config: &mut Config, scan: &ScanArgs) {
    if !scan.roots.is_empty() {
        config.root_dirs.clone_from(&scan.roots);
    }
    if scan.recursive {
        config.recursive = true;
    }
    config
        .ignore_patterns
        .extend(scan.ignore_patterns.iter().cloned());
}

fn apply_sync_args(config: &mut Config, args: &SyncArgs) {
    apply_scan_args(config, &args.scan);
    if let Some(workers) = args.workers {
        config.max_workers = usize::from(workers);
    }
    if let Some(timeout) = args.timeout {
        config.extraction_timeout_secs = timeout;
    }
}

fn apply_search_args(config: &mut Config, args: &SearchArgs) {
    apply_scan_args(config, &args.scan);
    if let Some(chars) = args.context {
        config.context_chars = chars;
    }
}
