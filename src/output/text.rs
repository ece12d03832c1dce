//! Human-readable terminal output.
//!
//! Matches are printed as a filename line followed by the indented snippet,
//! with the matched text highlighted when color is enabled:
//!
//! ```text
//! Ride_2023_04.pdf  page 2/84
//!     ... the new BMW R 1250 GS on test ...
//! ```

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::Paint;

use crate::search::{FileGroup, MatchRecord};
use crate::session::{SessionStats, SyncReport};

/// Plain-text renderer.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput {
    color: bool,
}

impl TextOutput {
    /// Create a renderer; `color` enables ANSI styling.
    #[must_use]
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// The snippet with its match highlighted.
    #[must_use]
    pub fn highlight(&self, record: &MatchRecord) -> String {
        let snippet = &record.snippet;
        let (Some(before), Some(hit), Some(after)) = (
            snippet.get(..record.highlight.start),
            snippet.get(record.highlight.clone()),
            snippet.get(record.highlight.end..),
        ) else {
            return snippet.clone();
        };
        if self.color {
            format!("{before}{}{after}", hit.yellow().bold())
        } else {
            format!("{before}{hit}{after}")
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dim().to_string()
        } else {
            text.to_string()
        }
    }

    /// Write one block per match, in result order.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_matches<W: Write>(&self, w: &mut W, records: &[MatchRecord]) -> io::Result<()> {
        for record in records {
            writeln!(
                w,
                "{}  {}",
                self.heading(&record.filename),
                self.dim(&format!("page {}/{}", record.page, record.page_count))
            )?;
            writeln!(w, "    ...{}...", self.highlight(record))?;
        }
        writeln!(w, "{}", match_summary(records.len(), distinct_files(records)))
    }

    /// Write one section per file, files with the most matches first.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_groups<W: Write>(&self, w: &mut W, groups: &[FileGroup]) -> io::Result<()> {
        for group in groups {
            let pages = group
                .pages()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                w,
                "{} ({} match{}, {} pages)",
                self.heading(&group.filename),
                group.len(),
                if group.len() == 1 { "" } else { "es" },
                group.page_count
            )?;
            writeln!(w, "  {}", self.dim(&group.path.display().to_string()))?;
            writeln!(w, "  pages: {pages}")?;
            for record in &group.matches {
                writeln!(w, "    p.{:<4} ...{}...", record.page, self.highlight(record))?;
            }
            writeln!(w)?;
        }
        let total = groups.iter().map(FileGroup::len).sum();
        writeln!(w, "{}", match_summary(total, groups.len()))
    }

    /// Write a sync report.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_sync_report<W: Write>(&self, w: &mut W, report: &SyncReport) -> io::Result<()> {
        writeln!(w, "{}", self.heading(&report.summary()))?;
        writeln!(
            w,
            "  new: {}  changed: {}  workers: {}  time: {:.1}s",
            report.new,
            report.stale,
            report.workers,
            report.elapsed_ms as f64 / 1000.0
        )?;
        if report.retained > 0 {
            writeln!(w, "  kept {} file(s) from unreachable roots", report.retained)?;
        }
        if report.known_failures > 0 {
            writeln!(w, "  {} unchanged file(s) skipped after earlier failures", report.known_failures)?;
        }
        if let Some(rows) = report.indexed {
            writeln!(w, "  index rebuilt: {rows} file(s)")?;
        }
        if report.interrupted {
            writeln!(w, "  {}", self.warn("interrupted before all files were processed"))?;
        }
        if report.timed_out {
            writeln!(w, "  {}", self.warn("extraction deadline reached"))?;
        }
        for failure in &report.failed {
            writeln!(w, "  {} {}: {}", self.warn("failed"), failure.name, failure.error)?;
        }
        for error in &report.scan_errors {
            writeln!(w, "  {} {}", self.warn("scan"), error)?;
        }
        Ok(())
    }

    fn warn(&self, text: &str) -> String {
        if self.color {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    /// Write cache and index statistics.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_stats<W: Write>(&self, w: &mut W, stats: &SessionStats) -> io::Result<()> {
        let size = |bytes: Option<u64>| bytes.map_or_else(|| "missing".to_string(), |b| ByteSize::b(b).to_string());

        writeln!(w, "{}", self.heading("Library"))?;
        for root in &stats.roots {
            writeln!(w, "  root: {}", root.display())?;
        }
        writeln!(w, "  cached files: {}", stats.cached_files)?;
        writeln!(w, "  pages: {}", stats.total_pages)?;
        writeln!(w, "  failed files: {}", stats.failed_files)?;
        writeln!(w, "  workers: {}", stats.workers)?;
        writeln!(w, "  updated: {}", stats.updated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(w, "{}", self.heading("Storage"))?;
        writeln!(w, "  cache: {} ({})", stats.cache_path.display(), size(stats.cache_bytes))?;
        writeln!(w, "  index: {} ({})", stats.index_path.display(), size(stats.index_bytes))?;
        match stats.indexed_files {
            Some(rows) => writeln!(w, "  indexed files: {rows}"),
            None => writeln!(w, "  indexed files: not built"),
        }
    }
}

fn distinct_files(records: &[MatchRecord]) -> usize {
    let mut names: Vec<&str> = records.iter().map(|r| r.filename.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    names.len()
}

fn match_summary(matches: usize, files: usize) -> String {
    match matches {
        0 => "No matches found.".to_string(),
        _ => format!("{matches} match(es) in {files} file(s)"),
    }
}
