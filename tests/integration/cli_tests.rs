use super::support::write_pdf;
use clap::Parser;
use magsearch::cli::Cli;
use magsearch::error::{exit_code_for, ExitCode};
use magsearch::run_with_output;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

struct Fixture {
    root: TempDir,
    state: TempDir,
    config: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let root = tempdir().unwrap();
        let state = tempdir().unwrap();
        let config = state.path().join("config.toml");
        fs::write(
            &config,
            format!(
                "root_dirs = [{:?}]\ncache_path = {:?}\nindex_path = {:?}\n\n[retry]\nattempts = 1\n",
                root.path().display().to_string(),
                state.path().join("pdf_cache.json").display().to_string(),
                state.path().join("text_index.db").display().to_string(),
            ),
        )
        .unwrap();
        Self {
            root,
            state,
            config,
        }
    }

    fn run(&self, args: &[&str]) -> (anyhow::Result<ExitCode>, String) {
        let config = self.config.display().to_string();
        let mut argv = vec!["magsearch", "-q", "--no-color", "-c", config.as_str()];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();

        let mut out = Vec::new();
        let result = run_with_output(cli, &mut out, false);
        (result, String::from_utf8(out).unwrap())
    }

    fn cache_file(&self) -> PathBuf {
        self.state.path().join("pdf_cache.json")
    }
}

fn root(fixture: &Fixture) -> &Path {
    fixture.root.path()
}

#[test]
fn test_sync_with_unreadable_pdf_is_partial_success() {
    let fixture = Fixture::new();
    write_pdf(root(&fixture), "not_really.pdf", &["plain text, not a PDF"]);

    let (result, out) = fixture.run(&["sync"]);
    assert_eq!(result.unwrap(), ExitCode::PartialSuccess);
    assert!(out.contains("1 file(s) failed to extract"));
    assert!(out.contains("not_really.pdf"));
    assert!(fixture.cache_file().exists());
}

#[test]
fn test_sync_json_report() {
    let fixture = Fixture::new();
    write_pdf(root(&fixture), "broken.pdf", &["junk"]);

    let (result, out) = fixture.run(&["sync", "--output", "json"]);
    assert_eq!(result.unwrap(), ExitCode::PartialSuccess);
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["discovered"], 1);
    assert_eq!(report["failed"][0]["name"], "broken.pdf");
    assert_eq!(report["interrupted"], false);
}

#[test]
fn test_search_without_matches_exits_2() {
    let fixture = Fixture::new();

    let (result, out) = fixture.run(&["search", "Kawasaki"]);
    assert_eq!(result.unwrap(), ExitCode::NoMatches);
    assert_eq!(out, "No matches found.\n");

    let (result, out) = fixture.run(&["search", "Kawasaki", "-o", "json"]);
    assert_eq!(result.unwrap(), ExitCode::NoMatches);
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["summary"]["exit_code"], 2);

    let (result, out) = fixture.run(&["search", "Kawasaki", "-o", "csv"]);
    assert_eq!(result.unwrap(), ExitCode::NoMatches);
    assert!(out.starts_with("filename,page,page_count,offset"));
}

#[test]
fn test_stats_and_clear() {
    let fixture = Fixture::new();
    write_pdf(root(&fixture), "broken.pdf", &["junk"]);
    fixture.run(&["sync"]).0.unwrap();

    let (result, out) = fixture.run(&["stats", "-o", "json"]);
    assert_eq!(result.unwrap(), ExitCode::Success);
    let stats: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(stats["cached_files"], 0);
    assert_eq!(stats["failed_files"], 1);

    let (result, out) = fixture.run(&["clear"]);
    assert_eq!(result.unwrap(), ExitCode::Success);
    assert_eq!(out, "Cache and index cleared\n");
    assert!(!fixture.cache_file().exists());
}

#[test]
fn test_resolve_prints_path_or_suggests() {
    let fixture = Fixture::new();
    let path = write_pdf(root(&fixture), "Motorrad_2024_03.pdf", &["x"]);

    let (result, out) = fixture.run(&["resolve", "Motorrad_2024_03.pdf"]);
    assert_eq!(result.unwrap(), ExitCode::Success);
    assert_eq!(out.trim_end(), path.display().to_string());

    let (result, _) = fixture.run(&["resolve", "Motorrad_2024_04.pdf"]);
    let err = result.unwrap_err();
    assert_eq!(exit_code_for(&err), ExitCode::GeneralError);
    assert!(format!("{err:#}").contains("did you mean 'Motorrad_2024_03.pdf'"));
}

#[test]
fn test_sync_without_roots_fails() {
    let fixture = Fixture::new();
    fs::write(
        &fixture.config,
        format!(
            "cache_path = {:?}\nindex_path = {:?}\n",
            fixture.cache_file().display().to_string(),
            fixture.state.path().join("idx.db").display().to_string()
        ),
    )
    .unwrap();

    let (result, _) = fixture.run(&["sync"]);
    assert!(format!("{:#}", result.unwrap_err()).contains("No magazine roots configured"));
}

#[test]
fn test_missing_config_file_fails() {
    let cli = Cli::try_parse_from(["magsearch", "-q", "-c", "/no/such/config.toml", "stats"]).unwrap();
    let mut out = Vec::new();
    let err = run_with_output(cli, &mut out, false).unwrap_err();
    assert!(format!("{err:#}").contains("Configuration file not found"));
}
