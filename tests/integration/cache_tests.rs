use super::support::{config_for, set_mtime, write_pdf, TextExtractor};
use magsearch::cache::CacheStore;
use magsearch::index::TextIndex;
use magsearch::session::Session;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

fn open(state: &std::path::Path, root: &std::path::Path) -> Session {
    Session::open(config_for(state, vec![root.to_path_buf()]))
        .unwrap()
        .with_extractor(Arc::new(TextExtractor::new()))
}

#[test]
fn test_resync_unchanged_is_idempotent() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    write_pdf(root.path(), "A.pdf", &["alpha", "beta"]);
    write_pdf(root.path(), "B.pdf", &["gamma"]);

    let session = open(state.path(), root.path());
    let first = session.sync(None).unwrap();
    assert_eq!(first.new, 2);

    let second = session.sync(None).unwrap();
    assert_eq!(second.valid, 2);
    assert_eq!(second.stale, 0);
    assert_eq!(second.new, 0);
    assert_eq!(second.extracted, 0);

    // A fresh session over the persisted cache agrees
    let reopened = open(state.path(), root.path());
    let third = reopened.sync(None).unwrap();
    assert_eq!(third.valid, 2);
    assert_eq!(third.stale, 0);
}

#[test]
fn test_advanced_mtime_is_reextracted() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    let path = write_pdf(root.path(), "A.pdf", &["old text"]);
    set_mtime(&path, 1_600_000_000);

    let session = open(state.path(), root.path());
    session.sync(None).unwrap();
    assert_eq!(session.search("old", false).len(), 1);

    fs::write(&path, "new text").unwrap();
    set_mtime(&path, 1_600_000_100);

    let report = session.sync(None).unwrap();
    assert_eq!(report.stale, 1);
    assert_eq!(report.extracted, 1);
    assert!(session.search("old", false).is_empty());
    assert_eq!(session.search("new", false).len(), 1);
}

#[test]
fn test_older_mtime_keeps_cached_text() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    let path = write_pdf(root.path(), "A.pdf", &["cached text"]);
    set_mtime(&path, 1_600_000_100);

    let session = open(state.path(), root.path());
    session.sync(None).unwrap();

    fs::write(&path, "restored from backup").unwrap();
    set_mtime(&path, 1_600_000_000);

    let report = session.sync(None).unwrap();
    assert_eq!(report.valid, 1);
    assert_eq!(session.search("cached", false).len(), 1);
}

#[test]
fn test_removed_file_leaves_cache_and_index() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    let gone = write_pdf(root.path(), "Gone.pdf", &["Honda Africa Twin"]);
    write_pdf(root.path(), "Kept.pdf", &["Honda Transalp"]);

    let session = open(state.path(), root.path());
    session.sync(None).unwrap();

    let index = TextIndex::new(state.path().join("text_index.db"));
    assert_eq!(index.query_candidates("honda").unwrap().len(), 2);

    fs::remove_file(gone).unwrap();
    let report = session.sync(None).unwrap();

    assert_eq!(report.removed, vec!["Gone.pdf".to_string()]);
    assert!(!session.snapshot().contains("Gone.pdf"));
    let candidates = index.query_candidates("honda").unwrap();
    assert_eq!(candidates.len(), 1);
    assert!(candidates.contains("Kept.pdf"));

    let on_disk = CacheStore::load(&state.path().join("pdf_cache.json")).unwrap();
    assert!(!on_disk.contains("Gone.pdf"));
}

#[test]
fn test_missing_root_keeps_its_files() {
    let local = tempdir().unwrap();
    let nas = tempdir().unwrap();
    let state = tempdir().unwrap();
    write_pdf(local.path(), "Local.pdf", &["text"]);
    let nas_root = nas.path().join("share");
    write_pdf(&nas_root, "Remote.pdf", &["text"]);

    let config = config_for(state.path(), vec![local.path().to_path_buf(), nas_root.clone()]);
    let session = Session::open(config.clone())
        .unwrap()
        .with_extractor(Arc::new(TextExtractor::new()));
    session.sync(None).unwrap();

    fs::remove_dir_all(&nas_root).unwrap();
    let report = session.sync(None).unwrap();

    assert_eq!(report.retained, 1);
    assert!(report.removed.is_empty());
    assert!(session.snapshot().contains("Remote.pdf"));
}
