use super::support::{config_for, write_pdf, TextExtractor};
use magsearch::cache::{CacheError, CacheStore, PdfFile};
use magsearch::session::{Session, SessionError};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tempfile::tempdir;

fn sample_store() -> CacheStore {
    let mut store = CacheStore::new();
    store.insert(PdfFile::new(
        "Tourenfahrer_2024_01.pdf",
        PathBuf::from("/mags/Tourenfahrer_2024_01.pdf"),
        SystemTime::UNIX_EPOCH,
        vec!["Alpenpässe".into(), "Reifentest – Sommer".into()],
    ));
    store.record_failure("broken.pdf", SystemTime::UNIX_EPOCH);
    store
}

#[test]
fn test_cache_round_trips_losslessly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pdf_cache.json");
    let store = sample_store();

    store.save(&path).unwrap();
    let loaded = CacheStore::load(&path).unwrap();
    assert_eq!(loaded, store);
}

#[test]
fn test_truncated_cache_is_rebuilt_on_open() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    write_pdf(root.path(), "A.pdf", &["Vespa GTS"]);

    let config = config_for(state.path(), vec![root.path().to_path_buf()]);
    let session = Session::open(config.clone())
        .unwrap()
        .with_extractor(Arc::new(TextExtractor::new()));
    session.sync(None).unwrap();

    let bytes = fs::read(&config.cache_path).unwrap();
    fs::write(&config.cache_path, &bytes[..bytes.len() / 2]).unwrap();
    assert!(matches!(
        CacheStore::load(&config.cache_path),
        Err(CacheError::Corrupt { .. })
    ));

    let reopened = Session::open(config)
        .unwrap()
        .with_extractor(Arc::new(TextExtractor::new()));
    assert!(reopened.snapshot().is_empty());

    let report = reopened.sync(None).unwrap();
    assert_eq!(report.new, 1);
    assert_eq!(reopened.search("vespa", false).len(), 1);
}

#[test]
fn test_failed_save_keeps_previous_generation() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    write_pdf(root.path(), "A.pdf", &["first"]);

    let config = config_for(state.path(), vec![root.path().to_path_buf()]);
    let session = Session::open(config.clone())
        .unwrap()
        .with_extractor(Arc::new(TextExtractor::new()));
    session.sync(None).unwrap();

    // A non-empty directory where the cache file belongs makes the final rename fail
    fs::remove_file(&config.cache_path).unwrap();
    fs::create_dir_all(config.cache_path.join("inner")).unwrap();
    write_pdf(root.path(), "B.pdf", &["second"]);

    let err = session.sync(None).unwrap_err();
    assert!(matches!(err, SessionError::Cache(CacheError::Io { .. })));

    let snapshot = session.snapshot();
    assert!(snapshot.contains("A.pdf"));
    assert!(!snapshot.contains("B.pdf"));
    assert!(session.search("second", false).is_empty());

    assert!(config.cache_path.join("inner").is_dir());
    let leftovers: Vec<_> = fs::read_dir(state.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}
