use super::support::{config_for, write_pdf, TextExtractor};
use magsearch::progress::ProgressCallback;
use magsearch::session::Session;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

#[derive(Default)]
struct Recorder {
    phases: Mutex<Vec<String>>,
    progress: AtomicUsize,
}

impl ProgressCallback for Recorder {
    fn on_phase_start(&self, phase: &str, _total: usize) {
        self.phases.lock().unwrap().push(format!("start:{phase}"));
    }

    fn on_progress(&self, _current: usize, _name: &str) {
        self.progress.fetch_add(1, Ordering::SeqCst);
    }

    fn on_phase_end(&self, phase: &str) {
        self.phases.lock().unwrap().push(format!("end:{phase}"));
    }
}

#[test]
fn test_sync_reports_phases_in_order() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    for i in 0..5 {
        write_pdf(root.path(), &format!("m{i}.pdf"), &["text"]);
    }
    let session = Session::open(config_for(state.path(), vec![root.path().to_path_buf()]))
        .unwrap()
        .with_extractor(Arc::new(TextExtractor::new()));

    let recorder = Arc::new(Recorder::default());
    session.sync(Some(recorder.clone())).unwrap();

    assert_eq!(
        *recorder.phases.lock().unwrap(),
        vec![
            "start:scanning",
            "end:scanning",
            "start:extracting",
            "end:extracting",
            "start:indexing",
            "end:indexing",
        ]
    );
    assert_eq!(recorder.progress.load(Ordering::SeqCst), 5);
}

#[test]
fn test_search_during_sync_sees_a_complete_generation() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    write_pdf(root.path(), "Old.pdf", &["Royal Enfield Himalayan"]);

    let session = Arc::new(
        Session::open(config_for(state.path(), vec![root.path().to_path_buf()]))
            .unwrap()
            .with_extractor(Arc::new(TextExtractor::slow(Duration::from_millis(20)))),
    );
    session.sync(None).unwrap();

    for i in 0..20 {
        write_pdf(root.path(), &format!("New_{i:02}.pdf"), &["Royal Enfield Interceptor"]);
    }

    let syncing = {
        let session = Arc::clone(&session);
        thread::spawn(move || session.sync(None).unwrap())
    };

    // Every search sees either the old generation (1 file) or the new one (21);
    // new files only become candidates once the index is rebuilt
    loop {
        let files = session
            .search("royal enfield", false)
            .iter()
            .map(|m| m.filename.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .len();
        assert!(files == 1 || files == 21, "saw a partial generation of {files} files");
        if syncing.is_finished() {
            break;
        }
    }

    let report = syncing.join().unwrap();
    assert_eq!(report.extracted, 20);
    assert_eq!(session.search("interceptor", false).len(), 20);
}

#[test]
fn test_concurrent_syncs_are_serialized() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    for i in 0..8 {
        write_pdf(root.path(), &format!("m{i}.pdf"), &["text"]);
    }
    let session = Arc::new(
        Session::open(config_for(state.path(), vec![root.path().to_path_buf()]))
            .unwrap()
            .with_extractor(Arc::new(TextExtractor::slow(Duration::from_millis(10)))),
    );

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let session = Arc::clone(&session);
            thread::spawn(move || session.sync(None).unwrap())
        })
        .collect();
    let reports: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Exactly one of the two did the extraction work
    let extracted: usize = reports.iter().map(|r| r.extracted).sum();
    assert_eq!(extracted, 8);
    assert!(reports.iter().any(|r| r.valid == 8));
    assert_eq!(session.snapshot().len(), 8);
}

#[test]
fn test_stats_after_sync() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    write_pdf(root.path(), "a.pdf", &["one", "two", "three"]);
    write_pdf(root.path(), "b.pdf", &["CORRUPT"]);

    let session = Session::open(config_for(state.path(), vec![root.path().to_path_buf()]))
        .unwrap()
        .with_extractor(Arc::new(TextExtractor::new()));
    let report = session.sync(None).unwrap();
    assert!(report.has_failures());
    assert!(report.summary().contains("1 file(s) failed to extract"));

    let stats = session.stats();
    assert_eq!(stats.cached_files, 1);
    assert_eq!(stats.total_pages, 3);
    assert_eq!(stats.failed_files, 1);
    assert_eq!(stats.indexed_files, Some(1));
    assert!(stats.cache_bytes.unwrap() > 0);
    assert!(stats.index_bytes.unwrap() > 0);
}

#[test]
fn test_rebuild_index_after_manual_clear() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    write_pdf(root.path(), "a.pdf", &["Suzuki V-Strom"]);

    let session = Session::open(config_for(state.path(), vec![root.path().to_path_buf()]))
        .unwrap()
        .with_extractor(Arc::new(TextExtractor::new()));
    session.sync(None).unwrap();

    magsearch::index::TextIndex::new(state.path().join("text_index.db"))
        .clear()
        .unwrap();
    assert_eq!(session.stats().indexed_files, None);
    // Search still works through the full-scan fallback
    assert_eq!(session.search("v-strom", false).len(), 1);

    assert_eq!(session.rebuild_index().unwrap(), 1);
    assert_eq!(session.stats().indexed_files, Some(1));
}
