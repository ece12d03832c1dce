use super::support::{write_pdf, TextExtractor};
use magsearch::cache::CacheStore;
use magsearch::extraction::{extract_all, pool_size, ExtractionConfig};
use magsearch::retry::RetryPolicy;
use magsearch::scanner::{PathResolver, WalkerConfig};
use std::path::Path;
use std::time::{Duration, Instant};
use tempfile::tempdir;

const PER_FILE: Duration = Duration::from_millis(40);

fn fifty_files(dir: &Path) {
    for i in 1..=50 {
        let name = format!("mag_{i:02}.pdf");
        if i == 17 {
            write_pdf(dir, &name, &["CORRUPT"]);
        } else {
            write_pdf(dir, &name, &[&format!("issue {i} page one"), "page two"]);
        }
    }
}

#[test]
fn test_fifty_files_four_workers_one_corrupt() {
    let dir = tempdir().unwrap();
    fifty_files(dir.path());
    let resolver = PathResolver::build(
        &[dir.path().to_path_buf()],
        &WalkerConfig::default().with_retry(RetryPolicy::none()),
    );
    assert_eq!(resolver.len(), 50);

    let extractor = TextExtractor::slow(PER_FILE);
    let config = ExtractionConfig::default().with_max_workers(4);

    let started = Instant::now();
    let batch = extract_all(resolver.files().to_vec(), &extractor, &config);
    let elapsed = started.elapsed();

    assert_eq!(batch.extracted.len(), 49);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].name, "mag_17.pdf");
    assert!(batch.is_complete());

    let mut store = CacheStore::new();
    let (files, failed) = batch.into_cache_parts();
    store.merge(files, failed);
    assert_eq!(store.len(), 49);
    assert!(!store.contains("mag_17.pdf"));
    assert!(store.failures().contains_key("mag_17.pdf"));
    assert_eq!(store.get("mag_03.pdf").unwrap().page_count(), 2);

    // Only meaningful on machines that can actually run workers in parallel
    if pool_size(4) > 1 {
        let sequential = PER_FILE * 50;
        assert!(
            elapsed < sequential,
            "parallel extraction took {elapsed:?}, sequential estimate {sequential:?}"
        );
    }
}

#[test]
fn test_single_worker_still_isolates_failures() {
    let dir = tempdir().unwrap();
    write_pdf(dir.path(), "a.pdf", &["ok"]);
    write_pdf(dir.path(), "b.pdf", &["CORRUPT"]);
    write_pdf(dir.path(), "c.pdf", &["ok"]);
    let resolver = PathResolver::build(&[dir.path().to_path_buf()], &WalkerConfig::default());

    let config = ExtractionConfig::default().with_max_workers(1);
    let batch = extract_all(resolver.files().to_vec(), &TextExtractor::new(), &config);

    let names: Vec<&str> = batch.extracted.iter().map(|e| e.entry.name.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "c.pdf"]);
    assert_eq!(batch.failures[0].name, "b.pdf");
}

#[test]
fn test_deadline_skips_unstarted_files() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        write_pdf(dir.path(), &format!("m{i:02}.pdf"), &["text"]);
    }
    let resolver = PathResolver::build(&[dir.path().to_path_buf()], &WalkerConfig::default());

    let config = ExtractionConfig::default()
        .with_max_workers(2)
        .with_timeout(Some(Duration::from_millis(50)));
    let batch = extract_all(
        resolver.files().to_vec(),
        &TextExtractor::slow(Duration::from_millis(30)),
        &config,
    );

    assert!(batch.timed_out);
    assert!(!batch.skipped.is_empty());
    assert_eq!(batch.extracted.len() + batch.skipped.len(), 20);
    assert!(batch.failures.is_empty());
}
