use super::support::write_pdf;
use magsearch::retry::RetryPolicy;
use magsearch::scanner::{PathResolver, ResolveError, WalkerConfig};
use tempfile::tempdir;

fn walker_config() -> WalkerConfig {
    WalkerConfig::new(false, true, Vec::new()).with_retry(RetryPolicy::none())
}

#[test]
fn test_duplicate_name_last_root_wins() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    write_pdf(first.path(), "B.pdf", &["first copy"]);
    write_pdf(second.path(), "B.pdf", &["second copy"]);

    let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];
    let resolver = PathResolver::build(&roots, &walker_config());
    assert_eq!(resolver.resolve("B.pdf").unwrap(), second.path().join("B.pdf"));
    assert_eq!(resolver.shadowed(), 1);

    // Same roots, reversed order: the other copy wins
    let reversed = vec![second.path().to_path_buf(), first.path().to_path_buf()];
    let resolver = PathResolver::build(&reversed, &walker_config());
    assert_eq!(resolver.resolve("B.pdf").unwrap(), first.path().join("B.pdf"));
}

#[test]
fn test_resolution_is_deterministic() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    write_pdf(first.path(), "B.pdf", &["x"]);
    write_pdf(second.path(), "B.pdf", &["y"]);
    let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];

    let expected = PathResolver::build(&roots, &walker_config()).resolve("B.pdf").unwrap();
    for _ in 0..5 {
        let again = PathResolver::build(&roots, &walker_config()).resolve("B.pdf").unwrap();
        assert_eq!(again, expected);
    }
}

#[test]
fn test_unknown_name_is_not_found_and_scan_continues() {
    let root = tempdir().unwrap();
    write_pdf(root.path(), "Motorrad_2023_05.pdf", &["x"]);
    let missing = root.path().join("does-not-exist");

    let roots = vec![missing.clone(), root.path().to_path_buf()];
    let resolver = PathResolver::build(&roots, &walker_config());

    assert_eq!(resolver.len(), 1);
    assert_eq!(resolver.offline_roots(), [missing].as_slice());
    match resolver.resolve("Motorrad_2023_06.pdf") {
        Err(ResolveError::NotFound { suggestion, .. }) => {
            assert_eq!(suggestion.as_deref(), Some("Motorrad_2023_05.pdf"));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn test_non_recursive_ignores_subdirectories() {
    let root = tempdir().unwrap();
    write_pdf(root.path(), "Top.pdf", &["x"]);
    write_pdf(&root.path().join("2023"), "Nested.pdf", &["x"]);

    let flat = PathResolver::build(&[root.path().to_path_buf()], &walker_config());
    assert!(flat.resolve("Nested.pdf").is_err());

    let deep_config = WalkerConfig::new(true, true, Vec::new()).with_retry(RetryPolicy::none());
    let deep = PathResolver::build(&[root.path().to_path_buf()], &deep_config);
    assert_eq!(
        deep.resolve("Nested.pdf").unwrap(),
        root.path().join("2023").join("Nested.pdf")
    );
}
