use super::support::{config_for, write_pdf, TextExtractor};
use magsearch::config::Config;
use magsearch::search::{group_by_file, FilterConfig};
use magsearch::session::Session;
use std::sync::Arc;
use tempfile::tempdir;

fn session_with(config: Config) -> Session {
    Session::open(config)
        .unwrap()
        .with_extractor(Arc::new(TextExtractor::new()))
}

#[test]
fn test_bmw_scenario_one_record_per_page() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    write_pdf(
        root.path(),
        "A.pdf",
        &["BMW test ride in the Alps", "local dealer advertisement BMW €999"],
    );

    let session = session_with(config_for(state.path(), vec![root.path().to_path_buf()]));
    session.sync(None).unwrap();

    let hits = session.search("BMW", false);
    assert_eq!(hits.len(), 2);
    assert_eq!((hits[0].page, hits[0].offset), (1, 0));
    assert_eq!((hits[1].page, hits[1].offset), (2, 27));
    assert_eq!(hits[0].snippet, "BMW test ride in the Alps");
    assert_eq!(hits[1].matched(), "BMW");
    assert_eq!(hits[1].page_count, 2);
    assert_eq!(hits[1].path, root.path().join("A.pdf"));
}

#[test]
fn test_empty_keyword_returns_nothing() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    write_pdf(root.path(), "A.pdf", &["anything"]);

    let session = session_with(config_for(state.path(), vec![root.path().to_path_buf()]));
    session.sync(None).unwrap();

    assert!(session.search("", false).is_empty());
    assert!(session.search("   ", true).is_empty());
}

#[test]
fn test_results_ordered_by_file_page_offset() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    write_pdf(root.path(), "b.pdf", &["gs gs", "gs"]);
    write_pdf(root.path(), "a.pdf", &["none", "GS"]);

    let session = session_with(config_for(state.path(), vec![root.path().to_path_buf()]));
    session.sync(None).unwrap();

    let order: Vec<(String, usize, usize)> = session
        .search("gs", false)
        .into_iter()
        .map(|m| (m.filename, m.page, m.offset))
        .collect();
    assert_eq!(
        order,
        vec![
            ("a.pdf".to_string(), 2, 0),
            ("b.pdf".to_string(), 1, 0),
            ("b.pdf".to_string(), 1, 3),
            ("b.pdf".to_string(), 2, 0),
        ]
    );
}

#[test]
fn test_results_follow_root_discovery_order() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    let state = tempdir().unwrap();
    write_pdf(first.path(), "z.pdf", &["Ducati Monster"]);
    write_pdf(second.path(), "a.pdf", &["Ducati Panigale", "Ducati Scrambler"]);

    let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];
    let session = session_with(config_for(state.path(), roots));
    session.sync(None).unwrap();

    let order: Vec<(String, usize)> = session
        .search("ducati", false)
        .into_iter()
        .map(|m| (m.filename, m.page))
        .collect();
    assert_eq!(
        order,
        vec![
            ("z.pdf".to_string(), 1),
            ("a.pdf".to_string(), 1),
            ("a.pdf".to_string(), 2),
        ]
    );
}

#[test]
fn test_greek_final_sigma_matches_any_spelling() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    write_pdf(root.path(), "Moto_GR.pdf", &["ΝΕΟΣ ΔΡΟΜΟΣ για μοτοσικλέτες"]);

    let session = session_with(config_for(state.path(), vec![root.path().to_path_buf()]));
    session.sync(None).unwrap();

    for keyword in ["ΔΡΟΜΟΣ", "δρομος", "Δρομοσ"] {
        let hits = session.search(keyword, false);
        assert_eq!(hits.len(), 1, "{keyword}");
        assert_eq!(hits[0].offset, 5);
        assert_eq!(hits[0].matched(), "ΔΡΟΜΟΣ");
    }
}

#[test]
fn test_context_window_is_clipped_not_padded() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    let long = format!("{} Vespa {}", "x".repeat(300), "y".repeat(300));
    write_pdf(root.path(), "A.pdf", &["Vespa at start", &long, "ends with Vespa"]);

    let mut config = config_for(state.path(), vec![root.path().to_path_buf()]);
    config.context_chars = 20;
    let session = session_with(config);
    session.sync(None).unwrap();

    let hits = session.search("vespa", false);
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].snippet, "Vespa at start");
    assert_eq!(hits[1].snippet.chars().count(), 20 + 5 + 20);
    assert_eq!(hits[1].matched(), "Vespa");
    assert_eq!(hits[2].snippet, "ends with Vespa");
}

#[test]
fn test_post_filter_skips_pages_and_ads() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    write_pdf(
        root.path(),
        "A.pdf",
        &[
            "Cover: Harley special",
            "Harley Pan America review",
            "Harley dealer Anzeige",
            "Harley index",
        ],
    );

    let mut config = config_for(state.path(), vec![root.path().to_path_buf()]);
    config.filter = FilterConfig {
        skip_first_pages: 1,
        skip_last_pages: 1,
        blacklist: vec!["anzeige".into()],
    };
    let session = session_with(config);
    session.sync(None).unwrap();

    let filtered = session.search("harley", true);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].page, 2);

    assert_eq!(session.search("harley", false).len(), 4);
}

#[test]
fn test_grouping_by_file() {
    let root = tempdir().unwrap();
    let state = tempdir().unwrap();
    write_pdf(root.path(), "One.pdf", &["Africa Twin"]);
    write_pdf(root.path(), "Two.pdf", &["Africa Twin", "Africa Twin again"]);

    let session = session_with(config_for(state.path(), vec![root.path().to_path_buf()]));
    session.sync(None).unwrap();

    let groups = group_by_file(session.search("africa twin", false));
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].filename, "Two.pdf");
    assert_eq!(groups[0].pages(), vec![1, 2]);
    assert_eq!(groups[1].filename, "One.pdf");
}
