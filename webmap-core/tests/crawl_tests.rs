// Tests for crawl execution and the text summary

use std::sync::{Arc, Mutex};
use webmap_core::crawl::{CrawlProgressCallback, extract_url_path, generate_crawl_report, run_crawl};
use webmap_core::tree::{build_site_tree, render_tree};
use webmap_scanner::mock::{MockElement, MockFetcher, MockPage, MockSession};
use webmap_scanner::{CrawlConfig, PageSource};

fn config(max_pages: usize) -> CrawlConfig {
    CrawlConfig::default()
        .with_max_pages(max_pages)
        .with_delay(std::time::Duration::from_millis(50))
}

// ============================================================================
// URL Path Extraction Tests
// ============================================================================

#[test]
fn test_extract_url_path_root() {
    assert_eq!(extract_url_path("https://ex.com/"), "/");
    assert_eq!(extract_url_path("https://ex.com"), "/");
}

#[test]
fn test_extract_url_path_nested() {
    assert_eq!(extract_url_path("https://ex.com/about/team"), "/about/team");
}

#[test]
fn test_extract_url_path_drops_query_and_fragment() {
    assert_eq!(extract_url_path("https://ex.com/docs?page=2#intro"), "/docs");
}

#[test]
fn test_extract_url_path_invalid_url() {
    let url = "not a valid url";
    assert_eq!(extract_url_path(url), url);
}

// ============================================================================
// End-to-end Crawl Tests
// ============================================================================

fn about_site() -> MockSession {
    MockSession::new()
        .with_page("https://ex.com", MockPage::linking(&["/about"]))
        .with_page("https://ex.com/about", MockPage::linking(&["/about/team", "/"]))
        .with_page("https://ex.com/about/team", MockPage::linking(&["/about"]))
}

#[tokio::test(start_paused = true)]
async fn test_end_to_end_about_team() {
    let mut session = about_site();
    let fetcher = MockFetcher::new();

    let graph = run_crawl(&mut session, &fetcher, "https://ex.com", config(10), None)
        .await
        .unwrap();

    let keys: Vec<&str> = graph.adjacency().keys().copied().collect();
    assert_eq!(
        keys,
        vec!["https://ex.com/", "https://ex.com/about", "https://ex.com/about/team"]
    );

    let tree = build_site_tree("https://ex.com/", &graph).unwrap();
    assert_eq!(tree.name, "ex.com");
    assert_eq!(tree.children.len(), 1);
    let about = &tree.children[0];
    assert_eq!(about.name, "about");
    assert_eq!(about.url.as_deref(), Some("https://ex.com/about"));
    assert_eq!(about.children.len(), 1);
    assert_eq!(about.children[0].name, "team");
    assert!(about.children[0].is_leaf());
}

#[tokio::test(start_paused = true)]
async fn test_progress_messages() {
    let mut session = about_site();
    let fetcher = MockFetcher::new();
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = messages.clone();
    let callback: CrawlProgressCallback = Arc::new(move |m: String| {
        sink.lock().unwrap().push(m);
    });

    run_crawl(&mut session, &fetcher, "https://ex.com", config(10), Some(callback))
        .await
        .unwrap();

    let messages = messages.lock().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], "[1/10] https://ex.com/");
    assert_eq!(messages[2], "[3/10] https://ex.com/about/team");
}

#[tokio::test(start_paused = true)]
async fn test_session_left_on_crawled_page_after_clicks() {
    let root = MockPage::linking(&["/about"]).with_elements(vec![
        MockElement::hidden(),
        MockElement::navigates_to("https://ex.com/pricing"),
        MockElement::broken(),
    ]);
    let mut session = MockSession::new()
        .with_page("https://ex.com", root)
        .with_page("https://ex.com/about", MockPage::new())
        .with_page("https://ex.com/pricing", MockPage::new());
    let fetcher = MockFetcher::new();

    let graph = run_crawl(&mut session, &fetcher, "https://ex.com", config(10), None)
        .await
        .unwrap();

    assert_eq!(graph.len(), 3);
    assert_eq!(session.clicks(), 2);
    assert!(
        session
            .click_origins()
            .iter()
            .all(|origin| origin == "https://ex.com/")
    );
}

// ============================================================================
// Report Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_crawl_report_summary() {
    let mut session = about_site().failing_navigation_to("https://ex.com/about/team");
    let fetcher = MockFetcher::new()
        .with_body("https://ex.com/about/team", "<a href='/about/team/alice'>A</a>");

    let graph = run_crawl(&mut session, &fetcher, "https://ex.com", config(3), None)
        .await
        .unwrap();
    assert_eq!(
        graph.get("https://ex.com/about/team").unwrap().source,
        PageSource::Fallback
    );

    let tree = build_site_tree("https://ex.com/", &graph).unwrap();
    let tree_text = render_tree(&tree);
    let report = generate_crawl_report(&graph, Some(&tree_text));

    assert!(report.contains("Pages crawled: 3"));
    assert!(report.contains("rendered 2, static fallback 1, unreachable 0"));
    assert!(report.contains("/about/team"));
    assert!(report.contains("## Tree"));
    assert!(report.contains("alice"));
}
