// Tests for artifact generation

use std::collections::BTreeSet;
use tempfile::TempDir;
use webmap_core::report::{
    Artifact, ArtifactPaths, generate_hierarchy_json, generate_tree_json, write_artifacts,
};
use webmap_core::tree::build_site_tree;
use webmap_scanner::{PageRecord, PageSource, SiteGraph};

fn record(url: &str, links: &[&str]) -> PageRecord {
    PageRecord::new(
        url.to_string(),
        links.iter().map(|l| l.to_string()).collect::<BTreeSet<_>>(),
        PageSource::Rendered,
    )
}

fn sample_graph() -> SiteGraph {
    let mut graph = SiteGraph::new();
    graph.insert(record(
        "https://ex.com/",
        &["https://ex.com/docs", "https://ex.com/about"],
    ));
    graph.insert(record("https://ex.com/about", &["https://ex.com/"]));
    graph
}

// ============================================================================
// Artifact Naming Tests
// ============================================================================

#[test]
fn test_artifact_file_names() {
    assert_eq!(Artifact::Hierarchy.file_name(), "sitemap_hier.json");
    assert_eq!(Artifact::Tree.file_name(), "tree.json");
    assert_eq!(Artifact::Viewer.file_name(), "site_map_view.html");
}

// ============================================================================
// Content Tests
// ============================================================================

#[test]
fn test_hierarchy_json_is_sorted_adjacency() {
    let json = generate_hierarchy_json(&sample_graph()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let map = value.as_object().unwrap();
    let keys: Vec<&String> = map.keys().collect();
    assert_eq!(keys, vec!["https://ex.com/", "https://ex.com/about"]);
    assert_eq!(
        value["https://ex.com/"],
        serde_json::json!(["https://ex.com/about", "https://ex.com/docs"])
    );
    // Link-only URLs never become keys.
    assert!(value.get("https://ex.com/docs").is_none());
}

#[test]
fn test_tree_json_includes_link_only_urls() {
    let graph = sample_graph();
    let tree = build_site_tree("https://ex.com/", &graph).unwrap();
    let json = generate_tree_json(&tree).unwrap();
    assert!(json.contains("\"name\": \"docs\""));
    assert!(json.contains("\"name\": \"about\""));
}

// ============================================================================
// Writing Tests
// ============================================================================

#[test]
fn test_write_artifacts_creates_all_files() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("outputs");
    let graph = sample_graph();
    let tree = build_site_tree("https://ex.com/", &graph).unwrap();

    let paths = write_artifacts(&graph, &tree, &dir).unwrap().unwrap();

    for artifact in Artifact::ALL {
        let path = paths.get(artifact);
        assert!(path.exists(), "{} missing", path.display());
        assert!(path.starts_with(&dir));
    }
    let html = std::fs::read_to_string(&paths.viewer).unwrap();
    assert!(html.contains("\"name\":\"ex.com\""));
    assert!(html.contains("2 pages"));
}

#[test]
fn test_empty_crawl_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("outputs");
    let graph = SiteGraph::new();
    let tree = build_site_tree("https://ex.com/", &graph).unwrap();

    let written = write_artifacts(&graph, &tree, &dir).unwrap();
    assert!(written.is_none());
    assert!(!dir.exists());
}

#[test]
fn test_artifact_paths_in_dir() {
    let temp = TempDir::new().unwrap();
    let paths = ArtifactPaths::in_dir(temp.path());
    assert_eq!(paths.tree, temp.path().join("tree.json"));
    assert_eq!(paths.get(Artifact::Hierarchy), temp.path().join("sitemap_hier.json"));
}
