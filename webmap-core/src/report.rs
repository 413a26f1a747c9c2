// Crawl artifacts: adjacency JSON, tree JSON and the HTML viewer

use crate::tree::TreeNode;
use askama::Template;
use chrono::Utc;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use webmap_scanner::SiteGraph;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// Collapsible D3 tree over the inlined `tree.json`.
#[derive(Template)]
#[template(path = "viewer.html")]
pub struct ViewerTemplate<'a> {
    pub title: &'a str,
    pub pages: usize,
    pub nodes: usize,
    pub depth: usize,
    pub generated: String,
    /// Already safe to inline in a script element.
    pub tree_json: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Hierarchy,
    Tree,
    Viewer,
}

impl Artifact {
    pub const ALL: [Artifact; 3] = [Artifact::Hierarchy, Artifact::Tree, Artifact::Viewer];

    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Hierarchy => "sitemap_hier.json",
            Artifact::Tree => "tree.json",
            Artifact::Viewer => "site_map_view.html",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub hierarchy: PathBuf,
    pub tree: PathBuf,
    pub viewer: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            hierarchy: dir.join(Artifact::Hierarchy.file_name()),
            tree: dir.join(Artifact::Tree.file_name()),
            viewer: dir.join(Artifact::Viewer.file_name()),
        }
    }

    pub fn get(&self, artifact: Artifact) -> &Path {
        match artifact {
            Artifact::Hierarchy => &self.hierarchy,
            Artifact::Tree => &self.tree,
            Artifact::Viewer => &self.viewer,
        }
    }
}

/// `{ url: [links...] }`, keys and links sorted.
pub fn generate_hierarchy_json(graph: &SiteGraph) -> std::result::Result<String, serde_json::Error> {
    let adjacency: BTreeMap<&str, Vec<&str>> = graph.adjacency();
    serde_json::to_string_pretty(&adjacency)
}

pub fn generate_tree_json(tree: &TreeNode) -> std::result::Result<String, serde_json::Error> {
    serde_json::to_string_pretty(tree)
}

pub fn generate_viewer_html(tree: &TreeNode, page_count: usize) -> Result<String> {
    // Keep the inline JSON from closing its script element.
    let tree_json = serde_json::to_string(tree)?.replace("</", "<\\/");
    let template = ViewerTemplate {
        title: &tree.name,
        pages: page_count,
        nodes: tree.size(),
        depth: tree.depth(),
        generated: Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
        tree_json,
    };
    Ok(template.render()?)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Write all three artifacts into `dir`, creating it if needed.
/// Returns `None` without touching the filesystem when nothing was crawled.
pub fn write_artifacts(
    graph: &SiteGraph,
    tree: &TreeNode,
    dir: &Path,
) -> Result<Option<ArtifactPaths>> {
    if graph.is_empty() {
        return Ok(None);
    }

    fs::create_dir_all(dir)?;
    let paths = ArtifactPaths::in_dir(dir);

    save_report(&generate_hierarchy_json(graph)?, &paths.hierarchy)?;
    save_report(&generate_tree_json(tree)?, &paths.tree)?;
    save_report(&generate_viewer_html(tree, graph.len())?, &paths.viewer)?;

    for artifact in Artifact::ALL {
        info!("Saved {}", paths.get(artifact).display());
    }
    Ok(Some(paths))
}
