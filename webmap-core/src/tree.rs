//! Path-segment hierarchy over the crawled URL set.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use url::Url;
use webmap_scanner::SiteGraph;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }

    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TreeNode::depth).max().unwrap_or(0)
    }

    pub fn find(&self, name: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

struct Slot {
    name: String,
    url: Option<String>,
    children: Vec<usize>,
}

/// Tree of every URL in `graph` (pages and their links) on the start URL's host.
pub fn build_site_tree(start_url: &str, graph: &SiteGraph) -> Option<TreeNode> {
    build_tree(start_url, graph.all_urls())
}

/// Build the hierarchy rooted at `start_url`'s host.
///
/// The root carries the site origin (`scheme://host/`) whatever path the
/// crawl started from. URLs on other hosts, or that do not parse, are
/// ignored. Input order does not matter: URLs are placed in lexicographic
/// order so the same set always yields the same tree.
pub fn build_tree<'a, I>(start_url: &str, urls: I) -> Option<TreeNode>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut origin = Url::parse(start_url).ok()?;
    let host = origin.host_str()?.to_string();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    let sorted: BTreeSet<&str> = urls.into_iter().collect();

    let mut slots = vec![Slot {
        name: host.clone(),
        url: Some(origin.to_string()),
        children: Vec::new(),
    }];
    let mut index: HashMap<String, usize> = HashMap::new();

    for url in sorted {
        let Ok(parsed) = Url::parse(url) else {
            continue;
        };
        if parsed.host_str() != Some(host.as_str()) {
            continue;
        }

        let mut current = 0;
        let mut prefix = String::new();
        for segment in parsed.path().split('/').filter(|s| !s.is_empty()) {
            prefix.push('/');
            prefix.push_str(segment);

            current = match index.get(&prefix) {
                Some(&existing) => existing,
                None => {
                    let id = slots.len();
                    slots.push(Slot {
                        name: segment.to_string(),
                        url: None,
                        children: Vec::new(),
                    });
                    slots[current].children.push(id);
                    index.insert(prefix.clone(), id);
                    id
                }
            };
        }
        slots[current].url = Some(url.to_string());
    }

    Some(assemble(&slots, 0))
}

fn assemble(slots: &[Slot], id: usize) -> TreeNode {
    let slot = &slots[id];
    TreeNode {
        name: slot.name.clone(),
        url: slot.url.clone(),
        children: slot
            .children
            .iter()
            .map(|&child| assemble(slots, child))
            .collect(),
    }
}

/// Indented box-drawing view of the tree, one node per line.
pub fn render_tree(root: &TreeNode) -> String {
    let mut out = format!("{}\n", root.name);
    render_children(root, "", &mut out);
    out
}

fn render_children(node: &TreeNode, indent: &str, out: &mut String) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let last = i + 1 == count;
        out.push_str(indent);
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(&child.name);
        if child.url.is_none() {
            out.push_str(" (no page)");
        }
        out.push('\n');

        if !child.is_leaf() {
            let next = format!("{}{}", indent, if last { "    " } else { "│   " });
            render_children(child, &next, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intermediate_nodes_have_no_url() {
        let tree = build_tree("https://ex.com/", ["https://ex.com/docs/api/v1"]).unwrap();
        let docs = tree.find("docs").unwrap();
        assert!(docs.url.is_none());
        let v1 = docs.find("api").unwrap().find("v1").unwrap();
        assert_eq!(v1.url.as_deref(), Some("https://ex.com/docs/api/v1"));
        assert!(v1.is_leaf());
        assert_eq!(tree.depth(), 4);
    }

    #[test]
    fn test_root_carries_origin_for_deep_start() {
        let tree = build_tree(
            "https://ex.com/docs",
            ["https://ex.com/docs", "https://ex.com/docs/intro"],
        )
        .unwrap();
        assert_eq!(tree.name, "ex.com");
        assert_eq!(tree.url.as_deref(), Some("https://ex.com/"));
        let docs = tree.find("docs").unwrap();
        assert_eq!(docs.url.as_deref(), Some("https://ex.com/docs"));
        assert_eq!(
            docs.find("intro").unwrap().url.as_deref(),
            Some("https://ex.com/docs/intro")
        );
    }

    #[test]
    fn test_root_origin_keeps_port() {
        let tree = build_tree("http://127.0.0.1:8080/app?x=1", ["http://127.0.0.1:8080/app"]).unwrap();
        assert_eq!(tree.url.as_deref(), Some("http://127.0.0.1:8080/"));
    }

    #[test]
    fn test_root_path_url_lands_on_root() {
        let tree = build_tree("https://ex.com", ["https://ex.com/"]).unwrap();
        assert_eq!(tree.url.as_deref(), Some("https://ex.com/"));
        assert!(tree.is_leaf());
    }

    #[test]
    fn test_render_tree() {
        let tree = build_tree(
            "https://ex.com/",
            ["https://ex.com/a", "https://ex.com/a/b", "https://ex.com/c/d"],
        )
        .unwrap();
        let text = render_tree(&tree);
        assert_eq!(
            text,
            "ex.com\n├── a\n│   └── b\n└── c (no page)\n    └── d\n"
        );
    }

    #[test]
    fn test_invalid_start_url() {
        assert!(build_tree("not a url", ["https://ex.com/a"]).is_none());
    }
}
