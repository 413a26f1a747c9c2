use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How a page's links were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSource {
    Rendered,
    Fallback,
    Unreachable,
}

/// Per-channel link counts, kept for diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCounts {
    pub anchors: usize,
    pub handlers: usize,
    pub routing: usize,
    pub clicks: usize,
    pub fallback: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub links: BTreeSet<String>,
    pub source: PageSource,
    pub counts: ChannelCounts,
}

impl PageRecord {
    pub fn new(url: String, links: BTreeSet<String>, source: PageSource) -> Self {
        Self {
            url,
            links,
            source,
            counts: ChannelCounts::default(),
        }
    }

    pub fn unreachable(url: String) -> Self {
        Self::new(url, BTreeSet::new(), PageSource::Unreachable)
    }

    pub fn with_counts(mut self, counts: ChannelCounts) -> Self {
        self.counts = counts;
        self
    }
}

/// Visited URL -> its record. Written once per page, never overwritten.
#[derive(Debug, Clone, Default)]
pub struct SiteGraph {
    pages: BTreeMap<String, PageRecord>,
}

impl SiteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record. Returns false (and keeps the first record) if the URL
    /// already has one.
    pub fn insert(&mut self, record: PageRecord) -> bool {
        if self.pages.contains_key(&record.url) {
            return false;
        }
        self.pages.insert(record.url.clone(), record);
        true
    }

    pub fn get(&self, url: &str) -> Option<&PageRecord> {
        self.pages.get(url)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> impl Iterator<Item = &PageRecord> {
        self.pages.values()
    }

    /// Every URL the crawl saw: visited pages and their outbound links.
    pub fn all_urls(&self) -> BTreeSet<&str> {
        let mut urls = BTreeSet::new();
        for record in self.pages.values() {
            urls.insert(record.url.as_str());
            urls.extend(record.links.iter().map(String::as_str));
        }
        urls
    }

    /// Adjacency view: visited URL -> sorted outbound links.
    pub fn adjacency(&self) -> BTreeMap<&str, Vec<&str>> {
        self.pages
            .iter()
            .map(|(url, record)| {
                (
                    url.as_str(),
                    record.links.iter().map(String::as_str).collect(),
                )
            })
            .collect()
    }

    pub fn total_links(&self) -> usize {
        self.pages.values().map(|r| r.links.len()).sum()
    }
}
