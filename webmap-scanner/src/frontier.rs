//! FIFO frontier with a lifetime dedup set and a fan-out cap.

use crate::normalize::{SiteScope, normalize};
use std::collections::{HashSet, VecDeque};
use tracing::debug;

pub struct Frontier {
    queue: VecDeque<String>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    scope: SiteScope,
    max_pages: usize,
}

impl Frontier {
    pub fn new(scope: SiteScope, max_pages: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            scope,
            max_pages,
        }
    }

    /// Admit `url` if it is same-site, unseen, and the frontier has room.
    pub fn enqueue(&mut self, url: &str) -> bool {
        let url = normalize(url);
        if url.is_empty() || !self.scope.contains(&url) {
            return false;
        }
        if self.visited.contains(&url) || self.queued.contains(&url) {
            return false;
        }
        if self.visited.len() + self.queue.len() >= self.max_pages.saturating_mul(2) {
            debug!("Frontier full, dropping {}", url);
            return false;
        }

        self.queued.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    /// Next URL in FIFO order, marked visited. `None` once the frontier is
    /// empty or the page budget is spent.
    pub fn dequeue(&mut self) -> Option<String> {
        if self.budget_spent() {
            return None;
        }
        let url = self.queue.pop_front()?;
        self.visited.insert(url.clone());
        Some(url)
    }

    pub fn budget_spent(&self) -> bool {
        self.visited.len() >= self.max_pages
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    pub fn scope(&self) -> &SiteScope {
        &self.scope
    }
}
