//! Scripted in-memory [`RenderSession`] and [`PageFetcher`] for tests.
//!
//! Pages are keyed by canonical URL. The session keeps a browser-like
//! history stack so back-navigation and restoration can be exercised
//! without Chromium.

use crate::config::CLICK_CANDIDATES;
use crate::error::{CrawlError, Result, SessionError, SessionResult};
use crate::normalize::normalize;
use crate::session::{BoundingBox, NavigationSignal, PageFetcher, RenderSession};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

fn key(url: &str) -> String {
    Url::parse(url)
        .map(|u| normalize(u.as_str()))
        .unwrap_or_else(|_| normalize(url))
}

fn browser_form(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

#[derive(Debug, Clone, PartialEq)]
enum Behavior {
    Inert,
    Hidden,
    NavigatesTo(String),
    Fails,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    behavior: Behavior,
}

impl MockElement {
    /// Visible, clickable, goes nowhere.
    pub fn inert() -> Self {
        Self {
            behavior: Behavior::Inert,
        }
    }

    /// No layout box.
    pub fn hidden() -> Self {
        Self {
            behavior: Behavior::Hidden,
        }
    }

    pub fn navigates_to(url: &str) -> Self {
        Self {
            behavior: Behavior::NavigatesTo(url.to_string()),
        }
    }

    /// Visible, but every click errors.
    pub fn broken() -> Self {
        Self {
            behavior: Behavior::Fails,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockPage {
    markup: String,
    selectors: HashMap<String, Vec<MockElement>>,
    /// Document height reported by successive measurements; the last repeats.
    heights: Vec<u64>,
    grows: bool,
}

impl Default for MockPage {
    fn default() -> Self {
        Self {
            markup: "<html><body></body></html>".to_string(),
            selectors: HashMap::new(),
            heights: vec![1200],
            grows: false,
        }
    }
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page whose body is just anchors to `hrefs`.
    pub fn linking(hrefs: &[&str]) -> Self {
        let anchors: String = hrefs
            .iter()
            .map(|href| format!("<a href=\"{}\">{}</a>", href, href))
            .collect();
        Self::new().with_markup(&format!("<html><body>{}</body></html>", anchors))
    }

    pub fn with_markup(mut self, markup: &str) -> Self {
        self.markup = markup.to_string();
        self
    }

    /// Elements returned for the default click-candidate selector.
    pub fn with_elements(self, elements: Vec<MockElement>) -> Self {
        self.with_selector(CLICK_CANDIDATES, elements)
    }

    pub fn with_selector(mut self, selector: &str, elements: Vec<MockElement>) -> Self {
        self.selectors.insert(selector.to_string(), elements);
        self
    }

    pub fn with_scroll_heights(mut self, heights: &[u64]) -> Self {
        self.heights = heights.to_vec();
        self
    }

    /// Infinite feed: every measurement is taller than the last.
    pub fn growing(mut self) -> Self {
        self.grows = true;
        self
    }

    fn height_at(&self, measurement: usize) -> u64 {
        if self.grows {
            return 1200 + 600 * measurement as u64;
        }
        self.heights
            .get(measurement)
            .or(self.heights.last())
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct MockSession {
    pages: HashMap<String, MockPage>,
    history: Vec<String>,
    position: usize,
    failing_back: bool,
    failing_navigation: HashSet<String>,
    /// URL -> navigations that still succeed before it starts failing.
    failing_after: HashMap<String, usize>,
    timing_out: HashSet<String>,
    navigations: Vec<String>,
    /// Height measurements taken so far, per page.
    measurements: HashMap<String, usize>,
    click_origins: Vec<String>,
    hovers: usize,
    scrolls: usize,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, page: MockPage) -> Self {
        self.pages.insert(key(url), page);
        self
    }

    pub fn failing_back(mut self) -> Self {
        self.failing_back = true;
        self
    }

    /// `navigate` to this URL errors.
    pub fn failing_navigation_to(mut self, url: &str) -> Self {
        self.failing_navigation.insert(key(url));
        self
    }

    /// `navigate` to this URL succeeds `allowed` times, then errors.
    pub fn failing_navigation_after(mut self, url: &str, allowed: usize) -> Self {
        self.failing_after.insert(key(url), allowed);
        self
    }

    /// `navigate` to this URL times out.
    pub fn timing_out_on(mut self, url: &str) -> Self {
        self.timing_out.insert(key(url));
        self
    }

    /// Put the session on `url` without going through `navigate`.
    pub fn open(&mut self, url: &str) {
        self.push(url);
    }

    pub fn location(&self) -> Option<&str> {
        self.history.get(self.position).map(String::as_str)
    }

    /// Every `navigate` call, in order, as requested.
    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    /// Location of the session at the moment of each click.
    pub fn click_origins(&self) -> &[String] {
        &self.click_origins
    }

    pub fn clicks(&self) -> usize {
        self.click_origins.len()
    }

    pub fn hovers(&self) -> usize {
        self.hovers
    }

    pub fn scrolls(&self) -> usize {
        self.scrolls
    }

    fn push(&mut self, url: &str) {
        if !self.history.is_empty() {
            self.history.truncate(self.position + 1);
        }
        self.history.push(browser_form(url));
        self.position = self.history.len() - 1;
    }

    fn page(&self) -> Option<&MockPage> {
        self.location().and_then(|url| self.pages.get(&key(url)))
    }
}

#[async_trait]
impl RenderSession for MockSession {
    type Element = MockElement;

    async fn navigate(&mut self, url: &str, timeout: Duration) -> SessionResult<()> {
        self.navigations.push(url.to_string());
        let target = key(url);
        if self.timing_out.contains(&target) {
            return Err(SessionError::TimedOut(timeout));
        }
        let exhausted = match self.failing_after.get_mut(&target) {
            Some(0) => true,
            Some(allowed) => {
                *allowed -= 1;
                false
            }
            None => false,
        };
        if exhausted || self.failing_navigation.contains(&target) {
            return Err(SessionError::Failed(format!("net::ERR_FAILED at {}", url)));
        }
        self.push(url);
        Ok(())
    }

    async fn evaluate(&mut self, _script: &str) -> SessionResult<serde_json::Value> {
        let Some(page_key) = self.location().map(key) else {
            return Ok(serde_json::json!(0));
        };
        let taken = self.measurements.entry(page_key.clone()).or_insert(0);
        let measurement = *taken;
        *taken += 1;
        let height = self
            .pages
            .get(&page_key)
            .map(|p| p.height_at(measurement))
            .unwrap_or(0);
        Ok(serde_json::json!(height))
    }

    async fn query(&mut self, selector: &str) -> SessionResult<Vec<MockElement>> {
        Ok(self
            .page()
            .and_then(|p| p.selectors.get(selector))
            .cloned()
            .unwrap_or_default())
    }

    async fn bounding_box(&mut self, element: &MockElement) -> SessionResult<Option<BoundingBox>> {
        Ok(match element.behavior {
            Behavior::Hidden => None,
            _ => Some(BoundingBox {
                x: 10.0,
                y: 10.0,
                width: 80.0,
                height: 24.0,
            }),
        })
    }

    async fn click(
        &mut self,
        element: &MockElement,
        _timeout: Duration,
    ) -> SessionResult<NavigationSignal> {
        self.click_origins
            .push(self.location().unwrap_or("about:blank").to_string());
        match element.behavior {
            Behavior::NavigatesTo(ref url) => {
                let url = url.clone();
                self.push(&url);
                Ok(NavigationSignal::Completed)
            }
            Behavior::Fails => Err(SessionError::Failed("element is detached".to_string())),
            Behavior::Inert | Behavior::Hidden => Ok(NavigationSignal::Quiet),
        }
    }

    async fn hover(&mut self, _element: &MockElement) -> SessionResult<()> {
        self.hovers += 1;
        Ok(())
    }

    async fn scroll_by(&mut self, _dx: f64, _dy: f64) -> SessionResult<()> {
        self.scrolls += 1;
        Ok(())
    }

    async fn go_back(&mut self, _timeout: Duration) -> SessionResult<()> {
        if self.failing_back || self.position == 0 {
            return Err(SessionError::Failed("no earlier history entry".to_string()));
        }
        self.position -= 1;
        Ok(())
    }

    async fn current_url(&mut self) -> SessionResult<String> {
        Ok(self.location().unwrap_or("about:blank").to_string())
    }

    async fn content(&mut self) -> SessionResult<String> {
        self.page()
            .map(|p| p.markup.clone())
            .ok_or_else(|| SessionError::Failed("no document".to_string()))
    }

    async fn close(self) -> SessionResult<()> {
        Ok(())
    }
}

/// Fetcher answering from a fixed table; unknown URLs are not-200.
#[derive(Debug, Default)]
pub struct MockFetcher {
    bodies: HashMap<String, String>,
    offline: bool,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(key(url), body.to_string());
        self
    }

    /// Every fetch fails with an I/O error.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<String>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }
        if self.offline {
            return Err(CrawlError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "network is unreachable",
            )));
        }
        Ok(self.bodies.get(&key(url)).cloned())
    }
}
