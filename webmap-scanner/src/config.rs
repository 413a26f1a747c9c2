use crate::normalize::SameSitePolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const CLICK_CANDIDATES: &str =
    "a, button, [role='button'], [onclick], [role='link'], [role='menuitem']";

/// Knobs for one crawl. Durations are in milliseconds when (de)serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub max_pages: usize,
    pub same_site: SameSitePolicy,
    /// Pause between pages, toward the target server.
    pub delay_ms: u64,
    pub navigation_timeout_ms: u64,
    pub scroll: ScrollConfig,
    pub menus: MenuConfig,
    pub clicks: ClickConfig,
    /// Pause after the scroll loop and after menu expansion.
    pub settle_ms: u64,
    pub fetch_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub max_iterations: usize,
    pub step_px: f64,
    pub pause_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    pub click_selectors: Vec<String>,
    pub hover_selectors: Vec<String>,
    pub click_timeout_ms: u64,
    pub pause_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickConfig {
    /// Click attempts allowed per page.
    pub budget: usize,
    pub candidates: String,
    /// How long a click is watched for a navigation.
    pub observe_timeout_ms: u64,
    pub back_timeout_ms: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 150,
            same_site: SameSitePolicy::Exact,
            delay_ms: 300,
            navigation_timeout_ms: 60_000,
            scroll: ScrollConfig::default(),
            menus: MenuConfig::default(),
            clicks: ClickConfig::default(),
            settle_ms: 500,
            fetch_timeout_ms: 15_000,
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            step_px: 2500.0,
            pause_ms: 400,
        }
    }
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            click_selectors: vec![
                ".w-dropdown-toggle".to_string(),
                ".nav_humburg".to_string(),
                "button[aria-expanded='false']".to_string(),
            ],
            hover_selectors: vec![".w-dropdown".to_string(), ".w-dropdown-toggle".to_string()],
            click_timeout_ms: 2_000,
            pause_ms: 200,
        }
    }
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            budget: 50,
            candidates: CLICK_CANDIDATES.to_string(),
            observe_timeout_ms: 8_000,
            back_timeout_ms: 8_000,
        }
    }
}

impl CrawlConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_same_site(mut self, policy: SameSitePolicy) -> Self {
        self.same_site = policy;
        self
    }

    pub fn with_click_budget(mut self, budget: usize) -> Self {
        self.clicks.budget = budget;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
