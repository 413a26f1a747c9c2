//! [`RenderSession`] backed by a single Chromium tab via chromiumoxide.

use crate::error::{CrawlError, Result, SessionError, SessionResult};
use crate::session::{BoundingBox, NavigationSignal, RenderSession};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    GetNavigationHistoryParams, NavigateToHistoryEntryParams,
};
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing::debug;

const HISTORY_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub window_size: (u32, u32),
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            executable: None,
            window_size: (1366, 900),
        }
    }
}

pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch Chromium and open the one tab the crawl will reuse.
    pub async fn launch(options: &BrowserOptions) -> Result<Self> {
        let (width, height) = options.window_size;
        let mut builder = BrowserConfig::builder().window_size(width, height);
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(ref path) = options.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| CrawlError::Browser(format!("invalid browser config: {}", e)))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CrawlError::Browser(format!("failed to launch Chromium: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler: {}", e);
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(CrawlError::Browser(format!("failed to open tab: {}", e)));
            }
        };

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    /// Id of the history entry the tab is currently showing, and its index.
    async fn history_position(&self) -> SessionResult<(i64, usize)> {
        let history = self
            .page
            .execute(GetNavigationHistoryParams::default())
            .await
            .map_err(failed)?;
        let index = history.result.current_index.max(0) as usize;
        let entry = history
            .result
            .entries
            .get(index)
            .ok_or_else(|| SessionError::Failed("empty navigation history".to_string()))?;
        Ok((entry.id, index))
    }
}

fn failed(e: impl std::fmt::Display) -> SessionError {
    SessionError::Failed(e.to_string())
}

#[async_trait]
impl RenderSession for ChromiumSession {
    type Element = Element;

    async fn navigate(&mut self, url: &str, limit: Duration) -> SessionResult<()> {
        match timeout(limit, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(failed(e)),
            Err(_) => Err(SessionError::TimedOut(limit)),
        }
    }

    async fn evaluate(&mut self, script: &str) -> SessionResult<serde_json::Value> {
        let result = self.page.evaluate(script).await.map_err(failed)?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn query(&mut self, selector: &str) -> SessionResult<Vec<Element>> {
        self.page.find_elements(selector).await.map_err(failed)
    }

    async fn bounding_box(&mut self, element: &Element) -> SessionResult<Option<BoundingBox>> {
        // No box model means the element is not rendered.
        Ok(element.bounding_box().await.ok().map(|b| BoundingBox {
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
        }))
    }

    async fn click(&mut self, element: &Element, limit: Duration) -> SessionResult<NavigationSignal> {
        let before = self.history_position().await.ok().map(|(id, _)| id);
        let deadline = Instant::now() + limit;

        match timeout(limit, element.click()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(failed(e)),
            Err(_) => return Err(SessionError::TimedOut(limit)),
        }

        loop {
            if let Ok((id, _)) = self.history_position().await
                && Some(id) != before
            {
                let remaining = deadline.saturating_duration_since(Instant::now());
                let _ = timeout(remaining, self.page.wait_for_navigation()).await;
                return Ok(NavigationSignal::Completed);
            }
            if Instant::now() >= deadline {
                return Ok(NavigationSignal::Quiet);
            }
            sleep(HISTORY_POLL).await;
        }
    }

    async fn hover(&mut self, element: &Element) -> SessionResult<()> {
        element.hover().await.map(|_| ()).map_err(failed)
    }

    async fn scroll_by(&mut self, dx: f64, dy: f64) -> SessionResult<()> {
        self.page
            .evaluate(format!("window.scrollBy({}, {})", dx, dy))
            .await
            .map(|_| ())
            .map_err(failed)
    }

    async fn go_back(&mut self, limit: Duration) -> SessionResult<()> {
        let history = self
            .page
            .execute(GetNavigationHistoryParams::default())
            .await
            .map_err(failed)?;
        let index = history.result.current_index;
        if index <= 0 {
            return Err(SessionError::Failed("no earlier history entry".to_string()));
        }
        let previous = history
            .result
            .entries
            .get((index - 1) as usize)
            .ok_or_else(|| SessionError::Failed("history entry vanished".to_string()))?
            .id;

        let page = &self.page;
        let back = async move {
            page.execute(NavigateToHistoryEntryParams::new(previous))
                .await
                .map_err(failed)?;
            page.wait_for_navigation().await.map_err(failed)?;
            Ok::<(), SessionError>(())
        };
        match timeout(limit, back).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::TimedOut(limit)),
        }
    }

    async fn current_url(&mut self) -> SessionResult<String> {
        self.page
            .url()
            .await
            .map_err(failed)?
            .ok_or_else(|| SessionError::Failed("tab has no URL".to_string()))
    }

    async fn content(&mut self) -> SessionResult<String> {
        self.page.content().await.map_err(failed)
    }

    async fn close(self) -> SessionResult<()> {
        let ChromiumSession {
            mut browser,
            page,
            handler,
        } = self;
        let _ = page.close().await;
        let closed = browser.close().await.map(|_| ()).map_err(failed);
        let _ = browser.wait().await;
        handler.abort();
        closed
    }
}
