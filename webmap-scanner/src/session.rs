//! Rendering-session and plain-fetch abstractions.
//!
//! The crawl drives exactly one [`RenderSession`] for its whole run. Every
//! operation takes `&mut self`: navigation state is owned by the crawl loop
//! and nothing else may move the session while a click is being observed.

use crate::error::SessionResult;
use async_trait::async_trait;
use std::time::Duration;

/// Layout box of an element in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// What the session observed while a click was in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationSignal {
    /// A navigation was committed within the observation window.
    Completed,
    /// Nothing was committed before the window closed.
    Quiet,
}

/// A script-capable browsing surface.
#[async_trait]
pub trait RenderSession: Send {
    /// Handle to an element of the current document.
    type Element: Send + Sync;

    async fn navigate(&mut self, url: &str, timeout: Duration) -> SessionResult<()>;

    async fn evaluate(&mut self, script: &str) -> SessionResult<serde_json::Value>;

    /// Elements matching `selector`, in document order.
    async fn query(&mut self, selector: &str) -> SessionResult<Vec<Self::Element>>;

    /// `None` when the element has no layout box.
    async fn bounding_box(&mut self, element: &Self::Element)
    -> SessionResult<Option<BoundingBox>>;

    /// Click `element` and watch for a navigation for at most `timeout`.
    async fn click(
        &mut self,
        element: &Self::Element,
        timeout: Duration,
    ) -> SessionResult<NavigationSignal>;

    async fn hover(&mut self, element: &Self::Element) -> SessionResult<()>;

    async fn scroll_by(&mut self, dx: f64, dy: f64) -> SessionResult<()>;

    async fn go_back(&mut self, timeout: Duration) -> SessionResult<()>;

    async fn current_url(&mut self) -> SessionResult<String>;

    /// Markup of the rendered document.
    async fn content(&mut self) -> SessionResult<String>;

    /// Release the session and its browser.
    async fn close(self) -> SessionResult<()>
    where
        Self: Sized;
}

/// Plain, non-scripted page fetch used when rendering fails outright.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Body of `url` when it answers 200, `None` otherwise.
    async fn fetch(&self, url: &str) -> crate::error::Result<Option<String>>;
}
