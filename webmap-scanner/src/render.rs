//! Per-page pipeline: navigate, scroll, expand menus, extract, click, and
//! fall back to a plain fetch when rendering produced nothing at all.

use crate::config::CrawlConfig;
use crate::error::{CrawlError, Recovery, Result};
use crate::extract::{Channel, Document, RENDERED_CHANNELS, collect, extract_static_links};
use crate::interact::ClickDiscovery;
use crate::normalize::{SiteScope, normalize};
use crate::result::{ChannelCounts, PageRecord, PageSource};
use crate::session::{PageFetcher, RenderSession};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

const SCROLL_HEIGHT: &str = "document.body ? document.body.scrollHeight : 0";

pub struct PageRenderer<'a> {
    config: &'a CrawlConfig,
    scope: &'a SiteScope,
}

impl<'a> PageRenderer<'a> {
    pub fn new(config: &'a CrawlConfig, scope: &'a SiteScope) -> Self {
        Self { config, scope }
    }

    /// Produce the record for `url`. Stage failures degrade the record;
    /// only errors that abort the run escape.
    pub async fn render<S, F>(&self, session: &mut S, fetcher: &F, url: &str) -> Result<PageRecord>
    where
        S: RenderSession,
        F: PageFetcher + ?Sized,
    {
        let mut counts = ChannelCounts::default();
        let mut links = BTreeSet::new();

        let navigated = match session.navigate(url, self.config.navigation_timeout()).await {
            Ok(()) => true,
            Err(e) => !recover(CrawlError::navigation(url, e)).skips_rendering(),
        };

        if navigated {
            self.scroll(session).await;
            if self.expand_menus(session, url).await {
                links.extend(self.extract_rendered(session, url, &mut counts).await);

                let discovery = ClickDiscovery::new(
                    &self.config.clicks,
                    self.scope,
                    self.config.navigation_timeout(),
                );
                let report = discovery.run(session).await;
                debug!(
                    "{}: {} clicks, {} new via navigation{}",
                    url,
                    report.attempts,
                    report.discovered.len(),
                    if report.halted { " (halted)" } else { "" }
                );
                counts.clicks = report.discovered.len();
                links.extend(report.discovered);
            }
        }

        if !navigated && links.is_empty() {
            return self.fallback(fetcher, url, counts).await;
        }

        info!(
            "{} -> {} links (anchors {}, onclick {}, data-url {}, clicks {})",
            url,
            links.len(),
            counts.anchors,
            counts.handlers,
            counts.routing,
            counts.clicks
        );
        Ok(PageRecord::new(url.to_string(), links, PageSource::Rendered).with_counts(counts))
    }

    /// Scroll until the document stops growing or the iteration cap is hit.
    async fn scroll<S: RenderSession>(&self, session: &mut S) {
        let scroll = &self.config.scroll;
        let pause = Duration::from_millis(scroll.pause_ms);
        let mut height = measure(session).await;

        for _ in 0..scroll.max_iterations {
            if let Err(e) = session.scroll_by(0.0, scroll.step_px).await {
                recover(CrawlError::interaction("scroll", e));
                break;
            }
            sleep(pause).await;
            let next = measure(session).await;
            if next.is_none() || next == height {
                break;
            }
            height = next;
        }

        sleep(self.config.settle()).await;
    }

    /// Open toggles and hover dropdowns. Returns false if a toggle navigated
    /// away and the page could not be reloaded.
    async fn expand_menus<S: RenderSession>(&self, session: &mut S, url: &str) -> bool {
        let menus = &self.config.menus;
        let landing = match session.current_url().await {
            Ok(current) => normalize(&current),
            Err(_) => normalize(url),
        };
        let click_timeout = Duration::from_millis(menus.click_timeout_ms);
        let pause = Duration::from_millis(menus.pause_ms);

        'toggles: for selector in &menus.click_selectors {
            let Ok(toggles) = session.query(selector).await else {
                continue;
            };
            for toggle in &toggles {
                if !matches!(session.bounding_box(toggle).await, Ok(Some(b)) if b.is_visible()) {
                    continue;
                }
                if let Err(e) = session.click(toggle, click_timeout).await {
                    recover(CrawlError::interaction("menu toggle", e));
                }
                sleep(pause).await;

                let stranded = session
                    .current_url()
                    .await
                    .is_ok_and(|current| normalize(&current) != landing);
                if stranded {
                    debug!("Menu toggle on {} navigated away; reloading", url);
                    if let Err(e) = session.navigate(url, self.config.navigation_timeout()).await
                        && recover(CrawlError::navigation(url, e)).skips_rendering()
                    {
                        return false;
                    }
                    break 'toggles;
                }
            }
        }

        for selector in &menus.hover_selectors {
            let Ok(targets) = session.query(selector).await else {
                continue;
            };
            for target in &targets {
                if let Err(e) = session.hover(target).await {
                    recover(CrawlError::interaction("menu hover", e));
                }
            }
        }

        sleep(self.config.settle()).await;
        true
    }

    async fn extract_rendered<S: RenderSession>(
        &self,
        session: &mut S,
        url: &str,
        counts: &mut ChannelCounts,
    ) -> BTreeSet<String> {
        let markup = match session.content().await {
            Ok(markup) => markup,
            Err(e) => {
                recover(CrawlError::extraction("content", e));
                return BTreeSet::new();
            }
        };
        let base = match session.current_url().await {
            Ok(current) => Url::parse(&current).or_else(|_| Url::parse(url)),
            Err(_) => Url::parse(url),
        };
        let base = match base {
            Ok(base) => base,
            Err(e) => {
                recover(CrawlError::ExtractionError {
                    stage: "base url",
                    reason: e.to_string(),
                });
                return BTreeSet::new();
            }
        };

        rendered_links(base, &markup, self.scope, counts)
    }

    async fn fallback<F: PageFetcher + ?Sized>(
        &self,
        fetcher: &F,
        url: &str,
        mut counts: ChannelCounts,
    ) -> Result<PageRecord> {
        match fetcher.fetch(url).await {
            Ok(Some(body)) => {
                let links = extract_static_links(url, &body, self.scope);
                counts.fallback = links.len();
                info!("{} -> {} links (static fallback)", url, links.len());
                Ok(PageRecord::new(url.to_string(), links, PageSource::Fallback).with_counts(counts))
            }
            Ok(None) => {
                warn!("{} unreachable: render and plain fetch both failed", url);
                Ok(PageRecord::unreachable(url.to_string()))
            }
            Err(e) if e.recovery() == Recovery::AbortRun => Err(e),
            Err(e) => {
                recover(e);
                warn!("{} unreachable", url);
                Ok(PageRecord::unreachable(url.to_string()))
            }
        }
    }
}

/// Log a stage failure at the level its recovery calls for.
fn recover(err: CrawlError) -> Recovery {
    let recovery = err.recovery();
    match recovery {
        Recovery::SkipStage => debug!("{}", err),
        _ => warn!("{}", err),
    }
    recovery
}

async fn measure<S: RenderSession>(session: &mut S) -> Option<f64> {
    match session.evaluate(SCROLL_HEIGHT).await {
        Ok(value) => value.as_f64(),
        Err(e) => {
            recover(CrawlError::extraction("scroll height", e));
            None
        }
    }
}

/// Run every rendered channel over one parse of `markup`.
fn rendered_links(
    base: Url,
    markup: &str,
    scope: &SiteScope,
    counts: &mut ChannelCounts,
) -> BTreeSet<String> {
    let document = Document::parse(base, markup);
    let mut links = BTreeSet::new();

    for (channel, extract) in RENDERED_CHANNELS {
        let found = collect(*extract, &document, scope);
        debug!("  [{}] {} links", channel.as_str(), found.len());
        match channel {
            Channel::Anchors => counts.anchors = found.len(),
            Channel::Handlers => counts.handlers = found.len(),
            Channel::Routing => counts.routing = found.len(),
        }
        links.extend(found);
    }

    links
}
