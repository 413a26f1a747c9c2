use crate::config::CrawlConfig;
use crate::error::{CrawlError, Result};
use crate::frontier::Frontier;
use crate::normalize::{SiteScope, normalize};
use crate::render::PageRenderer;
use crate::result::SiteGraph;
use crate::session::{PageFetcher, RenderSession};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, info};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// State owned by one crawl run.
pub struct CrawlSession {
    pub frontier: Frontier,
    pub graph: SiteGraph,
}

impl CrawlSession {
    pub fn new(scope: SiteScope, max_pages: usize) -> Self {
        Self {
            frontier: Frontier::new(scope, max_pages),
            graph: SiteGraph::new(),
        }
    }

    pub fn into_graph(self) -> SiteGraph {
        self.graph
    }
}

pub struct Crawler {
    config: CrawlConfig,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new() -> Self {
        Self::with_config(CrawlConfig::default())
    }

    pub fn with_config(config: CrawlConfig) -> Self {
        Self {
            config,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawl from `start_url` until the frontier empties or the page budget
    /// is spent. Pages are visited one at a time through `session`.
    pub async fn crawl<S, F>(&self, session: &mut S, fetcher: &F, start_url: &str) -> Result<SiteGraph>
    where
        S: RenderSession,
        F: PageFetcher + ?Sized,
    {
        let parsed = Url::parse(start_url)
            .map_err(|e| CrawlError::InvalidUrl(format!("{}: {}", start_url, e)))?;
        let start = normalize(parsed.as_str());
        let scope = SiteScope::new(&start, self.config.same_site)
            .ok_or_else(|| CrawlError::InvalidUrl(format!("{} has no host", start_url)))?;

        info!(
            "Starting crawl of {} (max {} pages, same-site {})",
            start,
            self.config.max_pages,
            scope.policy().as_str()
        );
        let started = Instant::now();

        let mut crawl = CrawlSession::new(scope.clone(), self.config.max_pages);
        crawl.frontier.enqueue(&start);
        let renderer = PageRenderer::new(&self.config, &scope);

        while let Some(url) = crawl.frontier.dequeue() {
            if let Some(ref cb) = self.progress_callback {
                cb(crawl.frontier.visited_count(), url.clone());
            }
            info!(
                "[{}/{}] {}",
                crawl.frontier.visited_count(),
                self.config.max_pages,
                url
            );

            let record = renderer.render(session, fetcher, &url).await?;

            let admitted = record
                .links
                .iter()
                .filter(|link| crawl.frontier.enqueue(link))
                .count();
            debug!(
                "{}: {} links, {} queued (frontier {})",
                url,
                record.links.len(),
                admitted,
                crawl.frontier.queued_count()
            );
            crawl.graph.insert(record);

            if crawl.frontier.queued_count() > 0 && !crawl.frontier.budget_spent() {
                sleep(self.config.delay()).await;
            }
        }

        info!(
            "Crawl finished: {} pages, {} links in {:.2?}",
            crawl.graph.len(),
            crawl.graph.total_links(),
            started.elapsed()
        );
        Ok(crawl.into_graph())
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}
