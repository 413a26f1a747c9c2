use chrono::Local;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use url::Url;
use webmap_scanner::error::Result;
use webmap_scanner::{
    BrowserOptions, ChromiumSession, CrawlConfig, Crawler, HttpFetcher, PageFetcher, PageSource,
    RenderSession, SiteGraph,
};

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub url: String,
    pub config: CrawlConfig,
    pub browser: BrowserOptions,
    pub show_progress_bars: bool,
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Launching browser...");
    pb
}

/// Launch Chromium, crawl, and close the browser again on every path.
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<SiteGraph> {
    let CrawlOptions {
        url,
        config,
        browser,
        show_progress_bars,
    } = options;

    let progress_bar = show_progress_bars.then(spinner);
    let fetcher = HttpFetcher::new(config.fetch_timeout())?;

    let mut session = match ChromiumSession::launch(&browser).await {
        Ok(session) => session,
        Err(e) => {
            if let Some(ref pb) = progress_bar {
                pb.abandon_with_message("Browser launch failed");
            }
            return Err(e);
        }
    };

    let pb = progress_bar.clone();
    let user_cb = progress_callback;
    let callback: CrawlProgressCallback = Arc::new(move |message: String| {
        if let Some(ref pb) = pb {
            pb.set_message(message.clone());
        }
        if let Some(ref cb) = user_cb {
            cb(message);
        }
    });

    let result = run_crawl(&mut session, &fetcher, &url, config, Some(callback)).await;

    if let Err(e) = session.close().await {
        warn!("Browser did not shut down cleanly: {}", e);
    }

    if let Some(ref pb) = progress_bar {
        match result {
            Ok(ref graph) => {
                pb.finish_with_message(format!("Crawl complete! {} pages mapped", graph.len()))
            }
            Err(_) => pb.abandon_with_message("Crawl aborted"),
        }
    }

    result
}

/// Crawl through an already-open session. The caller owns its teardown.
pub async fn run_crawl<S, F>(
    session: &mut S,
    fetcher: &F,
    url: &str,
    config: CrawlConfig,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<SiteGraph>
where
    S: RenderSession,
    F: PageFetcher + ?Sized,
{
    let max_pages = config.max_pages;
    let mut crawler = Crawler::with_config(config);
    if let Some(cb) = progress_callback {
        crawler = crawler.with_progress_callback(Arc::new(move |count: usize, page: String| {
            cb(format!("[{}/{}] {}", count, max_pages, page));
        }));
    }
    crawler.crawl(session, fetcher, url).await
}

/// Generate a crawl report from the site graph
pub fn generate_crawl_report(graph: &SiteGraph, tree_text: Option<&str>) -> String {
    let mut rendered = 0;
    let mut fallback = 0;
    let mut unreachable = 0;
    let (mut anchors, mut handlers, mut routing, mut clicks) = (0, 0, 0, 0);
    for page in graph.pages() {
        match page.source {
            PageSource::Rendered => rendered += 1,
            PageSource::Fallback => fallback += 1,
            PageSource::Unreachable => unreachable += 1,
        }
        anchors += page.counts.anchors;
        handlers += page.counts.handlers;
        routing += page.counts.routing;
        clicks += page.counts.clicks;
    }

    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!(
        "  Completed: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    report.push_str(&format!("  Pages crawled: {}\n", graph.len()));
    report.push_str(&format!(
        "    rendered {}, static fallback {}, unreachable {}\n",
        rendered, fallback, unreachable
    ));
    report.push_str(&format!("  Total links found: {}\n", graph.total_links()));
    report.push_str(&format!("  Distinct URLs seen: {}\n", graph.all_urls().len()));
    report.push_str(&format!(
        "    anchors {}, onclick {}, data-url {}, clicks {}\n",
        anchors, handlers, routing, clicks
    ));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    for page in graph.pages() {
        let path = extract_url_path(&page.url);
        let marker = match page.source {
            PageSource::Rendered => "R".green(),
            PageSource::Fallback => "F".yellow(),
            PageSource::Unreachable => "X".red(),
        };
        report.push_str(&format!(
            "  {} {} {}\n",
            marker,
            path,
            format!("({} links)", page.links.len()).dimmed()
        ));
    }

    if let Some(tree) = tree_text {
        report.push_str("\n## Tree\n");
        report.push_str(tree);
    }

    report
}
