pub mod chromium;
pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod frontier;
pub mod interact;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod normalize;
pub mod render;
pub mod result;
pub mod session;

pub use chromium::{BrowserOptions, ChromiumSession};
pub use config::CrawlConfig;
pub use crawler::{CrawlSession, Crawler, ProgressCallback};
pub use error::{CrawlError, Recovery, SessionError};
pub use fetch::HttpFetcher;
pub use normalize::{SameSitePolicy, SiteScope, normalize};
pub use result::{PageRecord, PageSource, SiteGraph};
pub use session::{PageFetcher, RenderSession};
