use std::time::Duration;
use thiserror::Error;

/// Outcome of a single rendering-session operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("{0}")]
    Failed(String),
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("Navigation to {url} failed: {reason}")]
    NavigationError { url: String, reason: String },

    #[error("Extraction failed ({stage}): {reason}")]
    ExtractionError { stage: &'static str, reason: String },

    #[error("Interaction failed ({action}): {reason}")]
    InteractionError { action: &'static str, reason: String },

    #[error("Could not restore session to {origin}: {reason}")]
    RestorationFailure { origin: String, reason: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What the crawl does next after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Skip the rendered stages of this page; the static fallback may run.
    RenderFallback,
    /// The failing stage contributes nothing; the page carries on.
    SkipStage,
    /// Stop interactive discovery for the current page only.
    AbortDiscovery,
    /// Nothing sensible can continue.
    AbortRun,
}

impl Recovery {
    /// Whether the rendered stages of the current page are skipped.
    pub fn skips_rendering(self) -> bool {
        matches!(self, Recovery::RenderFallback | Recovery::AbortRun)
    }
}

impl CrawlError {
    pub fn recovery(&self) -> Recovery {
        match self {
            CrawlError::NavigationTimeout { .. } | CrawlError::NavigationError { .. } => {
                Recovery::RenderFallback
            }
            CrawlError::ExtractionError { .. }
            | CrawlError::InteractionError { .. }
            | CrawlError::HttpError(_) => Recovery::SkipStage,
            CrawlError::RestorationFailure { .. } => Recovery::AbortDiscovery,
            CrawlError::InvalidUrl(_)
            | CrawlError::Browser(_)
            | CrawlError::IoError(_)
            | CrawlError::Serialization(_) => Recovery::AbortRun,
        }
    }

    pub fn navigation(url: &str, err: SessionError) -> Self {
        match err {
            SessionError::TimedOut(timeout) => CrawlError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            },
            SessionError::Failed(reason) => CrawlError::NavigationError {
                url: url.to_string(),
                reason,
            },
        }
    }

    pub fn extraction(stage: &'static str, err: SessionError) -> Self {
        CrawlError::ExtractionError {
            stage,
            reason: err.to_string(),
        }
    }

    pub fn interaction(action: &'static str, err: SessionError) -> Self {
        CrawlError::InteractionError {
            action,
            reason: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CrawlError>;
