use crate::error::Result;
use crate::session::PageFetcher;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; WebMapBot/1.0)";

/// Plain HTTP fetch, no scripting.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Option<String>> {
        debug!("Fallback fetch {}", url);
        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            debug!("Fallback fetch {} answered {}", url, response.status());
            return Ok(None);
        }
        Ok(Some(response.text().await?))
    }
}
