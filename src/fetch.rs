use std::time::{Duration, Instant};

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::settings::FetchSettings;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("not html: {0}")]
    NotHtml(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    /// Short tag recorded in a company's error list.
    pub fn tag(&self) -> String {
        match self {
            FetchError::Status(code) => format!("http_{}", code),
            FetchError::NotHtml(_) => "not_html".to_string(),
            FetchError::Transport(_) => "transport".to_string(),
        }
    }
}

/// Rate-limited HTML fetcher. One network call per attempt, no caching.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    attempts: u32,
    delay: Duration,
    backoff: Duration,
}

impl Fetcher {
    pub fn new(settings: &FetchSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(settings.timeout())
            .build()?;
        Ok(Self {
            client,
            attempts: settings.attempts.max(1),
            delay: settings.delay(),
            backoff: settings.backoff(),
        })
    }

    /// Fetch `url` as HTML. Sleeps the politeness delay first, then retries
    /// with linear backoff. The last attempt's failure is returned.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        tokio::time::sleep(self.delay).await;

        let mut last_err = FetchError::Transport("no attempt made".into());
        for attempt in 1..=self.attempts {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    debug!("Fetch {} failed (attempt {}/{}): {}", url, attempt, self.attempts, e);
                    last_err = e;
                }
            }
            if attempt < self.attempts {
                tokio::time::sleep(self.backoff * attempt).await;
            }
        }

        warn!("Giving up on {} after {} attempts: {}", url, self.attempts, last_err);
        Err(last_err)
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let start = Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.contains("text/html") {
            return Err(FetchError::NotHtml(content_type));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        debug!("Fetched {} ({} bytes) in {}ms", url, body.len(), start.elapsed().as_millis());
        Ok(body)
    }
}
