use crate::parser::{extract_paragraph_text, FeedParser};
use crate::traits::{ArticleSource, FeedSource};
use crate::types::{EngineError, FeedEntry, FetchConfig, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// GET `url` and return the body, failing on transport errors and non-success statuses.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let start_time = Instant::now();
        debug!("Fetching: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content = response.text().await?;
        debug!(
            "Fetched {} ({} bytes in {} ms)",
            url,
            content.len(),
            start_time.elapsed().as_millis()
        );
        Ok(content)
    }

    pub async fn fetch_feed(&self, feed_url: &str, limit: usize) -> Result<Vec<FeedEntry>> {
        let content = self.fetch_text(feed_url).await?;
        FeedParser::new(limit).parse_entries(&content)
    }

    pub async fn fetch_article(&self, link: &str) -> Result<String> {
        let html = self.fetch_text(link).await?;
        Ok(extract_paragraph_text(&html, self.config.max_article_chars))
    }
}

#[async_trait]
impl FeedSource for Fetcher {
    async fn read_entries(&self, feed_url: &str, limit: usize) -> Vec<FeedEntry> {
        match self.fetch_feed(feed_url, limit).await {
            Ok(entries) => {
                info!("Read {} entries from {}", entries.len(), feed_url);
                entries
            }
            Err(e) => {
                warn!("Feed {} unavailable, continuing: {}", feed_url, e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ArticleSource for Fetcher {
    async fn article_text(&self, link: &str) -> String {
        match self.fetch_article(link).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Could not extract article text from {}: {}", link, e);
                String::new()
            }
        }
    }
}
