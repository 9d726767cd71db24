use crate::types::FeedEntry;
use async_trait::async_trait;

/// Produces the entries listed by a feed.
///
/// Implementations absorb their own failures: an unreachable or malformed
/// feed yields an empty list, never an error.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse `feed_url`, returning at most `limit` entries in feed order.
    async fn read_entries(&self, feed_url: &str, limit: usize) -> Vec<FeedEntry>;
}

/// Produces the plain body text of an article.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Best effort: an empty string means nothing could be extracted.
    async fn article_text(&self, link: &str) -> String;
}
