use std::time::Duration;

// Use the interfaces crate for boundary types
pub use interfaces::defs::{ClassificationVerdict, EncryptedArtifact, ExamFacts, FeedEntry, NewsRecord};

/// Algorithm identifier written into every artifact.
pub const ARTIFACT_ENCRYPTION: &str = "AES-256-CBC";

/// Sent with every outbound request; some publishers refuse non-browser clients.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_redirects: usize,
    pub max_article_chars: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout_seconds: 10,
            max_redirects: 5,
            max_article_chars: 3000,
        }
    }
}

/// Knobs that shape one run of the pipeline.
#[derive(Debug, Clone)]
pub struct RunPolicy {
    pub max_entries_per_feed: usize,
    pub min_article_chars: usize,
    pub pacing: Duration,
    pub run_timeout: Option<Duration>,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            max_entries_per_feed: 3,
            min_article_chars: 200,
            pacing: Duration::from_secs(2),
            run_timeout: None,
        }
    }
}

/// One (category, feed) pair of the flattened work list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedJob {
    pub category: String,
    pub feed_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Classification failed: {0}")]
    Classification(String),

    #[error("Encryption error: {0}")]
    Crypto(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Pipeline is missing a {0}")]
    Incomplete(&'static str),
}

pub type Result<T> = std::result::Result<T, EngineError>;
