use crate::artifact::ArtifactKey;
use crate::types::{FeedJob, FetchConfig, RunPolicy};
use crate::utils::url::is_valid_feed_url;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OUTPUT_PATH: &str = "encrypted_news.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// A category and the feeds harvested for it, in the order they are read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFeeds {
    pub category: String,
    pub feeds: Vec<String>,
}

impl CategoryFeeds {
    pub fn new(category: &str, feeds: &[&str]) -> Self {
        Self {
            category: category.to_string(),
            feeds: feeds.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Built-in feed table used when no table file is configured.
pub fn default_feed_table() -> Vec<CategoryFeeds> {
    vec![
        CategoryFeeds::new(
            "Economics",
            &[
                "https://search.cnbc.com/rs/search/combinedcms/view.xml?profile=120000000&id=10000664",
                "https://www.thehindubusinessline.com/economy/feeder/default.rss",
            ],
        ),
        CategoryFeeds::new(
            "International_Affairs",
            &[
                "https://feeds.bbci.co.uk/news/world/rss.xml",
                "https://techcrunch.com/category/space/feed/",
            ],
        ),
        CategoryFeeds::new("Sports", &["https://www.espn.com/espn/rss/news"]),
    ]
}

/// Everything a run needs, captured once at startup.
#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub artifact_key: ArtifactKey,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub classifier_timeout: Duration,
    pub feeds: Vec<CategoryFeeds>,
    pub output_path: PathBuf,
    pub fetch: FetchConfig,
    pub policy: RunPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &"<redacted>")
            .field("artifact_key", &self.artifact_key)
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("classifier_timeout", &self.classifier_timeout)
            .field("feeds", &self.feeds)
            .field("output_path", &self.output_path)
            .field("fetch", &self.fetch)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when `GEMINI_API_KEY` or `AES_SECRET_KEY` is
    /// missing, the key is not 256 bits, or any optional setting fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] but reads settings through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini_api_key = required(&lookup, "GEMINI_API_KEY")?;
        let artifact_key = parse_artifact_key(&required(&lookup, "AES_SECRET_KEY")?)?;

        let gemini_model = lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
        let gemini_base_url =
            lookup("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
        let classifier_timeout = Duration::from_secs(parse_u64(&lookup, "CLASSIFIER_TIMEOUT_SECS", 30)?);

        let feeds = match lookup("EXAM_DIGEST_FEEDS") {
            Some(path) => load_feed_table(Path::new(&path))?,
            None => default_feed_table(),
        };
        let output_path = lookup("EXAM_DIGEST_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH));

        let fetch = FetchConfig {
            timeout_seconds: parse_u64(&lookup, "FETCH_TIMEOUT_SECS", 10)?,
            max_article_chars: parse_usize(&lookup, "MAX_ARTICLE_CHARS", 3000)?,
            ..FetchConfig::default()
        };

        let run_timeout = match lookup("RUN_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(parse_number("RUN_TIMEOUT_SECS", &raw)?)),
            None => None,
        };
        let policy = RunPolicy {
            max_entries_per_feed: parse_usize(&lookup, "MAX_ENTRIES_PER_FEED", 3)?,
            min_article_chars: parse_usize(&lookup, "MIN_ARTICLE_CHARS", 200)?,
            pacing: Duration::from_millis(parse_u64(&lookup, "PACING_MS", 2000)?),
            run_timeout,
        };

        Ok(Self {
            gemini_api_key,
            artifact_key,
            gemini_model,
            gemini_base_url,
            classifier_timeout,
            feeds,
            output_path,
            fetch,
            policy,
        })
    }

    /// Flattens the feed table into the ordered work list.
    pub fn jobs(&self) -> Vec<FeedJob> {
        flatten_jobs(&self.feeds)
    }
}

pub fn flatten_jobs(feeds: &[CategoryFeeds]) -> Vec<FeedJob> {
    feeds
        .iter()
        .flat_map(|group| {
            group.feeds.iter().map(move |feed_url| FeedJob {
                category: group.category.clone(),
                feed_url: feed_url.clone(),
            })
        })
        .collect()
}

/// Reads only the artifact key; used by the decrypt command.
pub fn artifact_key_from_env() -> Result<ArtifactKey, ConfigError> {
    let raw = std::env::var("AES_SECRET_KEY").map_err(|_| ConfigError::Missing("AES_SECRET_KEY"))?;
    parse_artifact_key(&raw)
}

/// Accepts either a raw 32-byte string or `base64:` followed by 32 encoded bytes.
pub fn parse_artifact_key(raw: &str) -> Result<ArtifactKey, ConfigError> {
    let bytes = match raw.strip_prefix("base64:") {
        Some(encoded) => base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| ConfigError::Invalid {
                name: "AES_SECRET_KEY",
                reason: e.to_string(),
            })?,
        None => raw.as_bytes().to_vec(),
    };

    let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| ConfigError::Invalid {
        name: "AES_SECRET_KEY",
        reason: format!("expected 32 bytes, got {}", bytes.len()),
    })?;

    Ok(ArtifactKey::new(key))
}

/// Loads a feed table: a JSON array of `{"category": ..., "feeds": [...]}`.
pub fn load_feed_table(path: &Path) -> Result<Vec<CategoryFeeds>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Invalid {
        name: "EXAM_DIGEST_FEEDS",
        reason: format!("{}: {}", path.display(), e),
    })?;
    parse_feed_table(&content)
}

pub fn parse_feed_table(content: &str) -> Result<Vec<CategoryFeeds>, ConfigError> {
    let table: Vec<CategoryFeeds> = serde_json::from_str(content).map_err(|e| ConfigError::Invalid {
        name: "EXAM_DIGEST_FEEDS",
        reason: e.to_string(),
    })?;

    for group in &table {
        if group.category.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "EXAM_DIGEST_FEEDS",
                reason: "category name must not be empty".to_string(),
            });
        }
        if let Some(bad) = group.feeds.iter().find(|url| !is_valid_feed_url(url)) {
            return Err(ConfigError::Invalid {
                name: "EXAM_DIGEST_FEEDS",
                reason: format!("not an http(s) feed URL: {}", bad),
            });
        }
    }

    Ok(table)
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_u64<F>(lookup: &F, name: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).map_or(Ok(default), |raw| parse_number(name, &raw))
}

fn parse_usize<F>(lookup: &F, name: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).map_or(Ok(default), |raw| parse_number(name, &raw))
}

fn parse_number<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}
