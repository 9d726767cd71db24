// Shared fixtures for the exam-digest integration tests.
#![allow(dead_code)]

use exam_digest::types::{ExamFacts, FeedEntry, FetchConfig, NewsRecord, RunPolicy};
use exam_digest::{ArticleSource, FeedSource};
use std::sync::Once;
use std::time::Duration;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// An RSS 2.0 document listing `items` as (title, link) pairs.
pub fn rss_feed(items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, link)| {
            format!(
                "<item><title>{}</title><link>{}</link><guid>{}</guid></item>",
                title, link, link
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <link>https://example.com/</link>
    <description>Fixture feed</description>
    {}
  </channel>
</rss>"#,
        items
    )
}

/// An HTML page whose paragraphs are `paragraphs`, surrounded by non-paragraph noise.
pub fn article_html(paragraphs: &[&str]) -> String {
    let body: String = paragraphs.iter().map(|p| format!("<p>{}</p>", p)).collect();
    format!(
        "<html><head><title>Fixture</title><script>var ignored = 1;</script></head>\
         <body><nav>Menu</nav><article>{}</article><footer>Footer</footer></body></html>",
        body
    )
}

pub fn accepted_json(topic: &str) -> String {
    serde_json::json!({
        "status": "ACCEPTED",
        "topic": topic,
        "what": "Central bank cut rates",
        "who": "Reserve Bank",
        "where": "Mumbai",
        "when": "October 2026",
        "why_how": "Inflation eased below target",
        "takeaway": "Repo rate now 5.5%"
    })
    .to_string()
}

pub const REJECTED_JSON: &str = r#"{"status": "REJECTED"}"#;

pub fn sample_facts(topic: &str) -> ExamFacts {
    ExamFacts {
        topic: topic.to_string(),
        what: "Launch of a lunar lander".to_string(),
        who: "ISRO".to_string(),
        where_: "Sriharikota".to_string(),
        when: "2026-10-01".to_string(),
        why_how: "Heavy-lift rocket".to_string(),
        takeaway: "Fourth soft landing attempt".to_string(),
    }
}

pub fn sample_record(topic: &str, category: &str) -> NewsRecord {
    NewsRecord::new(
        sample_facts(topic),
        category,
        url::Url::parse("https://news.example.com/story").expect("valid url"),
    )
}

pub fn test_fetch_config() -> FetchConfig {
    FetchConfig {
        timeout_seconds: 5,
        ..FetchConfig::default()
    }
}

/// Default policy with pacing disabled so tests run fast.
pub fn fast_policy() -> RunPolicy {
    RunPolicy {
        pacing: Duration::ZERO,
        ..RunPolicy::default()
    }
}

/// Serves the same entries for every feed URL, without any network.
pub struct StaticFeeds(pub Vec<FeedEntry>);

impl StaticFeeds {
    pub fn new(links: &[&str]) -> Self {
        Self(
            links
                .iter()
                .enumerate()
                .map(|(i, link)| FeedEntry {
                    title: format!("Entry {}", i + 1),
                    link: url::Url::parse(link).expect("valid url"),
                })
                .collect(),
        )
    }
}

#[async_trait::async_trait]
impl FeedSource for StaticFeeds {
    async fn read_entries(&self, _feed_url: &str, limit: usize) -> Vec<FeedEntry> {
        self.0.iter().take(limit).cloned().collect()
    }
}

/// Returns the same article text for every link.
pub struct StaticArticles(pub String);

#[async_trait::async_trait]
impl ArticleSource for StaticArticles {
    async fn article_text(&self, _link: &str) -> String {
        self.0.clone()
    }
}
