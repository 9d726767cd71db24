use crate::types::{EngineError, FeedEntry, Result};
use crate::utils::text::{collapse_whitespace, truncate_chars};
use feed_rs::parser;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

pub struct FeedParser {
    max_entries: usize,
}

impl FeedParser {
    pub fn new(max_entries: usize) -> Self {
        Self { max_entries }
    }

    /// Parses RSS/Atom/JSON feed content and keeps the first `max_entries`
    /// entries in feed order. Entries without a usable link still count
    /// toward the cap; they are dropped afterwards.
    pub fn parse_entries(&self, content: &str) -> Result<Vec<FeedEntry>> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| EngineError::Parse(format!("Failed to parse feed: {}", e)))?;

        let total = feed.entries.len();
        let entries: Vec<FeedEntry> = feed
            .entries
            .into_iter()
            .take(self.max_entries)
            .filter_map(Self::parse_entry)
            .collect();

        info!("Parsed feed with {} entries, keeping {}", total, entries.len());
        Ok(entries)
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> Option<FeedEntry> {
        let title = entry
            .title
            .map(|t| collapse_whitespace(&t.content))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());

        let href = entry.links.first()?.href.trim().to_string();
        match Url::parse(&href) {
            Ok(link) => Some(FeedEntry { title, link }),
            Err(e) => {
                debug!("Skipping entry '{}' with unusable link {:?}: {}", title, href, e);
                None
            }
        }
    }
}

/// Concatenates the text of every `<p>` element in document order, separated
/// by single spaces, capped at `max_chars` characters.
pub fn extract_paragraph_text(html: &str, max_chars: usize) -> String {
    let selector = match Selector::parse("p") {
        Ok(selector) => selector,
        Err(_) => return String::new(),
    };

    let document = Html::parse_document(html);
    let text = document
        .select(&selector)
        .map(|p| collapse_whitespace(&p.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    truncate_chars(&text, max_chars)
}
