use crate::llm_adapter::Classifier;
use crate::traits::ArticleSource;
use crate::types::{ClassificationVerdict, FeedEntry, NewsRecord, RunPolicy};
use crate::utils::text::char_len;
use std::sync::Arc;
use tracing::{info, warn};

/// What happened to one feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Too little text was extracted; the classifier was not called.
    Skipped { chars: usize },
    Rejected,
    Accepted(NewsRecord),
    /// The classifier failed or answered with something undecodable.
    Failed(String),
}

impl ItemOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ItemOutcome::Skipped { .. } => "skipped",
            ItemOutcome::Rejected => "rejected",
            ItemOutcome::Accepted(_) => "accepted",
            ItemOutcome::Failed(_) => "failed",
        }
    }

    /// Whether the classifier was called for this entry.
    pub fn was_classified(&self) -> bool {
        !matches!(self, ItemOutcome::Skipped { .. })
    }
}

/// Runs one entry through fetch, the length gate and classification.
///
/// Never fails: every per-item problem is folded into an [`ItemOutcome`].
/// Pacing between classifications is left to the caller.
pub struct ItemProcessor {
    articles: Arc<dyn ArticleSource>,
    classifier: Arc<dyn Classifier>,
    policy: RunPolicy,
}

impl ItemProcessor {
    pub fn new(articles: Arc<dyn ArticleSource>, classifier: Arc<dyn Classifier>, policy: RunPolicy) -> Self {
        Self {
            articles,
            classifier,
            policy,
        }
    }

    pub async fn process(&self, category: &str, entry: &FeedEntry) -> ItemOutcome {
        info!("Reading: {}", entry.title);

        let text = self.articles.article_text(entry.link.as_str()).await;
        let chars = char_len(&text);
        if chars < self.policy.min_article_chars {
            info!("Skipped '{}': only {} chars of text", entry.title, chars);
            return ItemOutcome::Skipped { chars };
        }

        match self.classifier.classify(&text).await {
            Ok(ClassificationVerdict::Rejected) => {
                info!("Rejected '{}'", entry.title);
                ItemOutcome::Rejected
            }
            Ok(ClassificationVerdict::Accepted(facts)) => {
                info!("Accepted '{}' as '{}'", entry.title, facts.topic);
                ItemOutcome::Accepted(NewsRecord::new(facts, category, entry.link.clone()))
            }
            Err(e) => {
                warn!("Classification of '{}' failed: {}", entry.title, e);
                ItemOutcome::Failed(e.to_string())
            }
        }
    }
}
