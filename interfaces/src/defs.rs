use serde::{Deserialize, Serialize};
use url::Url;

/// One item listed in a syndication feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub link: Url,
}

/// The fields an accepted article is reduced to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamFacts {
    pub topic: String,
    pub what: String,
    pub who: String,
    #[serde(rename = "where")]
    pub where_: String,
    pub when: String,
    pub why_how: String,
    pub takeaway: String,
}

/// Verdict returned by the classification capability.
///
/// The wire shape is keyed on `status`: `{"status":"REJECTED"}` or
/// `{"status":"ACCEPTED", "topic": ..., ...}` with every fact present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ClassificationVerdict {
    #[serde(rename = "REJECTED")]
    Rejected,
    #[serde(rename = "ACCEPTED")]
    Accepted(ExamFacts),
}

impl ClassificationVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ClassificationVerdict::Accepted(_))
    }
}

/// An accepted verdict enriched with where it came from.
///
/// Serialized field order is declaration order, which is the order
/// consumers of the decrypted payload see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    #[serde(flatten)]
    pub facts: ExamFacts,
    pub category: String,
    pub source_link: Url,
}

impl NewsRecord {
    pub fn new(facts: ExamFacts, category: impl Into<String>, source_link: Url) -> Self {
        Self {
            facts,
            category: category.into(),
            source_link,
        }
    }
}

/// The persisted, self-describing encrypted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedArtifact {
    pub encryption: String,
    pub iv: String,
    pub payload: String,
}

// Object style note:
// These are plain boundary types. Anything that talks to the network or
// holds a key lives in exam-digest; consumers that only need to read a
// decrypted payload can depend on this crate alone.
