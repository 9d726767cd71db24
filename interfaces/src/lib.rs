pub mod defs;

pub use defs::{ClassificationVerdict, EncryptedArtifact, ExamFacts, FeedEntry, NewsRecord};
