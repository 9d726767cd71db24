pub mod artifact;
pub mod config;
pub mod fetcher;
pub mod llm_adapter;
pub mod parser;
pub mod pipeline;
pub mod processing;
pub mod traits;
pub mod types;
pub mod utils;

pub use artifact::{decode_records, decrypt_artifact, encode_report, encrypt_with_iv, ArtifactKey};
pub use config::{CategoryFeeds, Config, ConfigError};
pub use fetcher::Fetcher;
pub use llm_adapter::{parse_verdict, Classifier, GeminiClassifier, MockClassifier};
pub use parser::FeedParser;
pub use pipeline::{Pipeline, PipelineBuilder, RunReport, RunStats};
pub use processing::{ItemOutcome, ItemProcessor};
pub use traits::{ArticleSource, FeedSource};
pub use types::*;
