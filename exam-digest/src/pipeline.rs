use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::llm_adapter::{Classifier, GeminiClassifier};
use crate::processing::{ItemOutcome, ItemProcessor};
use crate::traits::{ArticleSource, FeedSource};
use crate::types::{EngineError, FeedJob, NewsRecord, Result, RunPolicy};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Tally of what happened during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub feeds_read: usize,
    pub feeds_empty: usize,
    pub entries_seen: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub failed: usize,
    pub accepted: usize,
}

impl RunStats {
    fn record(&mut self, outcome: &ItemOutcome) {
        self.entries_seen += 1;
        match outcome {
            ItemOutcome::Skipped { .. } => self.skipped += 1,
            ItemOutcome::Rejected => self.rejected += 1,
            ItemOutcome::Accepted(_) => self.accepted += 1,
            ItemOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Accepted records of one run, in processing order.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub records: Vec<NewsRecord>,
    pub stats: RunStats,
    /// Set when the run deadline cut iteration short.
    pub interrupted: bool,
}

impl RunReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Walks the flattened (category, feed) work list, one entry at a time.
pub struct Pipeline {
    jobs: Vec<FeedJob>,
    feeds: Arc<dyn FeedSource>,
    processor: ItemProcessor,
    policy: RunPolicy,
}

impl Pipeline {
    /// Wires the HTTP fetcher and the Gemini classifier from `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = Arc::new(Fetcher::new(config.fetch.clone())?);
        let classifier = Arc::new(GeminiClassifier::new(
            &config.gemini_base_url,
            &config.gemini_model,
            config.gemini_api_key.clone(),
            config.classifier_timeout,
        )?);

        Ok(PipelineBuilder::new()
            .jobs(config.jobs())
            .feed_source(fetcher.clone())
            .article_source(fetcher)
            .classifier(classifier)
            .policy(config.policy.clone())
            .build()?)
    }

    pub fn jobs(&self) -> &[FeedJob] {
        &self.jobs
    }

    pub async fn run(&self) -> RunReport {
        let run_id = Uuid::new_v4();
        self.run_jobs(run_id)
            .instrument(info_span!("run", %run_id))
            .await
    }

    async fn run_jobs(&self, run_id: Uuid) -> RunReport {
        let started_at = Utc::now();
        let deadline = self.policy.run_timeout.map(|timeout| Instant::now() + timeout);
        let mut records = Vec::new();
        let mut stats = RunStats::default();
        let mut interrupted = false;

        info!("Starting run over {} feeds", self.jobs.len());

        let mut current_category: Option<&str> = None;
        'jobs: for job in &self.jobs {
            if is_past(deadline) {
                interrupted = true;
                break 'jobs;
            }
            if current_category != Some(job.category.as_str()) {
                info!("Scanning category: {}", job.category);
                current_category = Some(job.category.as_str());
            }
            info!("Fetching feed: {}", job.feed_url);

            let read = self.feeds.read_entries(&job.feed_url, self.policy.max_entries_per_feed);
            let entries = match within_deadline(deadline, read).await {
                Some(entries) => entries,
                None => {
                    interrupted = true;
                    break 'jobs;
                }
            };

            stats.feeds_read += 1;
            if entries.is_empty() {
                stats.feeds_empty += 1;
                continue;
            }

            for entry in &entries {
                if is_past(deadline) {
                    interrupted = true;
                    break 'jobs;
                }
                let outcome = match within_deadline(deadline, self.processor.process(&job.category, entry)).await {
                    Some(outcome) => outcome,
                    None => {
                        interrupted = true;
                        break 'jobs;
                    }
                };

                stats.record(&outcome);
                let classified = outcome.was_classified();
                if let ItemOutcome::Accepted(record) = outcome {
                    records.push(record);
                }

                // Pace every classification attempt, including failed ones.
                if classified {
                    pace(self.policy.pacing, deadline).await;
                }
            }
        }

        if interrupted {
            warn!(
                "Run deadline reached; keeping {} records gathered so far",
                records.len()
            );
        }
        info!(
            "Run finished: {} feeds, {} entries, {} accepted, {} rejected, {} skipped, {} failed",
            stats.feeds_read, stats.entries_seen, stats.accepted, stats.rejected, stats.skipped, stats.failed
        );

        RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            records,
            stats,
            interrupted,
        }
    }
}

fn is_past(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// Sleeps for `pacing`, but never past the run deadline.
async fn pace(pacing: Duration, deadline: Option<Instant>) {
    if pacing.is_zero() {
        return;
    }
    let wake = Instant::now() + pacing;
    let wake = match deadline {
        Some(deadline) if deadline < wake => deadline,
        _ => wake,
    };
    tokio::time::sleep_until(wake).await;
}

/// `None` when the deadline passes first.
async fn within_deadline<F>(deadline: Option<Instant>, fut: F) -> Option<F::Output>
where
    F: std::future::Future,
{
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

/// Pipeline builder for easier configuration
pub struct PipelineBuilder {
    jobs: Vec<FeedJob>,
    feeds: Option<Arc<dyn FeedSource>>,
    articles: Option<Arc<dyn ArticleSource>>,
    classifier: Option<Arc<dyn Classifier>>,
    policy: RunPolicy,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            feeds: None,
            articles: None,
            classifier: None,
            policy: RunPolicy::default(),
        }
    }

    pub fn jobs(mut self, jobs: Vec<FeedJob>) -> Self {
        self.jobs = jobs;
        self
    }

    pub fn add_job(mut self, category: &str, feed_url: &str) -> Self {
        self.jobs.push(FeedJob {
            category: category.to_string(),
            feed_url: feed_url.to_string(),
        });
        self
    }

    pub fn feed_source(mut self, feeds: Arc<dyn FeedSource>) -> Self {
        self.feeds = Some(feeds);
        self
    }

    pub fn article_source(mut self, articles: Arc<dyn ArticleSource>) -> Self {
        self.articles = Some(articles);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn policy(mut self, policy: RunPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fails when a feed source, article source or classifier was not set.
    pub fn build(self) -> Result<Pipeline> {
        let feeds = self.feeds.ok_or(EngineError::Incomplete("feed source"))?;
        let articles = self.articles.ok_or(EngineError::Incomplete("article source"))?;
        let classifier = self.classifier.ok_or(EngineError::Incomplete("classifier"))?;

        Ok(Pipeline {
            jobs: self.jobs,
            feeds,
            processor: ItemProcessor::new(articles, classifier, self.policy.clone()),
            policy: self.policy,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
