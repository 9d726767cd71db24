use crate::types::{ClassificationVerdict, EngineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Instruction sent ahead of every article.
pub const CLASSIFIER_PROMPT: &str = r#"You are a strict current-affairs editor for competitive exams (NDA, IBPS).
Read the provided news article text.

Rule 1: If the news is entertainment, gossip, local crime, routine accidents, or domestic political bickering, output exactly:
{"status": "REJECTED"}

Rule 2: If the news is highly relevant (global economics, international relations, major space or technology launches, international sports tournaments), extract the core facts and output exactly this JSON shape:
{
  "status": "ACCEPTED",
  "topic": "Short clear title",
  "what": "Exactly what happened?",
  "who": "Key people, organizations, or countries involved",
  "where": "Location",
  "when": "Date or timeframe",
  "why_how": "The reason, method, or background behind the event",
  "takeaway": "One line summary for exam perspective"
}

Do NOT wrap the answer in markdown such as ```json. Output ONLY the raw JSON object."#;

pub fn build_prompt(article_text: &str) -> String {
    format!("{}\n\nArticle Text:\n{}", CLASSIFIER_PROMPT, article_text)
}

/// Turns article text into a verdict.
///
/// Errors cover both capability failures and undecodable responses; callers
/// treat any error as a miss for that article.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Name used in logs
    fn adapter_name(&self) -> String;

    async fn classify(&self, article_text: &str) -> Result<ClassificationVerdict>;
}

/// Removes a surrounding ```` ```json ```` (or bare ```` ``` ````) fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Decodes a raw classifier response into a verdict.
pub fn parse_verdict(raw: &str) -> Result<ClassificationVerdict> {
    let body = strip_code_fence(raw);
    serde_json::from_str::<ClassificationVerdict>(body).map_err(|e| {
        EngineError::Classification(format!("undecodable response ({}): {}", e, preview(body)))
    })
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(120).collect();
    if out.len() < text.len() {
        out.push_str("...");
    }
    out
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Result<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(EngineError::Classification(format!("prompt blocked: {}", reason)));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::Classification("response had no candidates".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(EngineError::Classification(format!(
                "empty candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }
}

/// Classifier backed by the Gemini `generateContent` REST endpoint.
pub struct GeminiClassifier {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl fmt::Debug for GeminiClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClassifier")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GeminiClassifier {
    pub fn new(base_url: &str, model: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        );
        url::Url::parse(&endpoint)?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
            api_key,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::Classification(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Classification(format!(
                "capability returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Classification(format!("unreadable response: {}", e)))?;

        body.into_text()
    }
}

#[async_trait]
impl Classifier for GeminiClassifier {
    fn adapter_name(&self) -> String {
        format!("Gemini ({})", self.model)
    }

    async fn classify(&self, article_text: &str) -> Result<ClassificationVerdict> {
        let raw = self.generate(&build_prompt(article_text)).await?;
        debug!("Classifier raw response: {} chars", raw.len());
        parse_verdict(&raw)
    }
}

/// Scripted classifier for development and testing.
///
/// Replays the queued raw responses in order through [`parse_verdict`];
/// once the script runs out every call is answered with a rejection.
pub struct MockClassifier {
    name: String,
    responses: Mutex<VecDeque<String>>,
    seen_texts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    response_delay_ms: u64,
}

impl MockClassifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responses: Mutex::new(VecDeque::new()),
            seen_texts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            response_delay_ms: 0,
        }
    }

    pub fn with_responses<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Ok(mut queue) = self.responses.lock() {
            queue.extend(responses.into_iter().map(Into::into));
        }
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.response_delay_ms = delay_ms;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Article texts received so far, in call order.
    pub fn seen_texts(&self) -> Vec<String> {
        self.seen_texts.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    fn adapter_name(&self) -> String {
        format!("Mock Classifier ({})", self.name)
    }

    async fn classify(&self, article_text: &str) -> Result<ClassificationVerdict> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen_texts.lock() {
            seen.push(article_text.to_string());
        }

        if self.response_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.response_delay_ms)).await;
        }

        let next = self.responses.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(raw) => parse_verdict(&raw),
            None => {
                info!("{} script exhausted, rejecting", self.adapter_name());
                Ok(ClassificationVerdict::Rejected)
            }
        }
    }
}
