//! Pipeline Orchestrator.
//!
//! [`Extractor::extract`] runs one request through
//! `FETCHING -> PROMPTING -> COMPLETING -> RECOVERING -> NORMALIZING -> DONE`.
//! Only fetching and completing can fail, and any failure ends in `FAILED`
//! with a well-formed [`ExtractionResult`]. Once a completion is obtained a
//! result with data is always produced.
//!
//! [`Extractor::answer`] is the conversational variant: it renders a
//! [`WebsiteData`] bundle as context and asks the model a question about it.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::completion::{CompletionAdapter, GenerationParams};
use crate::config::Config;
use crate::fetch::{DefaultFetcher, PageFetcher};
use crate::formatters::{ContextConfig, format_context};
use crate::normalize::normalize;
use crate::record::{ChatReply, ExtractionRequest, ExtractionResult, WebsiteData};
use crate::recovery::recover;
use crate::schema::{CHAT_SYSTEM_INSTRUCTION, chat_instruction, prompt_for};
use crate::{Result, SiteliftError};

/// Reply text when the completion service is not configured.
pub const KNOWLEDGE_BASE_UNAVAILABLE: &str = "I'm sorry, I couldn't access my knowledge base at the moment.";

/// Reply text when the completion call itself failed.
pub const PROCESSING_FAILED: &str = "I'm sorry, I encountered an error while processing your request.";

pub const MISSING_CHAT_INPUT: &str = "Missing query or website data";
pub const INVALID_CHAT_REQUEST: &str = "Error processing your request.";

/// Orchestrator states, logged as each one is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Prompting,
    Completing,
    Recovering,
    Normalizing,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching => "FETCHING",
            Self::Prompting => "PROMPTING",
            Self::Completing => "COMPLETING",
            Self::Recovering => "RECOVERING",
            Self::Normalizing => "NORMALIZING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs extraction and conversational requests.
///
/// Holds no mutable state; clones share their collaborators, so one task per
/// URL can run concurrently.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use sitelift_core::{CompletionAdapter, ContentType, DefaultFetcher, ExtractionRequest, Extractor, ReplayService};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let adapter = CompletionAdapter::new(Arc::new(ReplayService::new("{\"companyName\": \"Acme\"}")));
/// let extractor = Extractor::new(Arc::new(DefaultFetcher::default()), adapter);
///
/// let request = ExtractionRequest::new("/nonexistent/page.html", Vec::<String>::new(), ContentType::About);
/// let result = extractor.extract(&request).await;
/// assert_eq!(result.error.as_deref(), Some("Failed to fetch content"));
/// # });
/// ```
#[derive(Clone)]
pub struct Extractor {
    fetcher: Arc<dyn PageFetcher>,
    adapter: CompletionAdapter,
}

impl Extractor {
    pub fn new(fetcher: Arc<dyn PageFetcher>, adapter: CompletionAdapter) -> Self {
        Self { fetcher, adapter }
    }

    /// Default fetcher plus an HTTP completion client.
    ///
    /// Fails with [`SiteliftError::ConfigError`] when no credential is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let adapter = CompletionAdapter::from_config(&config.completion)?;
        Ok(Self::new(Arc::new(DefaultFetcher::new(config.fetch.clone())), adapter))
    }

    /// Runs one request to a terminal state. Never fails.
    pub async fn extract(&self, request: &ExtractionRequest) -> ExtractionResult {
        let start = Instant::now();
        let mut stage = Stage::Fetching;

        match self.run(request, &mut stage).await {
            Ok(result) => {
                debug!(
                    url = %request.source_url,
                    stage = %Stage::Done,
                    records = result.data.len(),
                    duration_ms = start.elapsed().as_millis(),
                    "Extraction finished"
                );
                result
            }
            Err(e) => {
                warn!(
                    url = %request.source_url,
                    content_type = %request.content_type,
                    stage = %Stage::Failed,
                    failed_during = %stage,
                    error = %e,
                    "Extraction failed"
                );
                ExtractionResult::failed(&request.source_url, request.content_type, e.user_message())
            }
        }
    }

    async fn run(&self, request: &ExtractionRequest, stage: &mut Stage) -> Result<ExtractionResult> {
        let content_type = request.content_type;
        enter(stage, Stage::Fetching, request);
        let page = self.fetcher.fetch(&request.source_url).await?;

        enter(stage, Stage::Prompting, request);
        let prompt = prompt_for(content_type, &request.requested_fields);

        enter(stage, Stage::Completing, request);
        let raw = self
            .adapter
            .complete(&prompt.system, &prompt.instruction, &page, &GenerationParams::extraction())
            .await?;

        enter(stage, Stage::Recovering, request);
        let recovered = recover(&raw.text, content_type);
        if recovered.strategy.is_low_confidence() {
            warn!(url = %request.source_url, strategy = %recovered.strategy, "No structured data in model reply");
        } else {
            debug!(url = %request.source_url, strategy = %recovered.strategy, "Recovered structured data");
        }

        enter(stage, Stage::Normalizing, request);
        let data = normalize(&recovered.value, content_type);

        *stage = Stage::Done;
        Ok(ExtractionResult {
            source_url: request.source_url.clone(),
            input_tokens: raw.input_tokens,
            output_tokens: raw.output_tokens,
            cost: raw.cost(),
            data,
            error: None,
        })
    }

    /// Answers `query` from the website data. Never fails.
    pub async fn answer(&self, query: &str, data: &WebsiteData) -> ChatReply {
        if query.trim().is_empty() || data.is_empty() {
            return reply_for_error(&SiteliftError::InvalidInput(MISSING_CHAT_INPUT.to_string()));
        }

        let context = format_context(data, &ContextConfig::default());
        let reply = self
            .adapter
            .complete(CHAT_SYSTEM_INSTRUCTION, &chat_instruction(query), &context, &GenerationParams::conversation())
            .await;

        match reply {
            Ok(raw) => ChatReply::answered(raw.text.trim()),
            Err(e) => {
                warn!(error = %e, "Chat completion failed");
                reply_for_error(&e)
            }
        }
    }
}

/// The placeholder reply for a conversational failure.
pub fn reply_for_error(error: &SiteliftError) -> ChatReply {
    match error {
        SiteliftError::ConfigError(_) => ChatReply::failed(error.user_message(), KNOWLEDGE_BASE_UNAVAILABLE),
        SiteliftError::InvalidInput(_) => ChatReply::failed(error.user_message(), INVALID_CHAT_REQUEST),
        _ => ChatReply::failed(error.user_message(), PROCESSING_FAILED),
    }
}

fn enter(stage: &mut Stage, next: Stage, request: &ExtractionRequest) {
    *stage = next;
    debug!(url = %request.source_url, content_type = %request.content_type, stage = %next, "Entering stage");
}
