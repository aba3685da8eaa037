//! Completion Adapter: the seam between the pipeline and a language model.
//!
//! [`CompletionService`] is the raw collaborator (messages in, text and usage
//! out). [`CompletionAdapter`] sits on top of it and owns the per-call policy:
//! bounding the source text, building the message list and turning whatever
//! usage the service reports into a [`RawCompletion`].
//!
//! Two services ship with the crate: [`ChatClient`] talks to an
//! OpenAI-compatible `chat/completions` endpoint over HTTP, and
//! [`ReplayService`] returns a recorded reply without touching the network.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CompletionConfig;
use crate::text::truncate_chars;
use crate::{Result, SiteliftError};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Sampling and size limits for one kind of call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    /// Cap on generated tokens.
    pub max_output_tokens: u32,
    /// Source text beyond this many characters is dropped before the call.
    pub max_source_chars: usize,
}

impl GenerationParams {
    /// Near-deterministic sampling with room to enumerate many records.
    pub fn extraction() -> Self {
        Self { temperature: 0.2, max_output_tokens: 8000, max_source_chars: 10_000 }
    }

    /// Conversational answers: more varied, much shorter.
    pub fn conversation() -> Self {
        Self { temperature: 0.5, max_output_tokens: 1000, max_source_chars: 30_000 }
    }
}

/// Token accounting as reported by an OpenAI-compatible service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

/// What a [`CompletionService`] hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceReply {
    pub text: String,
    pub usage: Option<TokenUsage>,
    /// Monetary cost, when the service reports one itself.
    pub cost: Option<f64>,
}

/// Output of one adapter call. Usage is always filled in, zero when the
/// service did not report it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCompletion {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_estimate: Option<f64>,
}

impl RawCompletion {
    /// Cost in USD, zero when unknown.
    pub fn cost(&self) -> f64 {
        self.cost_estimate.unwrap_or(0.0)
    }
}

/// Per-token prices used to estimate cost when the service reports none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// USD per million input tokens.
    pub input_per_million: f64,
    /// USD per million output tokens.
    pub output_per_million: f64,
}

impl ModelPricing {
    pub fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self { input_per_million, output_per_million }
    }

    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        (usage.prompt_tokens as f64 * self.input_per_million + usage.completion_tokens as f64 * self.output_per_million)
            / 1_000_000.0
    }
}

impl Default for ModelPricing {
    /// Published gemini-2.0-flash rates.
    fn default() -> Self {
        Self::new(0.10, 0.40)
    }
}

/// A language model that turns messages into text.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, messages: &[Message], params: &GenerationParams) -> Result<ServiceReply>;
}

/// Uniform front for every completion call the pipeline makes.
#[derive(Clone)]
pub struct CompletionAdapter {
    service: Arc<dyn CompletionService>,
    pricing: Option<ModelPricing>,
}

impl CompletionAdapter {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service, pricing: None }
    }

    /// Estimate cost from usage when the service does not report it.
    pub fn with_pricing(mut self, pricing: ModelPricing) -> Self {
        self.pricing = Some(pricing);
        self
    }

    /// Adapter over an HTTP [`ChatClient`].
    ///
    /// Fails with [`SiteliftError::ConfigError`] when no credential is set.
    pub fn from_config(config: &CompletionConfig) -> Result<Self> {
        let client = ChatClient::new(config)?;
        let adapter = Self::new(Arc::new(client));
        Ok(match config.pricing {
            Some(pricing) => adapter.with_pricing(pricing),
            None => adapter,
        })
    }

    /// Sends `system` and `"{instruction} {source_text}"` to the service.
    ///
    /// `source_text` is cut to `params.max_source_chars` characters first.
    pub async fn complete(
        &self, system: &str, instruction: &str, source_text: &str, params: &GenerationParams,
    ) -> Result<RawCompletion> {
        let source = truncate_chars(source_text, params.max_source_chars);
        if source.len() < source_text.len() {
            debug!(
                source_chars = source_text.chars().count(),
                kept_chars = params.max_source_chars,
                "Truncated source text"
            );
        }

        let messages = [Message::system(system), Message::user(format!("{} {}", instruction, source))];
        let reply = self.service.complete(&messages, params).await?;

        let usage = reply.usage.unwrap_or_default();
        let cost_estimate = reply
            .cost
            .or_else(|| reply.usage.zip(self.pricing).map(|(usage, pricing)| pricing.cost(&usage)));

        Ok(RawCompletion {
            text: reply.text,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            cost_estimate,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponseRaw {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct ChatClient {
    http_client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: u64,
}

impl ChatClient {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = config
            .api_key()
            .ok_or_else(|| SiteliftError::ConfigError("GEMINI_API_KEY is not set".to_string()))?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| SiteliftError::UpstreamError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key: api_key.to_string(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionService for ChatClient {
    async fn complete(&self, messages: &[Message], params: &GenerationParams) -> Result<ServiceReply> {
        let start = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_output_tokens,
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, model = %self.model, "Completion request failed");
                if e.is_timeout() {
                    SiteliftError::UpstreamError(format!("request timed out after {} seconds", self.timeout))
                } else {
                    SiteliftError::UpstreamError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Completion service error");
            return Err(SiteliftError::UpstreamError(format!("status {}: {}", status, error_text)));
        }

        let raw: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| SiteliftError::UpstreamError(format!("undecodable reply: {}", e)))?;

        let text = raw
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SiteliftError::UpstreamError("reply contained no choices".to_string()))?;

        debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis(),
            input_tokens = raw.usage.map(|u| u.prompt_tokens),
            output_tokens = raw.usage.map(|u| u.completion_tokens),
            "Chat completion"
        );

        Ok(ServiceReply { text, usage: raw.usage, cost: None })
    }
}

/// Returns one recorded reply for every call.
#[derive(Debug, Clone)]
pub struct ReplayService {
    text: String,
}

impl ReplayService {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Loads the recorded reply from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SiteliftError::FileNotFound(path.to_path_buf()));
        }
        Ok(Self::new(std::fs::read_to_string(path)?))
    }
}

#[async_trait]
impl CompletionService for ReplayService {
    async fn complete(&self, _messages: &[Message], _params: &GenerationParams) -> Result<ServiceReply> {
        Ok(ServiceReply { text: self.text.clone(), usage: None, cost: None })
    }
}
