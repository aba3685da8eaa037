//! Runtime configuration.
//!
//! Everything the pipeline needs from its surroundings (credential, model,
//! endpoint, timeouts) lives in a [`Config`] value that is built once and
//! passed down. [`Config::from_env`] is the only place the environment is
//! read.
//!
//! # Example
//!
//! ```rust
//! use sitelift_core::Config;
//!
//! let config = Config::builder()
//!     .api_key("test-key")
//!     .model("gemini-2.0-flash")
//!     .fetch_timeout(10)
//!     .build();
//!
//! assert!(config.completion.api_key().is_some());
//! assert_eq!(config.fetch.timeout, 10);
//! ```

use tracing::warn;

use crate::completion::ModelPricing;
use crate::fetch::FetchConfig;

/// Environment variable holding the completion credential.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "SITELIFT_MODEL";
pub const BASE_URL_VAR: &str = "SITELIFT_BASE_URL";
pub const TIMEOUT_VAR: &str = "SITELIFT_TIMEOUT";

/// Settings for the completion service.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    /// Bearer credential; `None` or blank means unconfigured.
    pub api_key: Option<String>,
    /// Model name sent with every request (default: gemini-2.0-flash).
    pub model: String,
    /// Base of an OpenAI-compatible API; `/chat/completions` is appended.
    pub base_url: String,
    /// Request timeout in seconds (default: 120).
    pub timeout: u64,
    /// Used to estimate cost from token usage.
    pub pricing: Option<ModelPricing>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            timeout: 120,
            pricing: Some(ModelPricing::default()),
        }
    }
}

impl CompletionConfig {
    /// The credential, if one is set and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|key| !key.is_empty())
    }
}

/// Top-level configuration for an [`Extractor`](crate::Extractor).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub fetch: FetchConfig,
    pub completion: CompletionConfig,
}

impl Config {
    /// Creates a new builder with default values.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Reads `GEMINI_API_KEY`, `SITELIFT_MODEL`, `SITELIFT_BASE_URL` and
    /// `SITELIFT_TIMEOUT` on top of the defaults.
    ///
    /// A missing key is not an error here; it surfaces when the completion
    /// client is constructed.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let present = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        config.completion.api_key = present(API_KEY_VAR);
        if let Some(model) = present(MODEL_VAR) {
            config.completion.model = model.trim().to_string();
        }
        if let Some(base_url) = present(BASE_URL_VAR) {
            config.completion.base_url = base_url.trim().to_string();
        }
        if let Some(raw) = present(TIMEOUT_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(timeout) => config.completion.timeout = timeout,
                Err(e) => warn!(value = %raw, error = %e, "Ignoring invalid {}", TIMEOUT_VAR),
            }
        }

        config
    }
}

/// Builder for [`Config`].
///
/// # Example
///
/// ```rust
/// use sitelift_core::ConfigBuilder;
///
/// let config = ConfigBuilder::from_env()
///     .completion_timeout(30)
///     .user_agent("my-agent/1.0")
///     .build();
///
/// assert_eq!(config.completion.timeout, 30);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: Config::default() }
    }

    /// Starts from [`Config::from_env`].
    pub fn from_env() -> Self {
        Self { config: Config::from_env() }
    }

    /// Sets the completion credential.
    pub fn api_key(mut self, value: impl Into<String>) -> Self {
        self.config.completion.api_key = Some(value.into());
        self
    }

    /// Sets the model name.
    pub fn model(mut self, value: impl Into<String>) -> Self {
        self.config.completion.model = value.into();
        self
    }

    /// Sets the completion API base URL.
    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.config.completion.base_url = value.into();
        self
    }

    /// Sets the completion request timeout in seconds.
    pub fn completion_timeout(mut self, value: u64) -> Self {
        self.config.completion.timeout = value;
        self
    }

    /// Sets the page fetch timeout in seconds.
    pub fn fetch_timeout(mut self, value: u64) -> Self {
        self.config.fetch.timeout = value;
        self
    }

    /// Sets the User-Agent sent when fetching pages.
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.fetch.user_agent = value.into();
        self
    }

    /// Sets the pricing used for cost estimates; `None` disables them.
    pub fn pricing(mut self, value: Option<ModelPricing>) -> Self {
        self.config.completion.pricing = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.completion.model, "gemini-2.0-flash");
        assert_eq!(config.completion.timeout, 120);
        assert_eq!(config.fetch.timeout, 30);
        assert!(config.completion.api_key().is_none());
    }

    #[test]
    fn test_from_lookup_reads_variables() {
        let config = Config::from_lookup(lookup(&[
            (API_KEY_VAR, "secret"),
            (MODEL_VAR, "gemini-1.5-pro"),
            (BASE_URL_VAR, "http://localhost:11434/v1"),
            (TIMEOUT_VAR, "45"),
        ]));

        assert_eq!(config.completion.api_key(), Some("secret"));
        assert_eq!(config.completion.model, "gemini-1.5-pro");
        assert_eq!(config.completion.base_url, "http://localhost:11434/v1");
        assert_eq!(config.completion.timeout, 45);
    }

    #[test]
    fn test_blank_key_is_missing() {
        let config = Config::from_lookup(lookup(&[(API_KEY_VAR, "  ")]));
        assert!(config.completion.api_key.is_none());
        assert!(config.completion.api_key().is_none());
    }

    #[test]
    fn test_invalid_timeout_ignored() {
        let config = Config::from_lookup(lookup(&[(TIMEOUT_VAR, "soon")]));
        assert_eq!(config.completion.timeout, 120);
    }

    #[test]
    fn test_builder() {
        let config = Config::builder()
            .api_key("k")
            .base_url("http://127.0.0.1:1")
            .completion_timeout(5)
            .fetch_timeout(7)
            .user_agent("agent")
            .pricing(None)
            .build();

        assert_eq!(config.completion.api_key(), Some("k"));
        assert_eq!(config.completion.timeout, 5);
        assert_eq!(config.fetch.timeout, 7);
        assert_eq!(config.fetch.user_agent, "agent");
        assert!(config.completion.pricing.is_none());
    }
}
