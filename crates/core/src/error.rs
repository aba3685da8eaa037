//! Error types for Sitelift operations.
//!
//! This module defines the main error type [`SiteliftError`] which represents
//! every failure the pipeline can observe: fetching page text, talking to the
//! completion service, and loading configuration. Recovery and normalization
//! never fail, so they have no variants here.
//!
//! # Example
//!
//! ```rust
//! use sitelift_core::{SiteliftError, Result};
//!
//! fn require_text(text: &str) -> Result<&str> {
//!     if text.trim().is_empty() {
//!         return Err(SiteliftError::FetchError("page is empty".to_string()));
//!     }
//!     Ok(text)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Shown to callers when no credential is configured.
pub const MISSING_KEY_MESSAGE: &str = "Missing API key. Please set the GEMINI_API_KEY environment variable.";

/// Main error type for extraction operations.
///
/// The variants fall into three groups that the orchestrator reports
/// differently: configuration problems, fetch problems (the page text could
/// not be obtained) and upstream problems (the completion service failed).
#[derive(Error, Debug)]
pub enum SiteliftError {
    /// HTTP request errors from reqwest while fetching a page.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Page request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The page was reachable but yielded no usable text.
    #[error("Failed to fetch content: {0}")]
    FetchError(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O errors while reading a local page or stdin.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing or invalid configuration, most often the completion credential.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The completion service failed: transport, quota, timeout or an
    /// undecodable reply.
    #[error("Completion service error: {0}")]
    UpstreamError(String),

    /// The caller supplied input the pipeline cannot work with.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SiteliftError {
    /// True for errors raised while obtaining page text.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Self::HttpError(_)
                | Self::Timeout { .. }
                | Self::InvalidUrl(_)
                | Self::FetchError(_)
                | Self::FileNotFound(_)
                | Self::IoError(_)
        )
    }

    /// Short message suitable for the `error` field of a result.
    ///
    /// Upstream and transport details stay out of it; they belong in the
    /// diagnostic log.
    pub fn user_message(&self) -> String {
        match self {
            Self::ConfigError(_) => MISSING_KEY_MESSAGE.to_string(),
            Self::UpstreamError(_) => "Language model request failed".to_string(),
            Self::InvalidInput(msg) => msg.clone(),
            e if e.is_fetch_error() => "Failed to fetch content".to_string(),
            e => e.to_string(),
        }
    }
}

/// Result type alias for SiteliftError.
pub type Result<T> = std::result::Result<T, SiteliftError>;
