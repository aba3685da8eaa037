//! Content fetching from URLs, files, and stdin.
//!
//! The pipeline only sees the [`PageFetcher`] trait. [`DefaultFetcher`]
//! resolves a source string to an HTTP/HTTPS URL, a local file or standard
//! input (`-`) and returns the page as Markdown-like text ready for the model.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::io::AsyncReadExt;
use tracing::debug;
use url::Url;

use crate::page::{looks_like_html, prepare_html, prepare_text};
use crate::{Result, SiteliftError};

/// HTTP client configuration for fetching web pages.
///
/// This struct controls timeout and user agent settings for HTTP requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: "Mozilla/5.0 (compatible; Sitelift/0.1; +https://github.com/stormlightlabs/sitelift)".to_string(),
        }
    }
}

/// Where page text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(Url),
    File(PathBuf),
    Stdin,
}

impl Source {
    /// Classifies a source string.
    ///
    /// `-` is stdin, anything with a scheme must be http or https, and
    /// everything else is treated as a local path.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input == "-" {
            return Ok(Self::Stdin);
        }

        if input.contains("://") {
            let url = Url::parse(input).map_err(|e| SiteliftError::InvalidUrl(e.to_string()))?;
            return match url.scheme() {
                "http" | "https" => Ok(Self::Url(url)),
                other => Err(SiteliftError::InvalidUrl(format!("unsupported scheme: {}", other))),
            };
        }

        Ok(Self::File(PathBuf::from(input)))
    }
}

/// Supplies the text of a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the page text, or an error when nothing usable was found.
    async fn fetch(&self, source: &str) -> Result<String>;
}

/// Fetches URLs, files and stdin with a [`FetchConfig`].
#[derive(Debug, Clone, Default)]
pub struct DefaultFetcher {
    config: FetchConfig,
}

impl DefaultFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PageFetcher for DefaultFetcher {
    async fn fetch(&self, source: &str) -> Result<String> {
        let text = match Source::parse(source)? {
            Source::Url(url) => fetch_url(url.as_str(), &self.config).await?,
            Source::File(path) => fetch_file(&path).await?,
            Source::Stdin => fetch_stdin().await?,
        };

        if text.trim().is_empty() {
            return Err(SiteliftError::FetchError(format!("no text found at {}", source)));
        }

        debug!(source = %source, chars = text.chars().count(), "Fetched page text");
        Ok(text)
    }
}

/// Fetches a page over HTTP and returns its prepared text.
///
/// This function performs an HTTP GET request with the configured timeout and
/// a browser-like User-Agent. HTML responses are cleaned and converted.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<String> {
    let parsed_url = Url::parse(url).map_err(|e| SiteliftError::InvalidUrl(e.to_string()))?;

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(SiteliftError::HttpError)?;

    let response = client
        .get(parsed_url)
        .header("User-Agent", &config.user_agent)
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() { SiteliftError::Timeout { timeout: config.timeout } } else { SiteliftError::HttpError(e) }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SiteliftError::FetchError(format!("{} returned {}", url, status)));
    }

    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("html"));

    let body = response.text().await?;

    Ok(match is_html {
        Some(true) => prepare_html(&body),
        Some(false) => prepare_text(&body),
        None if looks_like_html(&body) => prepare_html(&body),
        None => prepare_text(&body),
    })
}

/// Reads a local page and returns its prepared text.
///
/// Callers should validate and sanitize the path when accepting user input.
pub async fn fetch_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(SiteliftError::FileNotFound(path.to_path_buf()));
    }

    let body = tokio::fs::read_to_string(path).await?;
    let html_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));

    Ok(if html_extension || looks_like_html(&body) { prepare_html(&body) } else { prepare_text(&body) })
}

/// Reads a page from standard input until EOF.
pub async fn fetch_stdin() -> Result<String> {
    let mut buffer = String::new();
    tokio::io::stdin().read_to_string(&mut buffer).await?;

    Ok(if looks_like_html(&buffer) { prepare_html(&buffer) } else { prepare_text(&buffer) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_page(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 30);
        assert!(config.user_agent.contains("Sitelift"));
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(Source::parse("-").unwrap(), Source::Stdin);
        assert!(matches!(Source::parse("https://example.com").unwrap(), Source::Url(_)));
        assert_eq!(Source::parse("page.html").unwrap(), Source::File(PathBuf::from("page.html")));
        assert!(matches!(Source::parse("ftp://example.com/x"), Err(SiteliftError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_url_invalid() {
        let result = fetch_url("not-a-url", &FetchConfig::default()).await;
        assert!(matches!(result, Err(SiteliftError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_url_unreachable_is_fetch_error() {
        let config = FetchConfig { timeout: 5, ..FetchConfig::default() };
        let err = fetch_url("http://127.0.0.1:9/", &config).await.unwrap_err();
        assert!(err.is_fetch_error());
    }

    #[tokio::test]
    async fn test_fetch_file_not_found() {
        let result = fetch_file(Path::new("/nonexistent/path/file.html")).await;
        assert!(matches!(result, Err(SiteliftError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_fetch_html_file_is_prepared() {
        let file = temp_page(".html", "<html><body><script>x()</script><p>Hello shop</p></body></html>");
        let text = fetch_file(file.path()).await.unwrap();
        assert!(text.contains("Hello shop"));
        assert!(!text.contains("x()"));
    }

    #[tokio::test]
    async fn test_fetch_markdown_file_passes_through() {
        let file = temp_page(".md", "# Pricing\n\n![banner](b.png)\nWidget: $9");
        let text = fetch_file(file.path()).await.unwrap();
        assert_eq!(text, "# Pricing\n\nWidget: $9");
    }

    #[tokio::test]
    async fn test_empty_page_is_fetch_error() {
        let file = temp_page(".html", "<html><body>  <script>only()</script> </body></html>");
        let fetcher = DefaultFetcher::default();
        let result = fetcher.fetch(file.path().to_str().unwrap()).await;
        assert!(matches!(result, Err(SiteliftError::FetchError(_))));
    }
}
