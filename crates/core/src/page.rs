//! Turning a fetched HTML page into the text handed to the model.
//!
//! Non-content elements are dropped with `lol_html`, the rest is converted to
//! Markdown (or to plain text without the `markdown` feature) and image
//! references are stripped, since they only spend context.

use std::sync::LazyLock;

use regex::Regex;

/// Elements whose content never carries page text.
const REMOVED_TAGS: [&str; 6] = ["script", "style", "noscript", "svg", "iframe", "template"];

static MARKDOWN_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("markdown image pattern is valid"));

static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n(\s*\n)+").expect("blank run pattern is valid"));

/// Heuristic used when no content type header is available.
pub fn looks_like_html(text: &str) -> bool {
    text.trim_start().starts_with('<')
}

/// Full preparation of an HTML document.
pub fn prepare_html(html: &str) -> String {
    let cleaned = remove_non_content(html);
    let text = html_to_text(&cleaned);
    tidy(&strip_markdown_images(&text))
}

/// Preparation for sources that are already text or Markdown.
pub fn prepare_text(text: &str) -> String {
    tidy(&strip_markdown_images(text))
}

/// Remove script, style, noscript, svg, iframe and template elements
pub fn remove_non_content(html: &str) -> String {
    let mut output = Vec::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: REMOVED_TAGS
                .iter()
                .map(|tag| {
                    lol_html::element!(*tag, |el| {
                        el.remove();
                        Ok(())
                    })
                })
                .collect(),
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }

    if rewriter.end().is_err() {
        return html.to_string();
    }

    String::from_utf8_lossy(&output).into_owned()
}

/// Convert HTML to Markdown using htmd crate
#[cfg(feature = "markdown")]
pub fn html_to_text(html: &str) -> String {
    htmd::convert(html).unwrap_or_else(|_| plain_text(html))
}

/// Fallback HTML to text conversion when markdown feature is disabled
#[cfg(not(feature = "markdown"))]
pub fn html_to_text(html: &str) -> String {
    plain_text(html)
}

/// One line per non-empty text node.
fn plain_text(html: &str) -> String {
    let document = scraper::Html::parse_document(html);
    document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drop `![alt](src)` image references.
pub fn strip_markdown_images(text: &str) -> String {
    MARKDOWN_IMAGE.replace_all(text, "").into_owned()
}

fn tidy(text: &str) -> String {
    BLANK_RUNS.replace_all(text, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Shop</title><style>body { color: red; }</style></head>
<body>
  <script>var tracking = "secret";</script>
  <noscript>Enable JavaScript</noscript>
  <h1>Blue Widget</h1>
  <img src="/logo.png" alt="logo">
  <p>Only $9.99 while stocks last.</p>
  <svg><text>icon</text></svg>
</body>
</html>"#;

    #[test]
    fn test_remove_non_content() {
        let cleaned = remove_non_content(PAGE);
        assert!(!cleaned.contains("tracking"));
        assert!(!cleaned.contains("color: red"));
        assert!(!cleaned.contains("Enable JavaScript"));
        assert!(!cleaned.contains("icon"));
        assert!(cleaned.contains("Blue Widget"));
    }

    #[test]
    fn test_prepare_html_keeps_text_drops_images() {
        let text = prepare_html(PAGE);
        assert!(text.contains("Blue Widget"));
        assert!(text.contains("$9.99"));
        assert!(!text.contains("logo.png"));
        assert!(!text.contains("tracking"));
    }

    #[test]
    fn test_strip_markdown_images() {
        assert_eq!(strip_markdown_images("a ![x](y.png) b"), "a  b");
        assert_eq!(strip_markdown_images("[link](page)"), "[link](page)");
    }

    #[test]
    fn test_prepare_text_collapses_blank_runs() {
        assert_eq!(prepare_text("one\n\n\n\n two\n"), "one\n\n two");
    }

    #[test]
    fn test_looks_like_html() {
        assert!(looks_like_html("  <html>"));
        assert!(!looks_like_html("# Heading"));
    }
}
