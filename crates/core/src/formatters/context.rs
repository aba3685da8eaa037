use serde_json::Value;

use crate::record::{Record, WebsiteData};
use crate::text::truncate_with_ellipsis;

/// Configuration for rendering website data as model context
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Entries shown per enumerable section (products, FAQ)
    pub max_items: usize,

    /// Character cap for long free-text fields (descriptions, policy bodies)
    pub max_field_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { max_items: 10, max_field_chars: 200 }
    }
}

/// Renders a [`WebsiteData`] bundle into bounded, human-readable text
pub struct ContextFormatter {
    config: ContextConfig,
}

impl ContextFormatter {
    pub fn new(config: ContextConfig) -> Self {
        Self { config }
    }

    /// Format the bundle with this formatter's configuration
    pub fn format(&self, data: &WebsiteData) -> String {
        format_context(data, &self.config)
    }
}

/// Render sections in fixed order: products, contact, about, FAQ, policies.
///
/// Empty sections are omitted; entry order follows the data.
pub fn format_context(data: &WebsiteData, config: &ContextConfig) -> String {
    let sections = [
        products_section(&data.products, config),
        mapping_section("CONTACT INFORMATION:", &data.contact),
        mapping_section("ABOUT THE COMPANY:", &data.about),
        faq_section(&data.faq, config),
        policies_section(&data.policies, config),
    ];

    sections.into_iter().flatten().collect::<Vec<_>>().join("\n\n")
}

fn products_section(products: &[Record], config: &ContextConfig) -> Option<String> {
    if products.is_empty() {
        return None;
    }

    let mut lines = vec!["PRODUCTS:".to_string()];

    for (i, product) in products.iter().take(config.max_items).enumerate() {
        let mut parts = Vec::new();
        if let Some(name) = text_field(product, "name") {
            parts.push(format!("Name: {}", name));
        }
        if let Some(price) = text_field(product, "price") {
            parts.push(format!("Price: {}", price));
        }
        if let Some(description) = text_field(product, "description") {
            parts.push(format!("Description: {}", truncate_with_ellipsis(&description, config.max_field_chars)));
        }
        lines.push(format!("Product {}: {}", i + 1, parts.join(" | ")));
    }

    if let Some(marker) = more_marker(products.len(), config.max_items, "products") {
        lines.push(marker);
    }

    Some(lines.join("\n"))
}

fn mapping_section(heading: &str, record: &Record) -> Option<String> {
    let lines: Vec<String> = record
        .iter()
        .filter_map(|(key, value)| display_value(value).map(|v| format!("{}: {}", capitalize(key), v)))
        .collect();

    if lines.is_empty() { None } else { Some(format!("{}\n{}", heading, lines.join("\n"))) }
}

fn faq_section(faq: &[Record], config: &ContextConfig) -> Option<String> {
    if faq.is_empty() {
        return None;
    }

    let mut lines = vec!["FREQUENTLY ASKED QUESTIONS:".to_string()];

    for (i, item) in faq.iter().take(config.max_items).enumerate() {
        if let (Some(question), Some(answer)) = (text_field(item, "question"), text_field(item, "answer")) {
            lines.push(format!("Q{}: {}", i + 1, question));
            lines.push(format!("A{}: {}", i + 1, answer));
        }
    }

    if let Some(marker) = more_marker(faq.len(), config.max_items, "FAQs") {
        lines.push(marker);
    }

    Some(lines.join("\n"))
}

fn policies_section(policies: &[Record], config: &ContextConfig) -> Option<String> {
    let mut lines = Vec::new();

    for policy in policies {
        let Some(title) = text_field(policy, "title") else {
            continue;
        };
        lines.push(format!("Policy: {}", title));
        if let Some(content) = text_field(policy, "content") {
            lines.push(format!("Content: {}", truncate_with_ellipsis(&content, config.max_field_chars)));
        }
    }

    if lines.is_empty() { None } else { Some(format!("POLICIES:\n{}", lines.join("\n"))) }
}

fn more_marker(total: usize, shown: usize, noun: &str) -> Option<String> {
    (total > shown).then(|| format!("(+ {} more {})", total - shown, noun))
}

/// A field's display text, skipping empty values.
fn text_field(record: &Record, key: &str) -> Option<String> {
    record.get(key).and_then(display_value)
}

fn display_value(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items.iter().filter_map(display_value).collect::<Vec<_>>().join(", "),
        Value::Object(map) if map.is_empty() => return None,
        other => other.to_string(),
    };

    if text.is_empty() { None } else { Some(text) }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
