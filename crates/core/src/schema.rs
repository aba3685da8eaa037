//! Prompt text and fallback templates for each content type.
//!
//! This is pure data: the instructions sent to the model and the minimal
//! records synthesized when nothing structured can be recovered from its
//! reply.

use serde_json::{Map, Value};

use crate::content_type::ContentType;
use crate::record::NormalizedRecord;
use crate::text::truncate_chars;

/// Longest excerpt of raw model text placed in a fallback record.
pub const FALLBACK_EXCERPT_CHARS: usize = 500;

/// Product descriptions get a shorter excerpt.
const PRODUCT_EXCERPT_CHARS: usize = 300;

/// System instruction shared by every extraction call.
pub const EXTRACTION_SYSTEM_INSTRUCTION: &str = "You are a precise web data extraction specialist. \
Extract structured information from the webpage content you are given and return it as clean JSON \
containing only the extracted data. Keep text in the language it appears in on the page; do not \
translate it. Report only facts present in the content and never invent values. Be thorough and \
capture every relevant data point you can find.";

/// System instruction for conversational answers grounded in website data.
pub const CHAT_SYSTEM_INSTRUCTION: &str = "You are a helpful customer service chatbot for a website. \
You have access to the website's data and should use it to answer user questions accurately. \
Be conversational, helpful, and concise. If you don't know the answer, say so honestly. \
Base your answers ONLY on the provided website data.";

const PRODUCTS_INSTRUCTION: &str = "Extract product information from the webpage content below. \
For each product include:
- name: the product name (required)
- description: a short description of the product (required)
- price: the price with its currency symbol when shown (required)
- imageUrl: the URL of the product image, if available
- availability: in stock, out of stock, preorder and so on
- category: the product category, if available

Return a JSON array of product objects with as many products as the page lists.
Use an empty string for any field the page does not provide.

Page content:";

const CONTACT_INSTRUCTION: &str = "Extract contact information from the webpage content below, including:
- email: every email address found
- phone: every phone number found
- address: physical address(es), including city, state and postal code
- hours: business hours, if available
- socialMedia: links to social media profiles

Return a single JSON object with these fields.
Use an empty string or empty array for any field the page does not provide.

Page content:";

const ABOUT_INSTRUCTION: &str = "Extract company information from the webpage content below, including:
- companyName: the name of the company or organization
- history: how and when the company was founded and has developed
- mission: the mission statement or purpose
- team: team members or leadership
- values: the company's values or principles

Return a single JSON object with these fields, as detailed as the page allows.
Use an empty string for any field the page does not provide.

Page content:";

const FAQ_INSTRUCTION: &str = "Extract the frequently asked questions and their answers from the webpage content below. \
For each FAQ item include:
- question: the question text
- answer: the complete answer text
- category: the question's category, if available

Return a JSON array of FAQ objects with every FAQ item on the page.
Use an empty string for any field the page does not provide.

Page content:";

const POLICIES_INSTRUCTION: &str = "Extract policy information from the webpage content below. \
For each policy document or section include:
- title: the policy name (for example \"Privacy Policy\" or \"Terms of Service\")
- content: the full policy text
- lastUpdated: the date the policy was last updated, if available

Return a JSON array of policy objects with every policy on the page.
Use an empty string for any field the page does not provide.

Page content:";

/// The pair of instructions sent for one extraction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub instruction: String,
}

/// Builds the system and extraction instructions for a content type.
///
/// Known types use a fixed field list; [`ContentType::Generic`] builds its
/// instruction from the caller's `requested_fields`.
pub fn prompt_for(content_type: ContentType, requested_fields: &[String]) -> Prompt {
    let instruction = match content_type {
        ContentType::Products => PRODUCTS_INSTRUCTION.to_string(),
        ContentType::Contact => CONTACT_INSTRUCTION.to_string(),
        ContentType::About => ABOUT_INSTRUCTION.to_string(),
        ContentType::Faq => FAQ_INSTRUCTION.to_string(),
        ContentType::Policies => POLICIES_INSTRUCTION.to_string(),
        ContentType::Generic => generic_instruction(requested_fields),
    };

    Prompt { system: EXTRACTION_SYSTEM_INSTRUCTION.to_string(), instruction }
}

fn generic_instruction(requested_fields: &[String]) -> String {
    let fields = if requested_fields.is_empty() {
        ContentType::Generic.default_fields().join(", ")
    } else {
        requested_fields.join(", ")
    };

    format!(
        "Extract the following information from the webpage content below: {fields}

Return a clean JSON object, or a JSON array of objects when the page lists several items.
Use an empty string for any field the page does not provide.

Page content:"
    )
}

/// Instruction for a conversational answer; the formatted website data is
/// appended after it as the source text.
pub fn chat_instruction(query: &str) -> String {
    format!(
        "Respond to the user query using ONLY the website data that follows.

User query: {query}

Website data:"
    )
}

/// Minimal valid record carrying an excerpt of the raw model text.
///
/// Used when no structured value can be recovered, so downstream stages
/// always receive a value of the content type's canonical shape.
pub fn fallback_record(content_type: ContentType, raw_text: &str) -> NormalizedRecord {
    let excerpt = truncate_chars(raw_text, FALLBACK_EXCERPT_CHARS);

    match content_type {
        ContentType::Products => NormalizedRecord::List(vec![record(&[
            ("name", "Product"),
            ("description", truncate_chars(raw_text, PRODUCT_EXCERPT_CHARS)),
            ("price", ""),
        ])]),
        ContentType::Contact => NormalizedRecord::Single(record(&[("email", ""), ("phone", ""), ("info", excerpt)])),
        ContentType::About => NormalizedRecord::Single(record(&[("companyName", "Unknown"), ("history", excerpt)])),
        ContentType::Faq => NormalizedRecord::List(vec![record(&[("question", "FAQ"), ("answer", excerpt)])]),
        ContentType::Policies => NormalizedRecord::List(vec![record(&[("title", "Policy"), ("content", excerpt)])]),
        ContentType::Generic => NormalizedRecord::Single(record(&[("content", excerpt)])),
    }
}

fn record(fields: &[(&str, &str)]) -> Map<String, Value> {
    fields.iter().map(|(k, v)| (k.to_string(), Value::String(v.to_string()))).collect()
}
