//! Recovery of structured values from free-form model replies.
//!
//! Model output is not guaranteed to be clean JSON: it may be wrapped in a
//! fenced block, surrounded by prose, truncated, or not JSON at all.
//! [`recover`] runs an ordered chain of strategies, most precise first, and
//! stops at the first one that yields a value. The chain always ends in a
//! strategy that cannot fail, so recovery never errors.
//!
//! # Example
//!
//! ```rust
//! use sitelift_core::{ContentType, Strategy, recover};
//!
//! let reply = "I found: {\"companyName\": \"Acme\"} and that's it.";
//! let recovered = recover(reply, ContentType::About);
//! assert_eq!(recovered.strategy, Strategy::BracketScan);
//! assert_eq!(recovered.value["companyName"], "Acme");
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::content_type::{ContentType, Shape};
use crate::schema::fallback_record;
use crate::text::truncate_chars;

/// Longest excerpt of raw text kept by the last-resort wrap.
pub const LAST_RESORT_EXCERPT_CHARS: usize = 1000;

/// Upper bound on regex captures tried per bracket kind.
const MAX_CAPTURES: usize = 64;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[ \t]*[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)```").expect("valid fence pattern"));
static ARRAY_REGION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\[.*?\]").expect("valid array pattern"));
static OBJECT_REGION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*?\}").expect("valid object pattern"));

/// The method that produced a [`RecoveredValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Parsed from a fenced code block.
    FencedBlock,
    /// Parsed from the span between the outermost brackets.
    BracketScan,
    /// Parsed from a regex capture of a bracketed region.
    RegexCapture,
    /// Synthesized from domain keywords found in prose.
    Heuristic,
    /// The raw text wrapped as-is.
    LastResort,
}

impl Strategy {
    /// Heuristic and last-resort values carry no parsed structure.
    pub fn is_low_confidence(&self) -> bool {
        matches!(self, Self::Heuristic | Self::LastResort)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FencedBlock => "fenced_block",
            Self::BracketScan => "bracket_scan",
            Self::RegexCapture => "regex_capture",
            Self::Heuristic => "heuristic",
            Self::LastResort => "last_resort",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value recovered from raw model text, tagged with its strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredValue {
    pub value: Value,
    pub strategy: Strategy,
}

type StrategyFn = fn(&str, ContentType) -> Option<Value>;

/// The chain, in priority order. The last entry always returns a value.
const STRATEGIES: [(Strategy, StrategyFn); 5] = [
    (Strategy::FencedBlock, fenced_block),
    (Strategy::BracketScan, bracket_scan),
    (Strategy::RegexCapture, regex_capture),
    (Strategy::Heuristic, heuristic),
    (Strategy::LastResort, last_resort),
];

/// Recovers a best-effort structured value from raw model text.
///
/// The expected shape comes from `content_type`. Never fails: when nothing
/// parses the result is a low-confidence value of the expected shape.
pub fn recover(raw_text: &str, content_type: ContentType) -> RecoveredValue {
    for (strategy, attempt) in STRATEGIES {
        if let Some(value) = attempt(raw_text, content_type) {
            return RecoveredValue { value, strategy };
        }
    }

    // The chain ends in `last_resort`, which always yields a value.
    RecoveredValue { value: wrap_excerpt(raw_text, content_type.shape()), strategy: Strategy::LastResort }
}

/// Parses `candidate` and accepts it only when it is structured data.
fn parse_structured(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate.trim()).ok().filter(is_structured)
}

/// Parses the first complete JSON value at the start of `text`, ignoring
/// whatever follows it.
fn parse_structured_prefix(text: &str) -> Option<Value> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .next()
        .and_then(|r| r.ok())
        .filter(is_structured)
}

/// An object, or an array whose elements are all objects.
fn is_structured(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => items.iter().all(Value::is_object),
        _ => false,
    }
}

fn fenced_block(raw_text: &str, _content_type: ContentType) -> Option<Value> {
    FENCED_BLOCK
        .captures_iter(raw_text)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| parse_structured(m.as_str()))
}

/// Object-shaped types only look between braces; list types try brackets
/// first, then braces.
fn bracket_scan(raw_text: &str, content_type: ContentType) -> Option<Value> {
    let pairs: &[(char, char)] = match content_type.shape() {
        Shape::List => &[('[', ']'), ('{', '}')],
        Shape::Object => &[('{', '}')],
    };

    pairs.iter().find_map(|&(open, close)| {
        let start = raw_text.find(open)?;
        let end = raw_text.rfind(close)?;
        if end <= start {
            return None;
        }
        parse_structured(&raw_text[start..=end])
    })
}

/// Object-shaped types try object captures first, so an array nested inside
/// the record cannot stand in for it.
fn regex_capture(raw_text: &str, content_type: ContentType) -> Option<Value> {
    let patterns = match content_type.shape() {
        Shape::List => [&*ARRAY_REGION, &*OBJECT_REGION],
        Shape::Object => [&*OBJECT_REGION, &*ARRAY_REGION],
    };

    patterns.into_iter().find_map(|pattern| {
        pattern.find_iter(raw_text).take(MAX_CAPTURES).find_map(|m| {
            parse_structured(m.as_str()).or_else(|| parse_structured_prefix(&raw_text[m.start()..]))
        })
    })
}

fn heuristic(raw_text: &str, content_type: ContentType) -> Option<Value> {
    let lowered = raw_text.to_lowercase();
    content_type
        .keywords()
        .iter()
        .any(|keyword| lowered.contains(keyword))
        .then(|| fallback_record(content_type, raw_text).to_value())
}

fn last_resort(raw_text: &str, content_type: ContentType) -> Option<Value> {
    Some(wrap_excerpt(raw_text, content_type.shape()))
}

fn wrap_excerpt(raw_text: &str, shape: Shape) -> Value {
    let mut map = Map::new();
    map.insert(
        "content".to_string(),
        Value::String(truncate_chars(raw_text, LAST_RESORT_EXCERPT_CHARS).to_string()),
    );

    match shape {
        Shape::List => Value::Array(vec![Value::Object(map)]),
        Shape::Object => Value::Object(map),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_fenced_block_with_prose() {
        let raw = "Here is the data:\n```json\n[{\"name\":\"Widget\",\"price\":\"$9\"}]\n```\nThanks!";
        let recovered = recover(raw, ContentType::Products);
        assert_eq!(recovered.strategy, Strategy::FencedBlock);
        assert_eq!(recovered.value, json!([{"name": "Widget", "price": "$9"}]));
    }

    #[rstest]
    #[case("```json\n{\"a\": 1}\n```")]
    #[case("```JSON\n{\"a\": 1}\n```")]
    #[case("```\n{\"a\": 1}\n```")]
    #[case("```{\"a\": 1}```")]
    #[case("``` json\n{\"a\": 1}\n```")]
    #[case("Sure!\n\n```json   \r\n  {\"a\": 1}  \r\n```\n")]
    fn test_fence_variants(#[case] raw: &str) {
        let recovered = recover(raw, ContentType::Generic);
        assert_eq!(recovered.strategy, Strategy::FencedBlock);
        assert_eq!(recovered.value, json!({"a": 1}));
    }

    #[test]
    fn test_first_parseable_fence_wins() {
        let raw = "```json\n{broken\n```\nthen\n```json\n{\"ok\": true}\n```\n```json\n{\"ok\": false}\n```";
        let recovered = recover(raw, ContentType::Generic);
        assert_eq!(recovered.strategy, Strategy::FencedBlock);
        assert_eq!(recovered.value, json!({"ok": true}));
    }

    #[test]
    fn test_bracket_scan_object() {
        let raw = "I found: {\"companyName\": \"Acme\"} and that's it.";
        let recovered = recover(raw, ContentType::About);
        assert_eq!(recovered.strategy, Strategy::BracketScan);
        assert_eq!(recovered.value, json!({"companyName": "Acme"}));
    }

    #[test]
    fn test_bracket_scan_prefers_array_for_list_types() {
        let raw = "Products: [{\"name\": \"A\", \"meta\": {\"x\": 1}}, {\"name\": \"B\"}] done";
        let recovered = recover(raw, ContentType::Products);
        assert_eq!(recovered.strategy, Strategy::BracketScan);
        assert_eq!(recovered.value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_bracket_scan_falls_back_to_object_for_list_types() {
        let raw = "Result {\"listings\": [{\"name\": \"A\"}]} (see note [1])";
        let recovered = recover(raw, ContentType::Products);
        assert_eq!(recovered.strategy, Strategy::BracketScan);
        assert_eq!(recovered.value, json!({"listings": [{"name": "A"}]}));
    }

    #[test]
    fn test_object_types_keep_the_outer_record() {
        let raw = "I found {\"companyName\":\"Acme\",\"team\":[{\"name\":\"Bo\"}]} (see {ref})";
        let recovered = recover(raw, ContentType::About);
        assert_eq!(recovered.strategy, Strategy::RegexCapture);
        assert_eq!(recovered.value, json!({"companyName": "Acme", "team": [{"name": "Bo"}]}));
    }

    #[test]
    fn test_object_types_read_a_record_wrapped_in_an_array() {
        let raw = "Here: [{\"companyName\":\"Acme\"}] (see {ref})";
        let recovered = recover(raw, ContentType::About);
        assert_eq!(recovered.strategy, Strategy::RegexCapture);
        assert_eq!(
            crate::normalize::normalize(&recovered.value, ContentType::About).to_value(),
            json!({"companyName": "Acme"})
        );
    }

    #[test]
    fn test_object_types_skip_array_bracket_scan() {
        let raw = "Contacts: [{\"email\": \"a@acme.test\"}, {\"email\": \"b@acme.test\"}]";
        let recovered = recover(raw, ContentType::Contact);
        assert_eq!(recovered.strategy, Strategy::RegexCapture);
        assert_eq!(recovered.value, json!({"email": "a@acme.test"}));
    }

    #[test]
    fn test_regex_capture_when_outer_span_is_not_json() {
        let raw = "First {\"question\": \"Q1?\", \"answer\": \"A1\"} and later a stray } brace";
        let recovered = recover(raw, ContentType::Faq);
        assert_eq!(recovered.strategy, Strategy::RegexCapture);
        assert_eq!(recovered.value, json!({"question": "Q1?", "answer": "A1"}));
    }

    #[test]
    fn test_regex_capture_handles_nested_brackets() {
        let raw = "Note [a] then [{\"name\": \"A\", \"tags\": [\"x\"]}] and trailing ] } brackets";
        let recovered = recover(raw, ContentType::Products);
        assert_eq!(recovered.strategy, Strategy::RegexCapture);
        assert_eq!(recovered.value, json!([{"name": "A", "tags": ["x"]}]));
    }

    #[test]
    fn test_scalars_are_not_accepted() {
        let raw = "```json\n\"just a string\"\n```";
        let recovered = recover(raw, ContentType::Generic);
        assert_eq!(recovered.strategy, Strategy::LastResort);
        assert!(recovered.value.is_object());
    }

    #[test]
    fn test_heuristic_for_product_prose() {
        let raw = "The store sells a Blue Widget for $9.99 and a Red Widget for $12.";
        let recovered = recover(raw, ContentType::Products);
        assert_eq!(recovered.strategy, Strategy::Heuristic);
        assert!(recovered.strategy.is_low_confidence());
        let items = recovered.value.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0]["description"].as_str().unwrap().contains("Blue Widget"));
    }

    #[test]
    fn test_no_json_markers_faq_yields_one_element_sequence() {
        let raw = "Sorry, I could not find anything useful on this page.";
        let recovered = recover(raw, ContentType::Faq);
        assert!(recovered.strategy.is_low_confidence());
        let items = recovered.value.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].as_object().unwrap().values().any(|v| v.as_str().is_some_and(|s| s.contains("Sorry"))));
    }

    #[rstest]
    #[case(ContentType::Products, Shape::List)]
    #[case(ContentType::Faq, Shape::List)]
    #[case(ContentType::Policies, Shape::List)]
    #[case(ContentType::Contact, Shape::Object)]
    #[case(ContentType::About, Shape::Object)]
    #[case(ContentType::Generic, Shape::Object)]
    fn test_unparseable_text_matches_expected_shape(#[case] content_type: ContentType, #[case] shape: Shape) {
        for raw in ["", "nothing here", "{ broken [ json", "price list coming soon?"] {
            let recovered = recover(raw, content_type);
            assert!(!recovered.value.is_null());
            match shape {
                Shape::List => assert!(recovered.value.is_array(), "{} / {:?}", content_type, raw),
                Shape::Object => assert!(recovered.value.is_object(), "{} / {:?}", content_type, raw),
            }
        }
    }

    #[test]
    fn test_last_resort_truncates() {
        let raw = "z".repeat(5000);
        let recovered = recover(&raw, ContentType::Generic);
        assert_eq!(recovered.strategy, Strategy::LastResort);
        assert_eq!(recovered.value["content"].as_str().unwrap().len(), LAST_RESORT_EXCERPT_CHARS);
    }

    #[test]
    fn test_empty_array_is_structured() {
        let recovered = recover("```json\n[]\n```", ContentType::Products);
        assert_eq!(recovered.strategy, Strategy::FencedBlock);
        assert_eq!(recovered.value, json!([]));
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(Strategy::RegexCapture.to_string(), "regex_capture");
        assert!(!Strategy::FencedBlock.is_low_confidence());
    }
}
