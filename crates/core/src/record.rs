//! Request and result types that cross the pipeline boundary.
//!
//! [`ExtractionResult`] and [`ChatReply`] are the two documents the process
//! shell prints. Both keep a stable schema on failure: usage counters are
//! zero rather than absent and `data` is never null.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content_type::{ContentType, Shape};
use crate::normalize::normalize;

/// A JSON object as produced by the model.
pub type Record = Map<String, Value>;

/// One extraction invocation. Created per request and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub source_url: String,
    pub requested_fields: Vec<String>,
    pub content_type: ContentType,
}

impl ExtractionRequest {
    /// Builds a request, falling back to the content type's default fields
    /// when `fields` holds nothing but blanks.
    pub fn new<I, S>(source_url: impl Into<String>, fields: I, content_type: ContentType) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut requested_fields: Vec<String> = fields
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();

        if requested_fields.is_empty() {
            requested_fields = content_type.default_fields().iter().map(|f| f.to_string()).collect();
        }

        Self { source_url: source_url.into(), requested_fields, content_type }
    }

    /// Parses a comma-separated field list such as `name,price,description`.
    pub fn from_field_list(source_url: impl Into<String>, fields: &str, content_type: ContentType) -> Self {
        Self::new(source_url, fields.split(','), content_type)
    }
}

/// Canonical output of the Normalizer.
///
/// List-shaped content types always produce [`NormalizedRecord::List`],
/// singleton types always produce [`NormalizedRecord::Single`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedRecord {
    List(Vec<Record>),
    Single(Record),
}

impl NormalizedRecord {
    /// The canonical empty value for a content type: `[]` or `{}`.
    pub fn empty(content_type: ContentType) -> Self {
        match content_type.shape() {
            Shape::List => Self::List(Vec::new()),
            Shape::Object => Self::Single(Map::new()),
        }
    }

    /// Number of records (a singleton counts as one unless it is empty).
    pub fn len(&self) -> usize {
        match self {
            Self::List(items) => items.len(),
            Self::Single(map) => usize::from(!map.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_list(&self) -> Option<&[Record]> {
        match self {
            Self::List(items) => Some(items),
            Self::Single(_) => None,
        }
    }

    pub fn as_single(&self) -> Option<&Record> {
        match self {
            Self::Single(map) => Some(map),
            Self::List(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::List(items) => Value::Array(items.iter().cloned().map(Value::Object).collect()),
            Self::Single(map) => Value::Object(map.clone()),
        }
    }
}

/// Terminal artifact of one extraction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(rename = "url")]
    pub source_url: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
    pub data: NormalizedRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    /// A failed result: zero usage and the canonical empty data shape.
    pub fn failed(source_url: impl Into<String>, content_type: ContentType, error: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            input_tokens: 0,
            output_tokens: 0,
            cost: 0.0,
            data: NormalizedRecord::empty(content_type),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Previously extracted data for one website, used as conversational context.
///
/// Deserialization is lenient: each section goes through the Normalizer, so
/// a single object where a list is expected (or the reverse) still loads and
/// missing sections default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct WebsiteData {
    pub products: Vec<Record>,
    pub contact: Record,
    pub about: Record,
    pub faq: Vec<Record>,
    pub policies: Vec<Record>,
}

impl WebsiteData {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
            && self.contact.is_empty()
            && self.about.is_empty()
            && self.faq.is_empty()
            && self.policies.is_empty()
    }
}

impl From<Value> for WebsiteData {
    fn from(value: Value) -> Self {
        let section = |key: &str, content_type: ContentType| match value.get(key) {
            Some(Value::String(text)) if !text.trim().is_empty() && content_type.shape() == Shape::Object => {
                let mut map = Map::new();
                map.insert("content".to_string(), Value::String(text.clone()));
                NormalizedRecord::Single(map)
            }
            Some(v) => normalize(v, content_type),
            None => NormalizedRecord::empty(content_type),
        };

        let list = |record: NormalizedRecord| match record {
            NormalizedRecord::List(items) => items,
            NormalizedRecord::Single(map) => vec![map],
        };
        let single = |record: NormalizedRecord| match record {
            NormalizedRecord::Single(map) => map,
            NormalizedRecord::List(items) => items.into_iter().next().unwrap_or_default(),
        };

        Self {
            products: list(section("products", ContentType::Products)),
            contact: single(section("contact", ContentType::Contact)),
            about: single(section("about", ContentType::About)),
            faq: list(section("faq", ContentType::Faq)),
            policies: list(section("policies", ContentType::Policies)),
        }
    }
}

/// Result of a conversational request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatReply {
    pub fn answered(response: impl Into<String>) -> Self {
        Self { response: response.into(), error: None }
    }

    pub fn failed(error: impl Into<String>, response: impl Into<String>) -> Self {
        Self { response: response.into(), error: Some(error.into()) }
    }
}
