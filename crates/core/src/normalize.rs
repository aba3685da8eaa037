//! Shape normalization and cleaning of recovered values.
//!
//! A recovered value can arrive in several legal forms. [`RecoveredShape`]
//! names each of them so [`normalize`] can map every form onto the content
//! type's canonical shape with an exhaustive match.

use serde_json::{Map, Value};

use crate::content_type::{ContentType, Shape};
use crate::record::{NormalizedRecord, Record};
use crate::text::collapse_whitespace;

/// Every form a recovered value may take, decoded for one content type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecoveredShape<'a> {
    /// A mapping wrapping the record list under a listing key, such as
    /// `{"listings": [...]}`. Only decoded for list-shaped content types.
    Listing(&'a [Value]),
    /// A bare sequence.
    Sequence(&'a [Value]),
    /// A single mapping.
    Mapping(&'a Map<String, Value>),
    /// Anything else: strings, numbers, booleans, null.
    Scalar(&'a Value),
}

impl<'a> RecoveredShape<'a> {
    pub fn decode(value: &'a Value, content_type: ContentType) -> Self {
        match value {
            Value::Array(items) => Self::Sequence(items),
            Value::Object(map) => content_type
                .listing_keys()
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array))
                .map_or(Self::Mapping(map), |items| Self::Listing(items)),
            other => Self::Scalar(other),
        }
    }

    /// True when no canonical record can be derived from the value.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }
}

/// Reshapes and cleans a recovered value into the canonical record.
///
/// List types: a listing wrapper is unwrapped, a sequence is used directly
/// (non-mapping elements are dropped), a single mapping becomes a
/// one-element list and anything else yields `[]`. Singleton types: the
/// first mapping of a sequence is taken, a mapping is used directly and
/// anything else yields `{}`. Every string leaf is whitespace-collapsed.
///
/// Normalization never truncates; list caps are a presentation concern.
pub fn normalize(value: &Value, content_type: ContentType) -> NormalizedRecord {
    let decoded = RecoveredShape::decode(value, content_type);

    match content_type.shape() {
        Shape::List => NormalizedRecord::List(match decoded {
            RecoveredShape::Listing(items) | RecoveredShape::Sequence(items) => {
                items.iter().filter_map(Value::as_object).map(clean_record).collect()
            }
            RecoveredShape::Mapping(map) => vec![clean_record(map)],
            RecoveredShape::Scalar(_) => Vec::new(),
        }),
        Shape::Object => NormalizedRecord::Single(match decoded {
            RecoveredShape::Listing(items) | RecoveredShape::Sequence(items) => {
                items.iter().find_map(Value::as_object).map(clean_record).unwrap_or_default()
            }
            RecoveredShape::Mapping(map) => clean_record(map),
            RecoveredShape::Scalar(_) => Map::new(),
        }),
    }
}

/// Collapses whitespace in every string of a record, at any depth.
pub fn clean_record(record: &Record) -> Record {
    record.iter().map(|(k, v)| (k.clone(), clean_value(v))).collect()
}

/// Recursive whitespace cleaning; non-string leaves pass through unchanged.
pub fn clean_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(collapse_whitespace(s)),
        Value::Array(items) => Value::Array(items.iter().map(clean_value).collect()),
        Value::Object(map) => Value::Object(clean_record(map)),
        other => other.clone(),
    }
}
