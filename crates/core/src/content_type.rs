//! Content types and their canonical shapes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of structured data being extracted from a page.
///
/// Parsing never fails: unknown tags (including the legacy `general`) map to
/// [`ContentType::Generic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Products,
    Contact,
    About,
    Faq,
    Policies,
    Generic,
}

/// Canonical output form of a content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A single mapping.
    Object,
    /// An ordered sequence of mappings.
    List,
}

impl ContentType {
    pub const ALL: [ContentType; 6] = [
        ContentType::Products,
        ContentType::Contact,
        ContentType::About,
        ContentType::Faq,
        ContentType::Policies,
        ContentType::Generic,
    ];

    /// The tag used on the command line and in the data bundle.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Contact => "contact",
            Self::About => "about",
            Self::Faq => "faq",
            Self::Policies => "policies",
            Self::Generic => "generic",
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Self::Products | Self::Faq | Self::Policies => Shape::List,
            Self::Contact | Self::About | Self::Generic => Shape::Object,
        }
    }

    /// Fields requested when the caller does not name any.
    pub fn default_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Products => &["name", "description", "price", "imageUrl", "availability", "category"],
            Self::Contact => &["email", "phone", "address", "hours", "socialMedia"],
            Self::About => &["companyName", "history", "mission", "team", "values"],
            Self::Faq => &["question", "answer", "category"],
            Self::Policies => &["title", "content", "lastUpdated"],
            Self::Generic => &["content"],
        }
    }

    /// Keys under which a model may nest the record list of a list type.
    pub fn listing_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Products => &["listings", "products"],
            Self::Faq => &["listings", "faq", "faqs"],
            Self::Policies => &["listings", "policies"],
            Self::Contact | Self::About | Self::Generic => &[],
        }
    }

    /// Vocabulary that marks prose as being about this content type.
    ///
    /// Matched case-insensitively against model output when no structured
    /// value could be recovered.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Products => &["price", "$", "€", "£", "buy", "sale", "in stock", "product"],
            Self::Contact => &["email", "phone", "@", "address", "contact"],
            Self::About => &["founded", "mission", "company", "team", "history"],
            Self::Faq => &["question", "answer", "faq", "?"],
            Self::Policies => &["policy", "terms", "privacy", "refund", "shipping"],
            Self::Generic => &[],
        }
    }
}

impl FromStr for ContentType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "products" | "product" => Self::Products,
            "contact" => Self::Contact,
            "about" => Self::About,
            "faq" | "faqs" => Self::Faq,
            "policies" | "policy" => Self::Policies,
            _ => Self::Generic,
        })
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
