//! Template values
//!
//! A template is markup text or a structured value. Structured values are
//! rendered through their JSON text so data-only literals still produce a
//! node instead of failing.

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

/// Input accepted by the tree builder
#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    /// Markup text, possibly multi-line and indented
    Markup(String),
    /// Structured value, serialized to JSON before parsing
    Data(Value),
}

impl Template {
    /// Blank template (builds the default empty container)
    pub fn empty() -> Self {
        Self::Markup(String::new())
    }

    /// Text handed to the parser
    pub fn source(&self) -> Cow<'_, str> {
        match self {
            Self::Markup(markup) => Cow::Borrowed(markup),
            Self::Data(Value::String(s)) => Cow::Borrowed(s),
            Self::Data(value) => Cow::Owned(value.to_string()),
        }
    }

    /// Whether the template contains nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.source().trim().is_empty()
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source())
    }
}

impl From<&str> for Template {
    fn from(markup: &str) -> Self {
        Self::Markup(markup.to_string())
    }
}

impl From<String> for Template {
    fn from(markup: String) -> Self {
        Self::Markup(markup)
    }
}

impl From<&String> for Template {
    fn from(markup: &String) -> Self {
        Self::Markup(markup.clone())
    }
}

impl From<Value> for Template {
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}
