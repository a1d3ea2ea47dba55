//! Trigger values gating a child question.
//!
//! The canonical representation is a list of strings and that is what gets written back.
//! Stored definitions have historically used several encodings, so reading is lenient:
//!
//! | stored form                     | interpretation                       |
//! |---------------------------------|--------------------------------------|
//! | `["a", "b"]`                    | canonical list                       |
//! | `"[\"a\",\"b\"]"`               | JSON list inside a string            |
//! | `"\"[\\\"a\\\"]\""`             | doubly encoded list (legacy writers) |
//! | `"a, b"`                        | comma-separated text                 |
//! | `[1, true]`                     | scalars stringified                  |
//! | anything else                   | empty, with a warning                |
//!
//! None of these fail, so one bad admin entry cannot prevent a form from loading.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConditionalValues(Vec<String>);

impl ConditionalValues {
    /// Build from raw values, trimming each, dropping blanks and duplicates.
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for value in values {
            let value = value.as_ref().trim();
            if !value.is_empty() && !out.iter().any(|v| v == value) {
                out.push(value.to_string());
            }
        }
        Self(out)
    }

    /// Interpret a legacy string-encoded value.
    pub fn parse_lenient(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::default();
        }

        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::Array(items)) => Self::from_json_items(items),
            Ok(serde_json::Value::String(inner)) => {
                tracing::warn!(
                    "conditional values are doubly encoded; rewrite the definition as a plain list"
                );
                match serde_json::from_str::<serde_json::Value>(&inner) {
                    Ok(serde_json::Value::Array(items)) => Self::from_json_items(items),
                    _ => Self::from_comma_separated(&inner),
                }
            }
            _ => Self::from_comma_separated(trimmed),
        }
    }

    fn from_comma_separated(text: &str) -> Self {
        Self::new(text.split(','))
    }

    fn from_json_items(items: Vec<serde_json::Value>) -> Self {
        Self::new(items.into_iter().filter_map(|item| match item {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ConditionalValues {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            List(Vec<serde_json::Value>),
            Other(serde::de::IgnoredAny),
        }

        Ok(match Option::<Wire>::deserialize(deserializer)? {
            None => Self::default(),
            Some(Wire::Text(text)) => Self::parse_lenient(&text),
            Some(Wire::List(items)) => Self::from_json_items(items),
            Some(Wire::Other(_)) => {
                tracing::warn!("ignoring conditional values that are neither a list nor text");
                Self::default()
            }
        })
    }
}
