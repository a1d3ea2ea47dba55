//! Small validated value types shared across the intake crates.
//!
//! - [`NonEmptyText`] for strings that must carry content (symptom names, summary text).
//! - Integer identifier newtypes for symptoms, questions, options and templates, so that a
//!   question id can never be passed where an option id is expected.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction, so a value
/// of this type never starts or ends with whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`], but maps blank or missing input to `None`.
    ///
    /// Free-text answers use this: an all-whitespace entry is treated as no entry at all.
    pub fn from_optional(input: Option<&str>) -> Option<Self> {
        input.and_then(|s| Self::new(s).ok())
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw integer identifier.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

integer_id!(
    /// Identifier of a symptom definition.
    SymptomId
);
integer_id!(
    /// Identifier of a question within a symptom.
    QuestionId
);
integer_id!(
    /// Identifier of an option within a question.
    OptionId
);
integer_id!(
    /// Identifier of a text template within a symptom.
    TemplateId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  fever  ").expect("should accept padded text");
        assert_eq!(text.as_str(), "fever");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert!(matches!(NonEmptyText::new(" \t\n"), Err(TextError::Empty)));
    }

    #[test]
    fn from_optional_maps_blank_to_none() {
        assert_eq!(NonEmptyText::from_optional(None), None);
        assert_eq!(NonEmptyText::from_optional(Some("   ")), None);
        assert_eq!(
            NonEmptyText::from_optional(Some(" 3 ")).map(NonEmptyText::into_inner),
            Some("3".to_string())
        );
    }

    #[test]
    fn non_empty_text_deserialize_rejects_blank() {
        let err = serde_json::from_str::<NonEmptyText>("\"  \"").expect_err("blank is invalid");
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&QuestionId(42)).expect("serialize");
        assert_eq!(json, "42");
        let parsed: OptionId = serde_json::from_str("7").expect("deserialize");
        assert_eq!(parsed, OptionId(7));
    }

    #[test]
    fn ids_parse_from_strings() {
        assert_eq!("12".parse::<SymptomId>().expect("parse"), SymptomId(12));
        assert!("abc".parse::<TemplateId>().is_err());
    }
}
