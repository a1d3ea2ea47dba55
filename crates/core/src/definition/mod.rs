//! Admin-authored symptom definitions.
//!
//! These are the read-only inputs of the engine: a [`Symptom`] with its questions, options and
//! text templates. Field names on the wire are camelCase to match the definition files and the
//! form UI.
//!
//! A form is always built from the *active projection* of a symptom (see [`Symptom::active`]),
//! which drops inactive entries and orders everything by `(order, id)`.

mod conditional;

pub use conditional::ConditionalValues;

use intake_types::{NonEmptyText, OptionId, QuestionId, SymptomId, TemplateId};
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_true() -> bool {
    true
}

/// The input widget a question is answered with.
///
/// Unrecognised type strings are kept as [`QuestionType::Unsupported`] rather than rejected, so
/// one bad question does not prevent the rest of the form from loading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    Radio,
    Checkbox,
    Select,
    Text,
    Textarea,
    Number,
    Unsupported(String),
}

impl QuestionType {
    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::Radio => "radio",
            QuestionType::Checkbox => "checkbox",
            QuestionType::Select => "select",
            QuestionType::Text => "text",
            QuestionType::Textarea => "textarea",
            QuestionType::Number => "number",
            QuestionType::Unsupported(other) => other,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, QuestionType::Unsupported(_))
    }

    /// Radio and select questions: one option chosen at a time.
    pub fn is_single_choice(&self) -> bool {
        matches!(self, QuestionType::Radio | QuestionType::Select)
    }

    pub fn is_multi_choice(&self) -> bool {
        matches!(self, QuestionType::Checkbox)
    }

    /// Text, textarea and number questions: answered with typed text.
    pub fn is_free_text(&self) -> bool {
        matches!(
            self,
            QuestionType::Text | QuestionType::Textarea | QuestionType::Number
        )
    }
}

impl From<String> for QuestionType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "radio" => QuestionType::Radio,
            "checkbox" => QuestionType::Checkbox,
            "select" => QuestionType::Select,
            "text" => QuestionType::Text,
            "textarea" => QuestionType::Textarea,
            "number" => QuestionType::Number,
            _ => QuestionType::Unsupported(value),
        }
    }
}

impl From<QuestionType> for String {
    fn from(value: QuestionType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub id: OptionId,
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub has_input: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_general: bool,
    #[serde(default, rename = "isCC")]
    pub is_cc: bool,
    #[serde(default)]
    pub has_time_unit: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_question_id: Option<QuestionId>,
    #[serde(default, skip_serializing_if = "ConditionalValues::is_empty")]
    pub conditional_values: ConditionalValues,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
}

impl Question {
    pub fn option(&self, id: OptionId) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == id)
    }

    /// Root candidates are shown without consulting any other answer.
    pub fn is_root(&self) -> bool {
        self.parent_question_id.is_none() || self.is_general
    }

    /// Time units only apply to numeric questions that opted in.
    pub fn accepts_time_unit(&self) -> bool {
        self.has_time_unit && self.kind == QuestionType::Number
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextTemplate {
    pub id: TemplateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<QuestionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_value: Option<String>,
    pub template: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// How a template decides whether it contributes to the summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trigger<'a> {
    /// Any non-empty answer to the question.
    AnyValue(QuestionId),
    /// The question's raw answer value equals the trigger value.
    Exact(QuestionId, &'a str),
    /// Static text, always included.
    Unconditional,
    /// A trigger value without a question; never included.
    Orphaned,
}

impl TextTemplate {
    pub fn trigger(&self) -> Trigger<'_> {
        let trigger_value = self.trigger_value.as_deref().filter(|v| !v.is_empty());
        match (self.question_id, trigger_value) {
            (Some(question_id), None) => Trigger::AnyValue(question_id),
            (Some(question_id), Some(value)) => Trigger::Exact(question_id, value),
            (None, None) => Trigger::Unconditional,
            (None, Some(_)) => Trigger::Orphaned,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symptom {
    pub id: SymptomId,
    pub name: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub text_templates: Vec<TextTemplate>,
}

impl Symptom {
    /// Returns the projection seen by end users: inactive questions, options and templates
    /// removed, everything sorted by `(order, id)`.
    pub fn active(&self) -> Symptom {
        let mut questions: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| q.is_active)
            .cloned()
            .map(|mut q| {
                q.options.retain(|o| o.is_active);
                q.options.sort_by_key(|o| (o.order, o.id));
                q
            })
            .collect();
        questions.sort_by_key(|q| (q.order, q.id));

        let mut text_templates: Vec<TextTemplate> = self
            .text_templates
            .iter()
            .filter(|t| t.is_active)
            .cloned()
            .collect();
        text_templates.sort_by_key(|t| (t.order, t.id));

        Symptom {
            questions,
            text_templates,
            ..self.clone()
        }
    }
}
