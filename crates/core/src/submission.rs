//! The submission payload handed to persistence.
//!
//! This is the only externally visible contract tying the engine's output to storage. Answers
//! map one-to-one from the session's answer map; a checkbox answer reports its first selected
//! option as `optionId` and the full selection as `optionIds`.

use crate::session::{Answer, FormSession, OptionInputKey, TimeUnit};
use intake_types::{NonEmptyText, OptionId, QuestionId, SymptomId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub option_id: Option<OptionId>,
    pub text_value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub option_ids: Vec<OptionId>,
}

impl SubmittedAnswer {
    pub fn from_answer(question_id: QuestionId, answer: &Answer) -> Self {
        match answer {
            Answer::Single {
                option_id,
                text_value,
                ..
            } => Self {
                question_id,
                option_id: *option_id,
                text_value: NonEmptyText::from_optional(text_value.as_deref())
                    .map(NonEmptyText::into_inner),
                option_ids: Vec::new(),
            },
            Answer::Multi { option_ids } => Self {
                question_id,
                option_id: answer.option_id(),
                text_value: None,
                option_ids: option_ids.iter().copied().collect(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub symptom_id: SymptomId,
    pub answers: Vec<SubmittedAnswer>,
    pub summary_text: NonEmptyText,
    #[serde(default)]
    pub time_units: BTreeMap<QuestionId, TimeUnit>,
    #[serde(default)]
    pub other_texts: BTreeMap<QuestionId, String>,
    #[serde(default)]
    pub option_inputs: BTreeMap<OptionInputKey, String>,
}

impl SubmissionPayload {
    /// Build the payload from a pruned session and its summary.
    pub fn from_session(
        symptom_id: SymptomId,
        session: &FormSession,
        summary_text: NonEmptyText,
    ) -> Self {
        Self {
            symptom_id,
            answers: session
                .answers()
                .iter()
                .map(|(&question_id, answer)| SubmittedAnswer::from_answer(question_id, answer))
                .collect(),
            summary_text,
            time_units: session.time_units().clone(),
            other_texts: session.other_texts().clone(),
            option_inputs: session.option_inputs().clone(),
        }
    }
}
