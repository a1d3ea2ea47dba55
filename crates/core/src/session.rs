//! Per-session answer state.
//!
//! A [`FormSession`] is the whole mutable state of one user filling in one form: the answers
//! plus the auxiliary "other" texts, option inputs and time units. It is a plain value passed
//! explicitly through the pipeline; nothing in the engine keeps state between calls.
//!
//! Raw user input arrives as [`AnswerEvent`]s and is resolved into the tagged [`Answer`] union
//! once, in [`FormSession::apply`], against the question graph.

use crate::definition::{Question, QuestionType};
use crate::graph::QuestionGraph;
use crate::{IntakeError, IntakeResult};
use intake_types::{NonEmptyText, OptionId, QuestionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
}

impl FromStr for TimeUnit {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "minutes" => Ok(TimeUnit::Minutes),
            "hours" => Ok(TimeUnit::Hours),
            "days" => Ok(TimeUnit::Days),
            "weeks" => Ok(TimeUnit::Weeks),
            "months" => Ok(TimeUnit::Months),
            other => Err(IntakeError::InvalidInput(format!(
                "unknown time unit '{other}'"
            ))),
        }
    }
}

/// The answer to one question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Answer {
    /// Radio/select choice or typed text.
    #[serde(rename_all = "camelCase")]
    Single {
        /// The chosen option's `value`, or the typed text.
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        option_id: Option<OptionId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text_value: Option<String>,
    },
    /// Checkbox selection.
    #[serde(rename_all = "camelCase")]
    Multi { option_ids: BTreeSet<OptionId> },
}

impl Answer {
    pub fn choice(value: impl Into<String>, option_id: OptionId) -> Self {
        Answer::Single {
            value: value.into(),
            option_id: Some(option_id),
            text_value: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Answer::Single {
            value: text.clone(),
            option_id: None,
            text_value: Some(text),
        }
    }

    pub fn multi(option_ids: impl IntoIterator<Item = OptionId>) -> Self {
        Answer::Multi {
            option_ids: option_ids.into_iter().collect(),
        }
    }

    /// The raw stored value of a single answer; multi answers have none.
    pub fn single_value(&self) -> Option<&str> {
        match self {
            Answer::Single { value, .. } => Some(value),
            Answer::Multi { .. } => None,
        }
    }

    pub fn option_id(&self) -> Option<OptionId> {
        match self {
            Answer::Single { option_id, .. } => *option_id,
            Answer::Multi { option_ids } => option_ids.iter().next().copied(),
        }
    }

    /// The text shown for `{value}` of a single answer: the typed text when present, otherwise
    /// the stored value. Blank input yields `None`.
    pub fn display_text(&self) -> Option<NonEmptyText> {
        match self {
            Answer::Single {
                value, text_value, ..
            } => NonEmptyText::from_optional(text_value.as_deref())
                .or_else(|| NonEmptyText::from_optional(Some(value))),
            Answer::Multi { .. } => None,
        }
    }

    /// True when the answer carries anything non-blank.
    pub fn has_content(&self) -> bool {
        match self {
            Answer::Single { .. } => self.display_text().is_some(),
            Answer::Multi { option_ids } => !option_ids.is_empty(),
        }
    }

    /// True when the answer satisfies a required question: a chosen option, non-blank typed
    /// text, or at least one checked box.
    pub fn is_answered(&self) -> bool {
        match self {
            Answer::Single {
                option_id,
                text_value,
                ..
            } => {
                option_id.is_some()
                    || NonEmptyText::from_optional(text_value.as_deref()).is_some()
            }
            Answer::Multi { option_ids } => !option_ids.is_empty(),
        }
    }
}

/// Key of an option's companion input: `"{questionId}-{optionId}"` on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OptionInputKey {
    pub question_id: QuestionId,
    pub option_id: OptionId,
}

impl OptionInputKey {
    pub fn new(question_id: QuestionId, option_id: OptionId) -> Self {
        Self {
            question_id,
            option_id,
        }
    }
}

impl fmt::Display for OptionInputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.question_id, self.option_id)
    }
}

impl FromStr for OptionInputKey {
    type Err = IntakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            IntakeError::InvalidInput(format!(
                "option input key must look like '<questionId>-<optionId>', got '{s}'"
            ))
        };
        // Skip the first character so a negative question id keeps its sign.
        let split = s
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '-')
            .map(|(i, _)| i)
            .ok_or_else(invalid)?;
        let (question, option) = (&s[..split], &s[split + 1..]);
        Ok(Self {
            question_id: question.parse().map_err(|_| invalid())?,
            option_id: option.parse().map_err(|_| invalid())?,
        })
    }
}

impl Serialize for OptionInputKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OptionInputKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A discrete user input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnswerEvent {
    /// Choose one option of a radio or select question.
    #[serde(rename_all = "camelCase")]
    SelectOption {
        question_id: QuestionId,
        option_id: OptionId,
    },
    /// Check or uncheck one option of a checkbox question.
    #[serde(rename_all = "camelCase")]
    ToggleOption {
        question_id: QuestionId,
        option_id: OptionId,
        checked: bool,
    },
    /// Type into a text, textarea or number question.
    #[serde(rename_all = "camelCase")]
    EnterText { question_id: QuestionId, text: String },
    /// Type the free text of an "other" option.
    #[serde(rename_all = "camelCase")]
    EnterOtherText { question_id: QuestionId, text: String },
    /// Type into the companion field of an option with `hasInput`.
    #[serde(rename_all = "camelCase")]
    EnterOptionInput {
        question_id: QuestionId,
        option_id: OptionId,
        text: String,
    },
    /// Pick (or clear) the unit of a number question with `hasTimeUnit`.
    #[serde(rename_all = "camelCase")]
    ChooseTimeUnit {
        question_id: QuestionId,
        #[serde(default)]
        unit: Option<TimeUnit>,
    },
    #[serde(rename_all = "camelCase")]
    ClearAnswer { question_id: QuestionId },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSession {
    #[serde(default)]
    answers: BTreeMap<QuestionId, Answer>,
    #[serde(default)]
    other_texts: BTreeMap<QuestionId, String>,
    #[serde(default)]
    option_inputs: BTreeMap<OptionInputKey, String>,
    #[serde(default)]
    time_units: BTreeMap<QuestionId, TimeUnit>,
}

impl FormSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answers(&self) -> &BTreeMap<QuestionId, Answer> {
        &self.answers
    }

    pub fn answer(&self, question_id: QuestionId) -> Option<&Answer> {
        self.answers.get(&question_id)
    }

    pub fn other_texts(&self) -> &BTreeMap<QuestionId, String> {
        &self.other_texts
    }

    /// The trimmed "other" text of a question, if any non-blank text was entered.
    pub fn other_text(&self, question_id: QuestionId) -> Option<&str> {
        self.other_texts
            .get(&question_id)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn option_inputs(&self) -> &BTreeMap<OptionInputKey, String> {
        &self.option_inputs
    }

    /// The trimmed companion input of an option, if any non-blank text was entered.
    pub fn option_input(&self, question_id: QuestionId, option_id: OptionId) -> Option<&str> {
        self.option_inputs
            .get(&OptionInputKey::new(question_id, option_id))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn time_units(&self) -> &BTreeMap<QuestionId, TimeUnit> {
        &self.time_units
    }

    pub fn time_unit(&self, question_id: QuestionId) -> Option<TimeUnit> {
        self.time_units.get(&question_id).copied()
    }

    pub fn set_answer(&mut self, question_id: QuestionId, answer: Answer) {
        self.answers.insert(question_id, answer);
    }

    pub fn remove_answer(&mut self, question_id: QuestionId) -> Option<Answer> {
        self.answers.remove(&question_id)
    }

    pub fn set_other_text(&mut self, question_id: QuestionId, text: impl Into<String>) {
        self.other_texts.insert(question_id, text.into());
    }

    pub fn set_option_input(
        &mut self,
        question_id: QuestionId,
        option_id: OptionId,
        text: impl Into<String>,
    ) {
        self.option_inputs
            .insert(OptionInputKey::new(question_id, option_id), text.into());
    }

    pub fn set_time_unit(&mut self, question_id: QuestionId, unit: TimeUnit) {
        self.time_units.insert(question_id, unit);
    }

    /// Drop every answer and auxiliary entry whose question is not in `keep`.
    ///
    /// # Returns
    ///
    /// The ids of the questions whose answers were removed.
    pub fn retain_questions(&mut self, keep: &BTreeSet<QuestionId>) -> Vec<QuestionId> {
        let removed: Vec<QuestionId> = self
            .answers
            .keys()
            .filter(|id| !keep.contains(id))
            .copied()
            .collect();
        for id in &removed {
            self.answers.remove(id);
        }

        self.other_texts.retain(|id, _| keep.contains(id));
        self.time_units.retain(|id, _| keep.contains(id));
        self.option_inputs
            .retain(|key, _| keep.contains(&key.question_id));

        removed
    }

    /// Resolve one user input against the question graph and record it.
    ///
    /// Blank text removes the corresponding entry instead of storing whitespace.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`IntakeError::UnknownQuestion`] / [`IntakeError::UnknownOption`] for ids outside the
    ///   form,
    /// - [`IntakeError::AnswerTypeMismatch`] when the event does not fit the question type,
    /// - [`IntakeError::InvalidInput`] for non-numeric input to a number question.
    pub fn apply(&mut self, graph: &QuestionGraph, event: AnswerEvent) -> IntakeResult<()> {
        match event {
            AnswerEvent::SelectOption {
                question_id,
                option_id,
            } => {
                let question = lookup(graph, question_id)?;
                if !question.kind.is_single_choice() {
                    return Err(mismatch(question_id, "single choice"));
                }
                let option = question.option(option_id).ok_or(IntakeError::UnknownOption {
                    question_id,
                    option_id,
                })?;
                self.answers
                    .insert(question_id, Answer::choice(option.value.clone(), option_id));
            }
            AnswerEvent::ToggleOption {
                question_id,
                option_id,
                checked,
            } => {
                let question = lookup(graph, question_id)?;
                if !question.kind.is_multi_choice() {
                    return Err(mismatch(question_id, "checkbox"));
                }
                if question.option(option_id).is_none() {
                    return Err(IntakeError::UnknownOption {
                        question_id,
                        option_id,
                    });
                }

                let mut selected = match self.answers.remove(&question_id) {
                    Some(Answer::Multi { option_ids }) => option_ids,
                    _ => BTreeSet::new(),
                };
                if checked {
                    selected.insert(option_id);
                } else {
                    selected.remove(&option_id);
                }
                if !selected.is_empty() {
                    self.answers.insert(
                        question_id,
                        Answer::Multi {
                            option_ids: selected,
                        },
                    );
                }
            }
            AnswerEvent::EnterText { question_id, text } => {
                let question = lookup(graph, question_id)?;
                if !question.kind.is_free_text() {
                    return Err(mismatch(question_id, "text"));
                }
                if text.trim().is_empty() {
                    self.answers.remove(&question_id);
                    return Ok(());
                }
                if question.kind == QuestionType::Number
                    && !text.trim().parse::<f64>().is_ok_and(f64::is_finite)
                {
                    return Err(IntakeError::InvalidInput(format!(
                        "question {question_id} expects a number, got '{}'",
                        text.trim()
                    )));
                }
                self.answers.insert(question_id, Answer::text(text));
            }
            AnswerEvent::EnterOtherText { question_id, text } => {
                let question = lookup(graph, question_id)?;
                if !(question.kind.is_single_choice() || question.kind.is_multi_choice()) {
                    return Err(mismatch(question_id, "other text"));
                }
                if text.trim().is_empty() {
                    self.other_texts.remove(&question_id);
                } else {
                    self.other_texts.insert(question_id, text);
                }
            }
            AnswerEvent::EnterOptionInput {
                question_id,
                option_id,
                text,
            } => {
                let question = lookup(graph, question_id)?;
                let option = question.option(option_id).ok_or(IntakeError::UnknownOption {
                    question_id,
                    option_id,
                })?;
                if !option.has_input {
                    return Err(mismatch(question_id, "option input"));
                }
                let key = OptionInputKey::new(question_id, option_id);
                if text.trim().is_empty() {
                    self.option_inputs.remove(&key);
                } else {
                    self.option_inputs.insert(key, text);
                }
            }
            AnswerEvent::ChooseTimeUnit { question_id, unit } => {
                let question = lookup(graph, question_id)?;
                if !question.accepts_time_unit() {
                    return Err(mismatch(question_id, "time unit"));
                }
                match unit {
                    Some(unit) => {
                        self.time_units.insert(question_id, unit);
                    }
                    None => {
                        self.time_units.remove(&question_id);
                    }
                }
            }
            AnswerEvent::ClearAnswer { question_id } => {
                lookup(graph, question_id)?;
                self.answers.remove(&question_id);
            }
        }

        Ok(())
    }
}

fn lookup(graph: &QuestionGraph, question_id: QuestionId) -> IntakeResult<&Question> {
    graph
        .question(question_id)
        .ok_or(IntakeError::UnknownQuestion(question_id))
}

fn mismatch(question_id: QuestionId, event: &'static str) -> IntakeError {
    IntakeError::AnswerTypeMismatch { question_id, event }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::QuestionType;
    use crate::test_support::{choice, number, text};

    fn graph() -> QuestionGraph {
        let mut allergy = choice(
            3,
            QuestionType::Checkbox,
            &[(30, "Penicillin", "penicillin"), (31, "Other", "other")],
        );
        allergy.options[1].has_input = true;
        QuestionGraph::new(vec![
            choice(
                1,
                QuestionType::Radio,
                &[(10, "Has fever", "has_fever"), (11, "No fever", "no_fever")],
            ),
            number(2).with_time_unit(),
            allergy,
            text(4),
        ])
    }

    #[test]
    fn select_option_stores_option_value() {
        let mut session = FormSession::new();
        session
            .apply(
                &graph(),
                AnswerEvent::SelectOption {
                    question_id: QuestionId(1),
                    option_id: OptionId(10),
                },
            )
            .expect("valid selection");

        assert_eq!(
            session.answer(QuestionId(1)),
            Some(&Answer::choice("has_fever", OptionId(10)))
        );
    }

    #[test]
    fn select_rejects_foreign_option_and_wrong_type() {
        let mut session = FormSession::new();
        let err = session
            .apply(
                &graph(),
                AnswerEvent::SelectOption {
                    question_id: QuestionId(1),
                    option_id: OptionId(30),
                },
            )
            .expect_err("option belongs to another question");
        assert!(matches!(err, IntakeError::UnknownOption { .. }));

        let err = session
            .apply(
                &graph(),
                AnswerEvent::SelectOption {
                    question_id: QuestionId(3),
                    option_id: OptionId(30),
                },
            )
            .expect_err("checkbox is not single choice");
        assert!(matches!(err, IntakeError::AnswerTypeMismatch { .. }));

        let err = session
            .apply(&graph(), AnswerEvent::ClearAnswer { question_id: QuestionId(99) })
            .expect_err("unknown question");
        assert!(matches!(err, IntakeError::UnknownQuestion(QuestionId(99))));
    }

    #[test]
    fn toggling_builds_and_empties_a_selection() {
        let graph = graph();
        let mut session = FormSession::new();
        for option_id in [31, 30] {
            session
                .apply(
                    &graph,
                    AnswerEvent::ToggleOption {
                        question_id: QuestionId(3),
                        option_id: OptionId(option_id),
                        checked: true,
                    },
                )
                .unwrap();
        }
        assert_eq!(
            session.answer(QuestionId(3)),
            Some(&Answer::multi([OptionId(30), OptionId(31)]))
        );
        assert_eq!(session.answer(QuestionId(3)).unwrap().option_id(), Some(OptionId(30)));

        for option_id in [30, 31] {
            session
                .apply(
                    &graph,
                    AnswerEvent::ToggleOption {
                        question_id: QuestionId(3),
                        option_id: OptionId(option_id),
                        checked: false,
                    },
                )
                .unwrap();
        }
        assert!(session.answer(QuestionId(3)).is_none());
    }

    #[test]
    fn text_input_is_validated_and_blank_clears() {
        let graph = graph();
        let mut session = FormSession::new();

        session
            .apply(&graph, AnswerEvent::EnterText { question_id: QuestionId(2), text: "3".into() })
            .unwrap();
        assert_eq!(session.answer(QuestionId(2)), Some(&Answer::text("3")));

        let err = session
            .apply(
                &graph,
                AnswerEvent::EnterText { question_id: QuestionId(2), text: "three".into() },
            )
            .expect_err("not a number");
        assert!(matches!(err, IntakeError::InvalidInput(msg) if msg.contains("expects a number")));

        for text in ["inf", "-Infinity", "NaN"] {
            let err = session
                .apply(
                    &graph,
                    AnswerEvent::EnterText { question_id: QuestionId(2), text: text.into() },
                )
                .expect_err("non-finite numbers are rejected");
            assert!(matches!(err, IntakeError::InvalidInput(_)));
        }
        assert_eq!(session.answer(QuestionId(2)), Some(&Answer::text("3")));

        session
            .apply(
                &graph,
                AnswerEvent::EnterText { question_id: QuestionId(2), text: "   ".into() },
            )
            .unwrap();
        assert!(session.answer(QuestionId(2)).is_none());
    }

    #[test]
    fn auxiliary_inputs_respect_question_shape() {
        let graph = graph();
        let mut session = FormSession::new();

        session
            .apply(
                &graph,
                AnswerEvent::ChooseTimeUnit {
                    question_id: QuestionId(2),
                    unit: Some(TimeUnit::Days),
                },
            )
            .unwrap();
        assert_eq!(session.time_unit(QuestionId(2)), Some(TimeUnit::Days));

        let err = session
            .apply(
                &graph,
                AnswerEvent::ChooseTimeUnit {
                    question_id: QuestionId(4),
                    unit: Some(TimeUnit::Days),
                },
            )
            .expect_err("text question has no unit");
        assert!(matches!(err, IntakeError::AnswerTypeMismatch { event: "time unit", .. }));

        session
            .apply(
                &graph,
                AnswerEvent::EnterOptionInput {
                    question_id: QuestionId(3),
                    option_id: OptionId(31),
                    text: " latex ".into(),
                },
            )
            .unwrap();
        assert_eq!(session.option_input(QuestionId(3), OptionId(31)), Some("latex"));

        let err = session
            .apply(
                &graph,
                AnswerEvent::EnterOptionInput {
                    question_id: QuestionId(3),
                    option_id: OptionId(30),
                    text: "x".into(),
                },
            )
            .expect_err("option has no input");
        assert!(matches!(err, IntakeError::AnswerTypeMismatch { event: "option input", .. }));

        session
            .apply(
                &graph,
                AnswerEvent::EnterOtherText { question_id: QuestionId(3), text: "dust".into() },
            )
            .unwrap();
        assert_eq!(session.other_text(QuestionId(3)), Some("dust"));
    }

    #[test]
    fn retain_questions_drops_every_trace() {
        let mut session = FormSession::new();
        session.set_answer(QuestionId(1), Answer::choice("has_fever", OptionId(10)));
        session.set_answer(QuestionId(3), Answer::multi([OptionId(31)]));
        session.set_other_text(QuestionId(3), "dust");
        session.set_option_input(QuestionId(3), OptionId(31), "latex");
        session.set_time_unit(QuestionId(2), TimeUnit::Days);

        let keep: BTreeSet<_> = [QuestionId(1)].into_iter().collect();
        let removed = session.retain_questions(&keep);

        assert_eq!(removed, vec![QuestionId(3)]);
        assert_eq!(session.answers().len(), 1);
        assert!(session.other_texts().is_empty());
        assert!(session.option_inputs().is_empty());
        assert!(session.time_units().is_empty());
    }

    #[test]
    fn session_wire_format() {
        let json = r#"{
            "answers": {
                "1": {"kind": "single", "value": "has_fever", "optionId": 10},
                "3": {"kind": "multi", "optionIds": [31, 30]}
            },
            "otherTexts": {"3": "dust"},
            "optionInputs": {"3-31": "latex"},
            "timeUnits": {"2": "days"}
        }"#;
        let session: FormSession = serde_json::from_str(json).expect("valid session");

        assert_eq!(
            session.answer(QuestionId(3)),
            Some(&Answer::multi([OptionId(30), OptionId(31)]))
        );
        assert_eq!(session.option_input(QuestionId(3), OptionId(31)), Some("latex"));
        assert_eq!(session.time_unit(QuestionId(2)), Some(TimeUnit::Days));

        let back = serde_json::to_value(&session).unwrap();
        assert_eq!(back["optionInputs"]["3-31"], "latex");
        assert_eq!(back["answers"]["1"]["optionId"], 10);
    }

    #[test]
    fn option_input_key_rejects_garbage() {
        assert!("3-x".parse::<OptionInputKey>().is_err());
        assert!("31".parse::<OptionInputKey>().is_err());
        assert_eq!(
            "3-31".parse::<OptionInputKey>().unwrap(),
            OptionInputKey::new(QuestionId(3), OptionId(31))
        );
        assert!("-35".parse::<OptionInputKey>().is_err());
    }

    #[test]
    fn option_input_key_round_trips_negative_ids() {
        let key = OptionInputKey::new(QuestionId(-3), OptionId(5));
        assert_eq!(key.to_string(), "-3-5");
        assert_eq!(key.to_string().parse::<OptionInputKey>().unwrap(), key);

        let key = OptionInputKey::new(QuestionId(-3), OptionId(-5));
        assert_eq!(key.to_string().parse::<OptionInputKey>().unwrap(), key);

        let mut session = FormSession::new();
        session.set_option_input(QuestionId(-3), OptionId(5), "x");
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains(r#""-3-5":"x""#));
        let back: FormSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn answer_content_rules() {
        assert!(!Answer::text("   ").has_content());
        assert!(!Answer::text("   ").is_answered());
        assert!(Answer::text(" x ").has_content());
        assert!(Answer::choice("a", OptionId(1)).is_answered());
        assert!(!Answer::multi([]).has_content());
        assert_eq!(
            Answer::Single { value: "v".into(), option_id: None, text_value: Some(" ".into()) }
                .display_text()
                .map(NonEmptyText::into_inner),
            Some("v".to_string())
        );
    }
}
