//! Template rendering.
//!
//! Rendering one template is a pure function of the template, the question graph, the (already
//! pruned) session and the phrasing. It never fails: anything that cannot be rendered becomes a
//! [`RenderOutcome::Skipped`] with the reason attached, so the caller can explain an absent
//! fragment without the summary ever showing garbled text.

use crate::constants::LIST_SEPARATOR;
use crate::definition::{Question, QuestionOption, TextTemplate, Trigger};
use crate::graph::QuestionGraph;
use crate::phrasing::Phrasing;
use crate::session::{Answer, FormSession};
use crate::template::{tokenize, Placeholder, Segment};
use intake_types::{OptionId, QuestionId};
use serde::Serialize;
use std::collections::BTreeSet;

/// Why a template contributed nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum SkipReason {
    /// The trigger condition is not met by the current answers.
    TriggerNotMet,
    /// The template or answer points at a question that is not part of the form.
    #[serde(rename_all = "camelCase")]
    MissingQuestion { question_id: QuestionId },
    /// The answer points at an option the question does not have.
    #[serde(rename_all = "camelCase")]
    MissingOption {
        question_id: QuestionId,
        option_id: OptionId,
    },
    /// Every selected label was filtered out.
    NoLabels,
    /// The chosen label contains a skip word.
    SkipWord { word: String },
    /// The rendered text is empty or whitespace.
    EmptyText,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(String),
    Skipped(SkipReason),
}

/// Everything a template can read from.
#[derive(Clone, Copy, Debug)]
pub struct RenderContext<'a> {
    pub graph: &'a QuestionGraph,
    pub session: &'a FormSession,
    pub phrasing: &'a Phrasing,
}

/// The answer a triggered template substitutes from.
struct Source<'a> {
    question_id: QuestionId,
    question: Option<&'a Question>,
    answer: &'a Answer,
}

impl<'a> RenderContext<'a> {
    pub fn new(graph: &'a QuestionGraph, session: &'a FormSession, phrasing: &'a Phrasing) -> Self {
        Self {
            graph,
            session,
            phrasing,
        }
    }

    /// Render one template.
    pub fn render(&self, template: &TextTemplate) -> RenderOutcome {
        match self.try_render(template) {
            Ok(text) => RenderOutcome::Rendered(text),
            Err(reason) => {
                tracing::trace!("template {} skipped: {:?}", template.id, reason);
                RenderOutcome::Skipped(reason)
            }
        }
    }

    fn try_render(&self, template: &TextTemplate) -> Result<String, SkipReason> {
        let source = match template.trigger() {
            Trigger::AnyValue(question_id) => {
                let answer = self
                    .session
                    .answer(question_id)
                    .filter(|a| a.has_content())
                    .ok_or(SkipReason::TriggerNotMet)?;
                Some(self.source(question_id, answer))
            }
            Trigger::Exact(question_id, expected) => {
                let answer = self
                    .session
                    .answer(question_id)
                    .filter(|a| a.single_value() == Some(expected))
                    .ok_or(SkipReason::TriggerNotMet)?;
                Some(self.source(question_id, answer))
            }
            Trigger::Unconditional => None,
            Trigger::Orphaned => return Err(SkipReason::TriggerNotMet),
        };

        let mut text = String::with_capacity(template.template.len());
        for segment in tokenize(&template.template) {
            match (segment, &source) {
                (Segment::Literal(literal), _) => text.push_str(literal),
                (Segment::Placeholder(Placeholder::Unknown(name)), _) => {
                    text.push('{');
                    text.push_str(&name);
                    text.push('}');
                }
                // Static templates have no answer to draw from.
                (Segment::Placeholder(placeholder), None) => {
                    text.push_str(&placeholder.to_string())
                }
                (Segment::Placeholder(placeholder), Some(source)) => {
                    text.push_str(&self.substitute(&placeholder, source)?)
                }
            }
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(SkipReason::EmptyText);
        }
        Ok(text.to_string())
    }

    fn source(&self, question_id: QuestionId, answer: &'a Answer) -> Source<'a> {
        Source {
            question_id,
            question: self.graph.question(question_id),
            answer,
        }
    }

    fn substitute(
        &self,
        placeholder: &Placeholder,
        source: &Source<'_>,
    ) -> Result<String, SkipReason> {
        match placeholder {
            Placeholder::Value => Ok(self.value_text(source)),
            Placeholder::Label => self.label_text(source),
            Placeholder::Input => Ok(self.input_text(source)),
            Placeholder::Unknown(name) => Ok(format!("{{{name}}}")),
        }
    }

    fn value_text(&self, source: &Source<'_>) -> String {
        let mut value = match source.answer {
            Answer::Single { .. } => source
                .answer
                .display_text()
                .map(|t| t.as_str().trim().to_string())
                .unwrap_or_default(),
            Answer::Multi { option_ids } => selected_options(source.question, option_ids)
                .map(|o| o.value.as_str())
                .collect::<Vec<_>>()
                .join(LIST_SEPARATOR),
        };

        let unit = source
            .question
            .filter(|q| q.accepts_time_unit())
            .and_then(|_| self.session.time_unit(source.question_id));
        if let Some(unit) = unit {
            value.push(' ');
            value.push_str(self.phrasing.time_unit_word(unit));
        }
        value
    }

    fn label_text(&self, source: &Source<'_>) -> Result<String, SkipReason> {
        let question = source.question.ok_or(SkipReason::MissingQuestion {
            question_id: source.question_id,
        })?;

        match source.answer {
            Answer::Multi { option_ids } => {
                let labels: Vec<&str> = selected_options(Some(question), option_ids)
                    .map(|o| self.option_label(question.id, o))
                    .filter(|label| self.phrasing.matching_skip_word(label).is_none())
                    .collect();
                if labels.is_empty() {
                    return Err(SkipReason::NoLabels);
                }
                Ok(labels.join(LIST_SEPARATOR))
            }
            Answer::Single {
                option_id: Some(option_id),
                ..
            } => {
                let option = question.option(*option_id).ok_or(SkipReason::MissingOption {
                    question_id: question.id,
                    option_id: *option_id,
                })?;
                let label = self.option_label(question.id, option);
                if let Some(word) = self.phrasing.matching_skip_word(label) {
                    return Err(SkipReason::SkipWord {
                        word: word.to_string(),
                    });
                }
                Ok(label.to_string())
            }
            Answer::Single { option_id: None, .. } => Ok(source
                .answer
                .display_text()
                .map(|t| t.as_str().trim().to_string())
                .unwrap_or_default()),
        }
    }

    /// An option's label, or the user's "other" text when the option is an "other" choice.
    fn option_label<'b>(&'b self, question_id: QuestionId, option: &'b QuestionOption) -> &'b str {
        if self.phrasing.is_other_label(&option.label) {
            if let Some(other) = self.session.other_text(question_id) {
                return other;
            }
        }
        option.label.as_str()
    }

    fn input_text(&self, source: &Source<'_>) -> String {
        let Some(question) = source.question else {
            return String::new();
        };

        match source.answer {
            Answer::Multi { option_ids } => selected_options(Some(question), option_ids)
                .filter(|o| o.has_input)
                .filter_map(|o| self.session.option_input(question.id, o.id))
                .collect::<Vec<_>>()
                .join(LIST_SEPARATOR),
            Answer::Single {
                option_id: Some(option_id),
                ..
            } => question
                .option(*option_id)
                .filter(|o| o.has_input)
                .and_then(|o| self.session.option_input(question.id, o.id))
                .unwrap_or_default()
                .to_string(),
            Answer::Single { option_id: None, .. } => String::new(),
        }
    }
}

/// Selected options in the question's option order; ids the question lacks are ignored.
fn selected_options<'q>(
    question: Option<&'q Question>,
    option_ids: &'q BTreeSet<OptionId>,
) -> impl Iterator<Item = &'q QuestionOption> + 'q {
    question
        .into_iter()
        .flat_map(|q| q.options.iter())
        .filter(move |o| option_ids.contains(&o.id))
}
