//! The question graph of one symptom.
//!
//! Each question has at most one parent, so the graph is a forest when the definition is
//! sound. Definitions are authored by hand, though, and the graph tolerates duplicates,
//! dangling parents and cycles: they are reported by [`QuestionGraph::validate`] and the
//! resolver treats the affected questions as hidden.

use crate::definition::{Question, TextTemplate, Trigger};
use crate::template::{placeholders, Placeholder};
use intake_types::{OptionId, QuestionId, TemplateId};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Clone, Debug, Default)]
pub struct QuestionGraph {
    questions: Vec<Question>,
    index: BTreeMap<QuestionId, usize>,
    duplicates: Vec<QuestionId>,
}

/// A problem found in a symptom definition.
///
/// None of these stop a form from working; they explain why a question never shows or a
/// template never renders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefinitionIssue {
    DuplicateQuestion(QuestionId),
    UnknownParent {
        question_id: QuestionId,
        parent_id: QuestionId,
    },
    SelfParent(QuestionId),
    ParentCycle(QuestionId),
    MissingConditionalValues(QuestionId),
    UnmatchedConditionalValue {
        question_id: QuestionId,
        value: String,
    },
    TimeUnitOnNonNumber(QuestionId),
    UnsupportedType {
        question_id: QuestionId,
        kind: String,
    },
    ChoiceWithoutOptions(QuestionId),
    DuplicateOption {
        question_id: QuestionId,
        option_id: OptionId,
    },
    TemplateUnknownQuestion {
        template_id: TemplateId,
        question_id: QuestionId,
    },
    TemplateOrphanedTrigger(TemplateId),
    TemplateUnmatchedTrigger {
        template_id: TemplateId,
        value: String,
    },
    UnknownPlaceholder {
        template_id: TemplateId,
        token: String,
    },
}

impl fmt::Display for DefinitionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionIssue::DuplicateQuestion(id) => {
                write!(f, "question {id} is defined more than once")
            }
            DefinitionIssue::UnknownParent {
                question_id,
                parent_id,
            } => write!(
                f,
                "question {question_id} depends on unknown question {parent_id}"
            ),
            DefinitionIssue::SelfParent(id) => write!(f, "question {id} is its own parent"),
            DefinitionIssue::ParentCycle(id) => {
                write!(f, "question {id} is part of a parent cycle")
            }
            DefinitionIssue::MissingConditionalValues(id) => write!(
                f,
                "question {id} has a parent but no conditional values, so it is never shown"
            ),
            DefinitionIssue::UnmatchedConditionalValue { question_id, value } => write!(
                f,
                "question {question_id} waits for '{value}', which no parent option carries"
            ),
            DefinitionIssue::TimeUnitOnNonNumber(id) => {
                write!(f, "question {id} enables time units but is not a number question")
            }
            DefinitionIssue::UnsupportedType { question_id, kind } => {
                write!(f, "question {question_id} has unsupported type '{kind}'")
            }
            DefinitionIssue::ChoiceWithoutOptions(id) => {
                write!(f, "choice question {id} has no options")
            }
            DefinitionIssue::DuplicateOption {
                question_id,
                option_id,
            } => write!(
                f,
                "question {question_id} defines option {option_id} more than once"
            ),
            DefinitionIssue::TemplateUnknownQuestion {
                template_id,
                question_id,
            } => write!(
                f,
                "template {template_id} references unknown question {question_id}"
            ),
            DefinitionIssue::TemplateOrphanedTrigger(id) => write!(
                f,
                "template {id} has a trigger value but no question, so it never renders"
            ),
            DefinitionIssue::TemplateUnmatchedTrigger { template_id, value } => write!(
                f,
                "template {template_id} triggers on '{value}', which no option carries"
            ),
            DefinitionIssue::UnknownPlaceholder { template_id, token } => write!(
                f,
                "template {template_id} uses unknown placeholder '{token}'"
            ),
        }
    }
}

impl QuestionGraph {
    /// Index `questions`, keeping the first definition of any duplicated id.
    pub fn new(questions: Vec<Question>) -> Self {
        let mut index = BTreeMap::new();
        let mut duplicates = Vec::new();
        let mut kept = Vec::with_capacity(questions.len());

        for question in questions {
            if index.contains_key(&question.id) {
                duplicates.push(question.id);
                continue;
            }
            index.insert(question.id, kept.len());
            kept.push(question);
        }

        Self {
            questions: kept,
            index,
            duplicates,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.index.get(&id).map(|&i| &self.questions[i])
    }

    pub fn contains(&self, id: QuestionId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn parent_of(&self, question: &Question) -> Option<&Question> {
        question.parent_question_id.and_then(|id| self.question(id))
    }

    pub fn children_of(&self, id: QuestionId) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(move |q| q.parent_question_id == Some(id))
    }

    /// True when following parents from `id` leads back to `id`.
    pub fn in_cycle(&self, id: QuestionId) -> bool {
        let mut seen = BTreeSet::new();
        let mut current = self.question(id).and_then(|q| q.parent_question_id);
        while let Some(next) = current {
            if next == id {
                return true;
            }
            if !seen.insert(next) {
                return false;
            }
            current = self.question(next).and_then(|q| q.parent_question_id);
        }
        false
    }

    /// Check the graph and the templates that reference it.
    pub fn validate(&self, templates: &[TextTemplate]) -> Vec<DefinitionIssue> {
        let mut issues: Vec<DefinitionIssue> = self
            .duplicates
            .iter()
            .map(|&id| DefinitionIssue::DuplicateQuestion(id))
            .collect();

        for question in &self.questions {
            self.validate_question(question, &mut issues);
        }

        for template in templates {
            match template.trigger() {
                Trigger::AnyValue(question_id) | Trigger::Exact(question_id, _)
                    if !self.contains(question_id) =>
                {
                    issues.push(DefinitionIssue::TemplateUnknownQuestion {
                        template_id: template.id,
                        question_id,
                    });
                }
                Trigger::Exact(question_id, value) => {
                    let unmatched = self.question(question_id).is_some_and(|q| {
                        (q.kind.is_single_choice() || q.kind.is_multi_choice())
                            && !q.options.iter().any(|o| o.value == value)
                    });
                    if unmatched {
                        issues.push(DefinitionIssue::TemplateUnmatchedTrigger {
                            template_id: template.id,
                            value: value.to_string(),
                        });
                    }
                }
                Trigger::Orphaned => {
                    issues.push(DefinitionIssue::TemplateOrphanedTrigger(template.id));
                }
                Trigger::AnyValue(_) | Trigger::Unconditional => {}
            }

            for placeholder in placeholders(&template.template) {
                if let Placeholder::Unknown(_) = placeholder {
                    issues.push(DefinitionIssue::UnknownPlaceholder {
                        template_id: template.id,
                        token: placeholder.to_string(),
                    });
                }
            }
        }

        issues
    }

    fn validate_question(&self, question: &Question, issues: &mut Vec<DefinitionIssue>) {
        let id = question.id;

        if !question.kind.is_supported() {
            issues.push(DefinitionIssue::UnsupportedType {
                question_id: id,
                kind: question.kind.to_string(),
            });
        }
        if question.has_time_unit && !question.accepts_time_unit() {
            issues.push(DefinitionIssue::TimeUnitOnNonNumber(id));
        }
        if (question.kind.is_single_choice() || question.kind.is_multi_choice())
            && question.options.is_empty()
        {
            issues.push(DefinitionIssue::ChoiceWithoutOptions(id));
        }

        let mut option_ids = BTreeSet::new();
        for option in &question.options {
            if !option_ids.insert(option.id) {
                issues.push(DefinitionIssue::DuplicateOption {
                    question_id: id,
                    option_id: option.id,
                });
            }
        }

        let Some(parent_id) = question.parent_question_id else {
            return;
        };

        if parent_id == id {
            issues.push(DefinitionIssue::SelfParent(id));
            return;
        }
        let Some(parent) = self.question(parent_id) else {
            issues.push(DefinitionIssue::UnknownParent {
                question_id: id,
                parent_id,
            });
            return;
        };
        if self.in_cycle(id) {
            issues.push(DefinitionIssue::ParentCycle(id));
        }
        if question.is_general {
            return;
        }
        if question.conditional_values.is_empty() {
            issues.push(DefinitionIssue::MissingConditionalValues(id));
            return;
        }
        if parent.kind.is_single_choice() || parent.kind.is_multi_choice() {
            for value in question.conditional_values.values() {
                if !parent.options.iter().any(|o| &o.value == value) {
                    issues.push(DefinitionIssue::UnmatchedConditionalValue {
                        question_id: id,
                        value: value.clone(),
                    });
                }
            }
        }
    }
}
