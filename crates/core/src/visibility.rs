//! Conditional visibility of questions.
//!
//! A question is visible when it is a root candidate (no parent, or `isGeneral`), or when its
//! parent is visible, the parent has an answer, and that answer matches one of the question's
//! conditional values. Visibility is resolved to a fixed point so arbitrarily deep chains
//! settle in one call; a parent cycle never becomes visible because no member of the cycle
//! can be the first one shown.
//!
//! Answers of questions that are not visible are pruned from the session, which is what makes
//! the summary consistent with what the user can actually see.

use crate::definition::Question;
use crate::graph::QuestionGraph;
use crate::session::{Answer, FormSession};
use intake_types::QuestionId;
use std::collections::BTreeSet;

/// Compute the visible question ids for the current answers.
///
/// The session is only read; call [`prune_hidden`] (or [`refresh`]) to drop stale answers.
pub fn resolve_visible(graph: &QuestionGraph, session: &FormSession) -> BTreeSet<QuestionId> {
    let mut visible: BTreeSet<QuestionId> = graph
        .questions()
        .iter()
        .filter(|q| q.is_root())
        .map(|q| q.id)
        .collect();

    loop {
        let mut changed = false;

        for question in graph.questions() {
            if visible.contains(&question.id) {
                continue;
            }
            let Some(parent_id) = question.parent_question_id else {
                continue;
            };
            if question.conditional_values.is_empty() || !visible.contains(&parent_id) {
                continue;
            }
            let (Some(parent), Some(answer)) =
                (graph.question(parent_id), session.answer(parent_id))
            else {
                continue;
            };

            if condition_met(question, parent, answer) {
                visible.insert(question.id);
                changed = true;
            }
        }

        if !changed {
            return visible;
        }
    }
}

/// True when the parent's answer matches one of the child's conditional values.
///
/// Single answers compare their raw value; checkbox answers match when any selected option's
/// `value` is listed.
fn condition_met(child: &Question, parent: &Question, answer: &Answer) -> bool {
    match answer {
        Answer::Single { value, .. } => child.conditional_values.contains(value),
        Answer::Multi { option_ids } => option_ids
            .iter()
            .filter_map(|&id| parent.option(id))
            .any(|option| child.conditional_values.contains(&option.value)),
    }
}

/// Remove answers, other texts, option inputs and time units of hidden questions.
///
/// # Returns
///
/// The ids of the questions whose answers were removed.
pub fn prune_hidden(session: &mut FormSession, visible: &BTreeSet<QuestionId>) -> Vec<QuestionId> {
    let removed = session.retain_questions(visible);
    if !removed.is_empty() {
        tracing::debug!("pruned answers of hidden questions: {:?}", removed);
    }
    removed
}

/// Resolve visibility and prune hidden answers.
///
/// Only answers of hidden questions are removed, and a visible question depends solely on
/// visible parents, so the returned set is already stable for the pruned session.
pub fn refresh(graph: &QuestionGraph, session: &mut FormSession) -> BTreeSet<QuestionId> {
    let visible = resolve_visible(graph, session);
    prune_hidden(session, &visible);
    visible
}
