//! The form pipeline: one symptom, one phrasing, any number of sessions.
//!
//! [`IntakeForm`] is built once per symptom from its active projection and is immutable
//! afterwards. Every operation takes the session explicitly, so one form can serve many
//! concurrent users and every result is a pure function of `(form, session)`.

use crate::definition::{Symptom, TextTemplate};
use crate::graph::{DefinitionIssue, QuestionGraph};
use crate::phrasing::Phrasing;
use crate::render::{RenderContext, RenderOutcome, SkipReason};
use crate::session::{AnswerEvent, FormSession};
use crate::submission::SubmissionPayload;
use crate::summary::{self, Fragment};
use crate::visibility;
use crate::{IntakeError, IntakeResult};
use intake_types::{NonEmptyText, QuestionId, SymptomId, TemplateId};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Clone, Debug)]
pub struct IntakeForm {
    symptom_id: SymptomId,
    name: NonEmptyText,
    graph: QuestionGraph,
    templates: Vec<TextTemplate>,
    phrasing: Phrasing,
}

/// Answer completeness of the visible part of a form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub answered: usize,
    pub visible: usize,
    pub missing_required: Vec<QuestionId>,
}

impl Progress {
    /// Whole-number percentage of visible questions answered.
    pub fn percent(&self) -> u8 {
        if self.visible == 0 {
            return 0;
        }
        ((self.answered * 100) / self.visible).min(100) as u8
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedTemplate {
    pub template_id: TemplateId,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// A full snapshot of a session against a form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub symptom_id: SymptomId,
    pub visible_questions: Vec<QuestionId>,
    /// The input session with answers of hidden questions removed.
    pub session: FormSession,
    pub fragments: Vec<Fragment>,
    pub skipped: Vec<SkippedTemplate>,
    pub summary_text: String,
    pub progress: Progress,
    /// Visible questions whose type the form cannot render.
    pub unsupported_questions: Vec<QuestionId>,
}

impl IntakeForm {
    /// Build a form from the active projection of `symptom`.
    pub fn new(symptom: &Symptom, phrasing: Phrasing) -> Self {
        let active = symptom.active();
        Self {
            symptom_id: active.id,
            name: active.name,
            graph: QuestionGraph::new(active.questions),
            templates: active.text_templates,
            phrasing,
        }
    }

    pub fn symptom_id(&self) -> SymptomId {
        self.symptom_id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn graph(&self) -> &QuestionGraph {
        &self.graph
    }

    pub fn templates(&self) -> &[TextTemplate] {
        &self.templates
    }

    pub fn phrasing(&self) -> &Phrasing {
        &self.phrasing
    }

    pub fn issues(&self) -> Vec<DefinitionIssue> {
        self.graph.validate(&self.templates)
    }

    /// Apply one user input and refresh visibility.
    ///
    /// On error the session is left unchanged.
    ///
    /// # Returns
    ///
    /// The visible question ids after the change.
    ///
    /// # Errors
    ///
    /// See [`FormSession::apply`].
    pub fn apply(
        &self,
        session: &mut FormSession,
        event: AnswerEvent,
    ) -> IntakeResult<BTreeSet<QuestionId>> {
        session.apply(&self.graph, event)?;
        Ok(self.refresh(session))
    }

    /// Resolve visibility and prune answers of hidden questions.
    pub fn refresh(&self, session: &mut FormSession) -> BTreeSet<QuestionId> {
        visibility::refresh(&self.graph, session)
    }

    pub fn visible_questions(&self, session: &FormSession) -> BTreeSet<QuestionId> {
        visibility::resolve_visible(&self.graph, session)
    }

    pub fn summary_text(&self, session: &FormSession) -> String {
        self.evaluate(session).summary_text
    }

    /// Answered and required counts over the currently visible questions.
    pub fn progress(&self, session: &FormSession) -> Progress {
        let visible = self.visible_questions(session);
        self.progress_for(session, &visible)
    }

    fn progress_for(&self, session: &FormSession, visible: &BTreeSet<QuestionId>) -> Progress {
        let mut progress = Progress {
            visible: visible.len(),
            ..Progress::default()
        };

        for question in self.graph.questions() {
            if !visible.contains(&question.id) {
                continue;
            }
            let answered = session
                .answer(question.id)
                .is_some_and(|answer| answer.is_answered());
            if answered {
                progress.answered += 1;
            } else if question.is_required {
                progress.missing_required.push(question.id);
            }
        }
        progress
    }

    /// Evaluate a session without mutating it.
    pub fn evaluate(&self, session: &FormSession) -> Evaluation {
        let mut session = session.clone();
        let visible = self.refresh(&mut session);

        let context = RenderContext::new(&self.graph, &session, &self.phrasing);
        let mut fragments = Vec::new();
        let mut skipped = Vec::new();

        for template in &self.templates {
            match context.render(template) {
                RenderOutcome::Rendered(text) => fragments.push(Fragment {
                    template_id: template.id,
                    question_id: template.question_id,
                    text,
                    chief_complaint: template
                        .question_id
                        .and_then(|id| self.graph.question(id))
                        .is_some_and(|q| q.is_cc),
                }),
                RenderOutcome::Skipped(reason) => skipped.push(SkippedTemplate {
                    template_id: template.id,
                    reason,
                }),
            }
        }

        let summary_text = summary::assemble(&fragments, &self.phrasing);
        let progress = self.progress_for(&session, &visible);
        let unsupported_questions = self
            .graph
            .questions()
            .iter()
            .filter(|q| visible.contains(&q.id) && !q.kind.is_supported())
            .map(|q| q.id)
            .collect();

        Evaluation {
            symptom_id: self.symptom_id,
            visible_questions: visible.into_iter().collect(),
            session,
            fragments,
            skipped,
            summary_text,
            progress,
            unsupported_questions,
        }
    }

    /// Validate a finished session and build the payload to persist.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`IntakeError::MissingRequired`] if visible required questions are unanswered,
    /// - [`IntakeError::EmptySummary`] if no template renders.
    pub fn prepare_submission(&self, session: &FormSession) -> IntakeResult<SubmissionPayload> {
        let evaluation = self.evaluate(session);

        let missing = evaluation.progress.missing_required.len();
        if missing > 0 {
            return Err(IntakeError::MissingRequired { count: missing });
        }

        let summary_text =
            NonEmptyText::new(&evaluation.summary_text).map_err(|_| IntakeError::EmptySummary)?;

        Ok(SubmissionPayload::from_session(
            self.symptom_id,
            &evaluation.session,
            summary_text,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::QuestionType;
    use crate::session::{Answer, TimeUnit};
    use crate::test_support::{choice, number, symptom, template, text};
    use intake_types::OptionId;

    fn select(question_id: i64, option_id: i64) -> AnswerEvent {
        AnswerEvent::SelectOption {
            question_id: QuestionId(question_id),
            option_id: OptionId(option_id),
        }
    }

    fn toggle(question_id: i64, option_id: i64) -> AnswerEvent {
        AnswerEvent::ToggleOption {
            question_id: QuestionId(question_id),
            option_id: OptionId(option_id),
            checked: true,
        }
    }

    fn enter(question_id: i64, text: &str) -> AnswerEvent {
        AnswerEvent::EnterText {
            question_id: QuestionId(question_id),
            text: text.into(),
        }
    }

    /// Fever (CC) -> how many days (number with unit) -> details when high, plus allergies and
    /// a free-text note.
    fn fever_form() -> IntakeForm {
        let questions = vec![
            choice(
                1,
                QuestionType::Radio,
                &[(10, "Has fever", "has_fever"), (11, "No fever", "no_fever")],
            )
            .chief_complaint()
            .required(),
            number(2).with_time_unit().child_of(1, &["has_fever"]),
            choice(3, QuestionType::Radio, &[(30, "High", "high"), (31, "Low", "low")])
                .child_of(1, &["has_fever"])
                .required(),
            text(4).child_of(3, &["high"]),
            choice(
                5,
                QuestionType::Checkbox,
                &[(50, "A", "a"), (51, "B", "b"), (52, "C", "c")],
            )
            .with_input(52),
            text(6).general(),
        ];
        let templates = vec![
            template(1, Some(1), Some("has_fever"), "has fever"),
            template(2, Some(1), Some("no_fever"), "no fever"),
            template(3, Some(2), None, "Duration: {value}"),
            template(4, Some(5), None, "{label} ({input})"),
            template(5, Some(6), None, "Note: {value}"),
            template(6, Some(4), None, "Details: {value}"),
        ];
        IntakeForm::new(&symptom(1, questions, templates), Phrasing::english())
    }

    #[test]
    fn scenario_exact_trigger_picks_one_template() {
        let form = fever_form();
        let mut session = FormSession::new();

        form.apply(&mut session, select(1, 10)).unwrap();
        assert_eq!(form.summary_text(&session), "Patient presents with has fever");

        form.apply(&mut session, select(1, 11)).unwrap();
        assert_eq!(form.summary_text(&session), "Patient presents with no fever");
    }

    #[test]
    fn scenario_number_with_time_unit() {
        let form = fever_form();
        let mut session = FormSession::new();
        form.apply(&mut session, select(1, 10)).unwrap();
        form.apply(&mut session, enter(2, "3")).unwrap();

        assert_eq!(
            form.summary_text(&session),
            "Patient presents with has fever Duration: 3"
        );

        form.apply(
            &mut session,
            AnswerEvent::ChooseTimeUnit {
                question_id: QuestionId(2),
                unit: Some(TimeUnit::Days),
            },
        )
        .unwrap();
        assert_eq!(
            form.summary_text(&session),
            "Patient presents with has fever Duration: 3 days"
        );
    }

    #[test]
    fn scenario_checkbox_labels_and_inputs() {
        let form = fever_form();
        let mut session = FormSession::new();
        form.apply(&mut session, toggle(5, 50)).unwrap();
        form.apply(&mut session, toggle(5, 52)).unwrap();
        form.apply(
            &mut session,
            AnswerEvent::EnterOptionInput {
                question_id: QuestionId(5),
                option_id: OptionId(52),
                text: "penicillin".into(),
            },
        )
        .unwrap();

        assert_eq!(form.summary_text(&session), "A, C (penicillin)");
    }

    #[test]
    fn scenario_switching_parent_hides_and_prunes_child() {
        let form = fever_form();
        let mut session = FormSession::new();

        assert!(!form.visible_questions(&session).contains(&QuestionId(3)));

        form.apply(&mut session, select(1, 10)).unwrap();
        assert!(form.visible_questions(&session).contains(&QuestionId(3)));
        form.apply(&mut session, select(3, 30)).unwrap();
        form.apply(&mut session, enter(4, "shivering")).unwrap();
        assert!(form.summary_text(&session).contains("Details: shivering"));

        let visible = form.apply(&mut session, select(1, 11)).unwrap();
        assert!(!visible.contains(&QuestionId(3)));
        assert!(!visible.contains(&QuestionId(4)));
        assert!(session.answer(QuestionId(3)).is_none());
        assert!(session.answer(QuestionId(4)).is_none());
    }

    #[test]
    fn scenario_whitespace_text_does_not_trigger() {
        let form = fever_form();
        let mut session = FormSession::new();
        session.set_answer(QuestionId(6), Answer::text("   "));
        assert_eq!(form.summary_text(&session), "");

        form.apply(&mut session, enter(6, "feels weak")).unwrap();
        assert_eq!(form.summary_text(&session), "Note: feels weak");
    }

    #[test]
    fn evaluate_prunes_without_touching_input() {
        let form = fever_form();
        let mut session = FormSession::new();
        session.set_answer(QuestionId(1), Answer::choice("no_fever", OptionId(11)));
        session.set_answer(QuestionId(3), Answer::choice("high", OptionId(30)));

        let evaluation = form.evaluate(&session);

        assert!(session.answer(QuestionId(3)).is_some());
        assert!(evaluation.session.answer(QuestionId(3)).is_none());
        assert_eq!(
            evaluation.visible_questions,
            vec![QuestionId(1), QuestionId(5), QuestionId(6)]
        );
        assert_eq!(evaluation.fragments.len(), 1);
        assert!(evaluation
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::TriggerNotMet));
    }

    #[test]
    fn chief_complaints_precede_others_regardless_of_order() {
        let questions = vec![
            text(1),
            choice(2, QuestionType::Radio, &[(20, "Cough", "cough")]).chief_complaint(),
        ];
        let templates = vec![
            template(1, Some(1), None, "Note: {value}."),
            template(2, Some(2), None, "{label}"),
            template(3, None, None, "Seen today."),
        ];
        let form = IntakeForm::new(&symptom(2, questions, templates), Phrasing::english());
        let mut session = FormSession::new();
        form.apply(&mut session, enter(1, "dry")).unwrap();
        form.apply(&mut session, select(2, 20)).unwrap();

        assert_eq!(
            form.summary_text(&session),
            "Patient presents with Cough Note: dry. Seen today."
        );
    }

    #[test]
    fn summary_is_deterministic() {
        let form = fever_form();
        let mut session = FormSession::new();
        for event in [
            select(1, 10),
            enter(2, "2"),
            select(3, 30),
            enter(4, "rigors"),
            toggle(5, 51),
        ] {
            form.apply(&mut session, event).unwrap();
        }

        let first = form.summary_text(&session);
        for _ in 0..5 {
            assert_eq!(form.summary_text(&session), first);
        }
        assert_eq!(form.evaluate(&session), form.evaluate(&session));
    }

    #[test]
    fn no_orphan_answers_survive_any_event() {
        let form = fever_form();
        let mut session = FormSession::new();
        let events = [
            select(1, 10),
            enter(2, "4"),
            select(3, 30),
            enter(4, "x"),
            select(3, 31),
            select(1, 11),
            select(1, 10),
            toggle(5, 50),
        ];

        for event in events {
            let visible = form.apply(&mut session, event).unwrap();
            for id in session.answers().keys() {
                assert!(visible.contains(id), "answer {id} survived while hidden");
            }
            assert!(visible.contains(&QuestionId(1)) && visible.contains(&QuestionId(6)));
        }
    }

    #[test]
    fn failed_event_leaves_session_untouched() {
        let form = fever_form();
        let mut session = FormSession::new();
        form.apply(&mut session, select(1, 10)).unwrap();
        let before = session.clone();

        let err = form.apply(&mut session, select(1, 99)).expect_err("unknown option");
        assert!(matches!(err, IntakeError::UnknownOption { .. }));
        assert_eq!(session, before);
    }

    #[test]
    fn progress_counts_visible_questions() {
        let form = fever_form();
        let mut session = FormSession::new();
        let progress = form.progress(&session);
        assert_eq!(progress.visible, 3);
        assert_eq!(progress.answered, 0);
        assert_eq!(progress.missing_required, vec![QuestionId(1)]);
        assert_eq!(progress.percent(), 0);

        form.apply(&mut session, select(1, 10)).unwrap();
        let progress = form.progress(&session);
        assert_eq!(progress.visible, 5);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.missing_required, vec![QuestionId(3)]);
        assert_eq!(progress.percent(), 20);
    }

    #[test]
    fn submission_requires_visible_required_answers() {
        let form = fever_form();
        let mut session = FormSession::new();
        form.apply(&mut session, select(1, 10)).unwrap();

        let err = form.prepare_submission(&session).expect_err("question 3 missing");
        assert!(matches!(err, IntakeError::MissingRequired { count: 1 }));
        assert!(err.is_validation());

        form.apply(&mut session, select(3, 31)).unwrap();
        let payload = form.prepare_submission(&session).expect("complete form");
        assert_eq!(payload.symptom_id, SymptomId(1));
        assert_eq!(payload.summary_text.as_str(), "Patient presents with has fever");
        assert_eq!(payload.answers.len(), 2);
    }

    #[test]
    fn submission_rejects_empty_summary() {
        let questions = vec![text(1).required()];
        let form = IntakeForm::new(&symptom(3, questions, vec![]), Phrasing::english());
        let mut session = FormSession::new();
        form.apply(&mut session, enter(1, "hello")).unwrap();

        let err = form.prepare_submission(&session).expect_err("nothing renders");
        assert!(matches!(err, IntakeError::EmptySummary));
    }

    #[test]
    fn unsupported_questions_are_reported_not_fatal() {
        let mut slider = text(2);
        slider.kind = QuestionType::Unsupported("slider".into());
        let questions = vec![text(1), slider];
        let templates = vec![template(1, Some(1), None, "{value}")];
        let form = IntakeForm::new(&symptom(4, questions, templates), Phrasing::english());

        let mut session = FormSession::new();
        form.apply(&mut session, enter(1, "ok")).unwrap();
        let err = form.apply(&mut session, enter(2, "5")).expect_err("cannot answer slider");
        assert!(matches!(err, IntakeError::AnswerTypeMismatch { .. }));

        let evaluation = form.evaluate(&session);
        assert_eq!(evaluation.unsupported_questions, vec![QuestionId(2)]);
        assert_eq!(evaluation.summary_text, "ok");
        assert_eq!(form.issues().len(), 1);
    }
}
