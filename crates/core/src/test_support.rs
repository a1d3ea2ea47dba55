//! Small builders for definitions used across unit tests.

use crate::definition::{
    ConditionalValues, Question, QuestionOption, QuestionType, Symptom, TextTemplate,
};
use intake_types::{NonEmptyText, OptionId, QuestionId, SymptomId, TemplateId};

pub(crate) fn choice(id: i64, kind: QuestionType, options: &[(i64, &str, &str)]) -> Question {
    let mut question = text(id);
    question.kind = kind;
    question.options = options
        .iter()
        .enumerate()
        .map(|(i, (option_id, label, value))| QuestionOption {
            id: OptionId(*option_id),
            label: label.to_string(),
            value: value.to_string(),
            order: i as i32,
            has_input: false,
            is_active: true,
        })
        .collect();
    question
}

pub(crate) fn text(id: i64) -> Question {
    Question {
        id: QuestionId(id),
        title: format!("Question {id}"),
        description: None,
        kind: QuestionType::Text,
        is_required: false,
        is_general: false,
        is_cc: false,
        has_time_unit: false,
        order: id as i32,
        parent_question_id: None,
        conditional_values: ConditionalValues::default(),
        is_active: true,
        options: Vec::new(),
    }
}

pub(crate) fn number(id: i64) -> Question {
    let mut question = text(id);
    question.kind = QuestionType::Number;
    question
}

pub(crate) fn template(
    id: i64,
    question_id: Option<i64>,
    trigger_value: Option<&str>,
    text: &str,
) -> TextTemplate {
    TextTemplate {
        id: TemplateId(id),
        question_id: question_id.map(QuestionId),
        trigger_value: trigger_value.map(str::to_string),
        template: text.to_string(),
        order: id as i32,
        is_active: true,
    }
}

pub(crate) fn symptom(
    id: i64,
    questions: Vec<Question>,
    text_templates: Vec<TextTemplate>,
) -> Symptom {
    Symptom {
        id: SymptomId(id),
        name: NonEmptyText::new(format!("Symptom {id}")).expect("non-empty name"),
        description: None,
        order: 0,
        is_active: true,
        questions,
        text_templates,
    }
}

impl Question {
    pub(crate) fn child_of(mut self, parent: i64, values: &[&str]) -> Self {
        self.parent_question_id = Some(QuestionId(parent));
        self.conditional_values = ConditionalValues::new(values);
        self
    }

    pub(crate) fn with_time_unit(mut self) -> Self {
        self.has_time_unit = true;
        self
    }

    pub(crate) fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub(crate) fn general(mut self) -> Self {
        self.is_general = true;
        self
    }

    pub(crate) fn chief_complaint(mut self) -> Self {
        self.is_cc = true;
        self
    }

    pub(crate) fn with_input(mut self, option_id: i64) -> Self {
        for option in self.options.iter_mut().filter(|o| o.id == OptionId(option_id)) {
            option.has_input = true;
        }
        self
    }
}
