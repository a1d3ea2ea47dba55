use intake_types::{OptionId, QuestionId, SymptomId};

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("symptom {0} not found")]
    UnknownSymptom(SymptomId),
    #[error("question {0} does not belong to this symptom")]
    UnknownQuestion(QuestionId),
    #[error("option {option_id} does not belong to question {question_id}")]
    UnknownOption {
        question_id: QuestionId,
        option_id: OptionId,
    },
    #[error("question {question_id} does not accept {event} input")]
    AnswerTypeMismatch {
        question_id: QuestionId,
        event: &'static str,
    },

    #[error("please answer all required questions ({count} missing)")]
    MissingRequired { count: usize },
    #[error("summary is empty; answer more questions to generate a summary")]
    EmptySummary,

    #[error("definition schema mismatch in {source_name} at {path}: {message}")]
    DefinitionSchema {
        source_name: String,
        path: String,
        message: String,
    },
    #[error("symptom {0} is defined more than once")]
    DuplicateSymptom(SymptomId),
    #[error("submission {0} not found")]
    SubmissionNotFound(String),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize JSON: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize JSON: {0}")]
    Deserialization(serde_json::Error),

    #[error("invalid identifier: {0}")]
    Uuid(#[from] intake_uuid::UuidError),
}

impl IntakeError {
    /// True for failures caused by the end user's answers rather than by the system.
    ///
    /// These are the errors surfaced as blocking validation messages in the form.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            IntakeError::MissingRequired { .. } | IntakeError::EmptySummary
        )
    }
}

pub type IntakeResult<T> = std::result::Result<T, IntakeError>;
