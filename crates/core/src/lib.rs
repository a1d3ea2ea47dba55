//! # Intake Core
//!
//! The summary-generation engine behind the symptom intake form.
//!
//! Given a symptom definition (questions with options, plus text templates) and one user's
//! answers, the engine:
//! - decides which questions are visible, following parent/child conditions to a fixed point,
//! - prunes answers of questions that are no longer visible,
//! - renders each template, substituting `{value}`, `{label}` and `{input}` from the answers,
//! - assembles the rendered fragments into one summary, chief complaints first.
//!
//! Everything in the pipeline is a pure function of `(definition, session, phrasing)`. The
//! only I/O lives in [`repositories`]: loading definition files and storing submissions.
//!
//! **No API concerns**: HTTP servers and command-line parsing belong in `api-rest` and `cli`.

pub mod config;
pub mod constants;
pub mod definition;
pub mod error;
pub mod form;
pub mod graph;
pub mod phrasing;
pub mod render;
pub mod repositories;
pub mod session;
pub mod submission;
pub mod summary;
pub mod template;
pub mod visibility;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::CoreConfig;
pub use definition::{
    ConditionalValues, Question, QuestionOption, QuestionType, Symptom, TextTemplate, Trigger,
};
pub use error::{IntakeError, IntakeResult};
pub use form::{Evaluation, IntakeForm, Progress, SkippedTemplate};
pub use graph::{DefinitionIssue, QuestionGraph};
pub use phrasing::{Locale, Phrasing};
pub use render::{RenderContext, RenderOutcome, SkipReason};
pub use repositories::submissions::{StoredAnswer, StoredSubmission, SubmissionService};
pub use repositories::symptoms::{SymptomCatalog, SymptomSummary};
pub use session::{Answer, AnswerEvent, FormSession, OptionInputKey, TimeUnit};
pub use submission::{SubmissionPayload, SubmittedAnswer};
pub use summary::Fragment;

pub use intake_types::{NonEmptyText, OptionId, QuestionId, SymptomId, TemplateId, TextError};
pub use intake_uuid::ShardableUuid;
