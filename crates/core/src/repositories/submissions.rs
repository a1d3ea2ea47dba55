//! Submission storage.
//!
//! Each accepted submission is written once and never modified:
//!
//! ```text
//! submission_data/
//!   <s1>/
//!     <s2>/
//!       <uuid>/
//!         submission.json
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the UUID.
//!
//! Besides the payload, the stored record carries the generated id, a UTC timestamp and, per
//! answer, the question's "other" text and the matching option input, so a record can be read
//! without the auxiliary maps.

use crate::config::CoreConfig;
use crate::constants::{LIST_SEPARATOR, SUBMISSION_JSON_FILENAME};
use crate::session::{OptionInputKey, TimeUnit};
use crate::submission::{SubmissionPayload, SubmittedAnswer};
use crate::{IntakeError, IntakeResult};
use chrono::{DateTime, Utc};
use intake_types::{NonEmptyText, OptionId, QuestionId, SymptomId};
use intake_uuid::ShardableUuid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAnswer {
    pub question_id: QuestionId,
    pub option_id: Option<OptionId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub option_ids: Vec<OptionId>,
    pub text_value: Option<String>,
    pub other_text: Option<String>,
    pub option_input: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSubmission {
    pub id: ShardableUuid,
    pub created_at: DateTime<Utc>,
    pub symptom_id: SymptomId,
    pub summary_text: NonEmptyText,
    pub answers: Vec<StoredAnswer>,
    #[serde(default)]
    pub time_units: BTreeMap<QuestionId, TimeUnit>,
}

impl StoredSubmission {
    fn from_payload(
        id: ShardableUuid,
        created_at: DateTime<Utc>,
        payload: &SubmissionPayload,
    ) -> Self {
        let answers = payload
            .answers
            .iter()
            .map(|answer| StoredAnswer {
                question_id: answer.question_id,
                option_id: answer.option_id,
                option_ids: answer.option_ids.clone(),
                text_value: answer.text_value.clone(),
                other_text: payload.other_texts.get(&answer.question_id).cloned(),
                option_input: option_input_for(answer, &payload.option_inputs),
            })
            .collect();

        Self {
            id,
            created_at,
            symptom_id: payload.symptom_id,
            summary_text: payload.summary_text.clone(),
            answers,
            time_units: payload.time_units.clone(),
        }
    }
}

/// The option input recorded for an answer; inputs of a multi selection are joined.
fn option_input_for(
    answer: &SubmittedAnswer,
    option_inputs: &BTreeMap<OptionInputKey, String>,
) -> Option<String> {
    let selected: Vec<OptionId> = if answer.option_ids.is_empty() {
        answer.option_id.into_iter().collect()
    } else {
        answer.option_ids.clone()
    };

    let inputs: Vec<&str> = selected
        .into_iter()
        .filter_map(|option_id| {
            option_inputs.get(&OptionInputKey::new(answer.question_id, option_id))
        })
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if inputs.is_empty() {
        None
    } else {
        Some(inputs.join(LIST_SEPARATOR))
    }
}

/// Service for storing and reading submissions.
#[derive(Clone, Debug)]
pub struct SubmissionService {
    data_dir: PathBuf,
}

impl SubmissionService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self::from_data_dir(cfg.submission_data_dir())
    }

    /// A service over `data_dir` alone, for callers that never load definitions.
    pub fn from_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Persist a validated payload.
    ///
    /// # Returns
    ///
    /// The stored record, including its generated id.
    ///
    /// # Errors
    ///
    /// Returns an `IntakeError` if:
    /// - the sharded directory cannot be created,
    /// - the record cannot be serialised or written.
    pub fn store(&self, payload: &SubmissionPayload) -> IntakeResult<StoredSubmission> {
        let data_dir = self.data_dir.as_path();
        fs::create_dir_all(data_dir).map_err(IntakeError::StorageDirCreation)?;

        let (id, dir) = create_uuid_and_shard_dir(data_dir, ShardableUuid::new)?;
        let record = StoredSubmission::from_payload(id, Utc::now(), payload);

        let json = serde_json::to_string_pretty(&record).map_err(IntakeError::Serialization)?;
        fs::write(dir.join(SUBMISSION_JSON_FILENAME), json).map_err(IntakeError::FileWrite)?;

        tracing::info!(
            "stored submission {} for symptom {}",
            record.id,
            record.symptom_id
        );
        Ok(record)
    }

    /// Read a stored submission by its canonical id.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`IntakeError::Uuid`] if `id` is not a canonical UUID,
    /// - [`IntakeError::SubmissionNotFound`] if no record exists,
    /// - a read or deserialisation error for an unreadable record.
    pub fn read(&self, id: &str) -> IntakeResult<StoredSubmission> {
        let uuid = ShardableUuid::parse(id)?;
        let path = uuid
            .sharded_dir(&self.data_dir)
            .join(SUBMISSION_JSON_FILENAME);

        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(IntakeError::SubmissionNotFound(uuid.to_string()))
            }
            Err(e) => return Err(IntakeError::FileRead(e)),
        };
        serde_json::from_str(&json).map_err(IntakeError::Deserialization)
    }
}

/// Allocate a fresh UUID and create its sharded directory.
///
/// Retries a few times if the directory already exists.
fn create_uuid_and_shard_dir(
    base_dir: &Path,
    mut uuid_source: impl FnMut() -> ShardableUuid,
) -> IntakeResult<(ShardableUuid, PathBuf)> {
    for _attempt in 0..5 {
        let uuid = uuid_source();
        let candidate = uuid.sharded_dir(base_dir);

        if candidate.exists() {
            continue;
        }

        if let Some(parent) = candidate.parent() {
            fs::create_dir_all(parent).map_err(IntakeError::StorageDirCreation)?;
        }

        match fs::create_dir(&candidate) {
            Ok(()) => return Ok((uuid, candidate)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(IntakeError::StorageDirCreation(e)),
        }
    }

    Err(IntakeError::StorageDirCreation(io::Error::new(
        ErrorKind::AlreadyExists,
        "failed to allocate a unique submission directory after 5 attempts",
    )))
}
