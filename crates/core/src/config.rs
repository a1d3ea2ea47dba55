//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services.
//! Environment variables are read by the binaries only; this module takes the already-read
//! values so request handling and tests never depend on process-wide state.

use crate::constants::DEFAULT_DEFINITIONS_DIR;
use crate::phrasing::Phrasing;
use crate::{IntakeError, IntakeResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    definitions_dir: PathBuf,
    submission_data_dir: PathBuf,
    phrasing: Phrasing,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidInput`] if `definitions_dir` is not a directory or the
    /// phrasing has an empty chief-complaint prefix.
    pub fn new(
        definitions_dir: PathBuf,
        submission_data_dir: PathBuf,
        phrasing: Phrasing,
    ) -> IntakeResult<Self> {
        if !definitions_dir.is_dir() {
            return Err(IntakeError::InvalidInput(format!(
                "definitions directory does not exist: {}",
                definitions_dir.display()
            )));
        }
        if phrasing.chief_complaint_prefix.trim().is_empty() {
            return Err(IntakeError::InvalidInput(
                "chief complaint prefix cannot be empty".into(),
            ));
        }

        Ok(Self {
            definitions_dir,
            submission_data_dir,
            phrasing,
        })
    }

    pub fn definitions_dir(&self) -> &Path {
        &self.definitions_dir
    }

    pub fn submission_data_dir(&self) -> &Path {
        &self.submission_data_dir
    }

    pub fn phrasing(&self) -> &Phrasing {
        &self.phrasing
    }
}

/// Resolve the symptom definitions directory without reading environment variables.
///
/// If `override_dir` is provided it must be a directory. Otherwise this looks for
/// `definitions/` relative to the current working directory and then walks up from
/// `CARGO_MANIFEST_DIR`.
pub fn resolve_definitions_dir(override_dir: Option<PathBuf>) -> IntakeResult<PathBuf> {
    if let Some(dir) = override_dir {
        if dir.is_dir() {
            return Ok(dir);
        }
        return Err(IntakeError::InvalidInput(format!(
            "INTAKE_DEFINITIONS_DIR override is not a directory: {}",
            dir.display()
        )));
    }

    let cwd_relative = PathBuf::from(DEFAULT_DEFINITIONS_DIR);
    if cwd_relative.is_dir() {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(DEFAULT_DEFINITIONS_DIR);
        if candidate.is_dir() {
            return Ok(candidate);
        }
    }

    Err(IntakeError::InvalidInput(format!(
        "could not locate {DEFAULT_DEFINITIONS_DIR}/ directory"
    )))
}
