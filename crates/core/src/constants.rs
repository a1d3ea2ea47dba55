//! Constants used throughout the intake core crate.

/// Default directory holding symptom definition files.
pub const DEFAULT_DEFINITIONS_DIR: &str = "definitions";

/// Default directory for stored submissions when no explicit directory is configured.
pub const DEFAULT_SUBMISSION_DATA_DIR: &str = "submission_data";

/// Filename of a stored submission inside its sharded directory.
pub const SUBMISSION_JSON_FILENAME: &str = "submission.json";

/// File extensions recognised as symptom definitions.
pub const DEFINITION_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Separator used when joining several labels, values or option inputs.
pub const LIST_SEPARATOR: &str = ", ";

/// Separator between summary fragments.
pub const FRAGMENT_SEPARATOR: &str = " ";

/// Upper bound on a definitions directory scan.
pub const MAX_DEFINITION_FILES: usize = 1_000;
