//! File-backed repositories.
//!
//! - [`symptoms`]: the symptom catalog, loaded once from a definitions directory.
//! - [`submissions`]: accepted submissions, stored as JSON in sharded UUID directories.

pub mod submissions;
pub mod symptoms;
