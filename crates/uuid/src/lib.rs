//! UUID and sharded-path utilities for stored submissions.
//!
//! Every accepted form submission is identified by a UUID in a *canonical* representation:
//! **32 lowercase hexadecimal characters** (no hyphens), the value produced by
//! `Uuid::new_v4().simple().to_string()`.
//!
//! ## Sharded directory layout
//! For a canonical UUID `u`, a submission is stored under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `submission_data/55/0e/550e8400e29b41d4a716446655440000/submission.json`
//!
//! Sharding keeps any single directory small even after years of pharmacy submissions.

mod service;

pub use service::{ShardableUuid, Uuid};

/// Error type for UUID operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for UUID operations.
pub type UuidResult<T> = Result<T, UuidError>;
