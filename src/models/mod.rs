//! Core data models for the cloud drive service.
//!
//! These entities represent stored file metadata, the folder hierarchy,
//! and user accounts. They map to database tables via `sqlx::FromRow` and
//! the `*Dto` types are the JSON shapes the API exposes.

use thiserror::Error;

pub mod file;
pub mod folder;
pub mod user;

/// Invariant violations raised by the entities themselves.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("name cannot be empty")]
    EmptyName,
    #[error("cannot transition file from `{from}` to `{to}`")]
    InvalidTransition {
        from: file::FileStatus,
        to: file::FileStatus,
    },
}
