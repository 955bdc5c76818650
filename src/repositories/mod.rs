//! Persistence gateway over SQLite.
//!
//! The repositories are the only code that touches SQL. Every read path
//! applies the standing status predicate (soft-deleted rows, and reserved
//! file rows, never surface from a lookup or listing), and single-row file
//! reads are owner-scoped so a foreign id behaves exactly like a missing
//! one.

pub mod file_repository;
pub mod folder_repository;
pub mod user_repository;

pub use file_repository::{FileRepository, NewFile};
pub use folder_repository::{FolderRepository, NewFolder};
pub use user_repository::{NewUser, UserRepository};

/// Return true if a SQLx error indicates a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}
