//! Error taxonomy for core operations.
//!
//! Denials are ordinary outcomes: callers map each variant to a response
//! instead of treating it as fatal.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Referenced todo or user does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Role or ownership rule violated.
    #[error("{0}")]
    AccessDenied(String),

    /// Admin tried to delete or re-role their own account.
    #[error("{0}")]
    SelfProtection(String),

    /// Input rejected before or by the store (duplicate email, empty title).
    #[error("{0}")]
    Validation(String),

    /// Opaque store failure.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl Error {
    pub fn todo_not_found(id: i64) -> Self {
        Error::NotFound { entity: "todo", id }
    }

    pub fn user_not_found(id: i64) -> Self {
        Error::NotFound { entity: "user", id }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
