//! Store error types.

use thiserror::Error;

/// Errors that can occur when interacting with the lending store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The unique email constraint was violated while inserting an abonent.
    ///
    /// Surfaced as its own variant so the application layer can translate it
    /// into the domain-level "email already exists" outcome instead of
    /// leaking a database error.
    #[error("email already registered: {email}")]
    EmailTaken { email: String },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
