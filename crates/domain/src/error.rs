//! Domain error types.

use thiserror::Error;

use crate::abonent::AbonentError;
use crate::book::BookError;

/// Errors that can occur during domain operations.
///
/// A thin sum over the per-aggregate error enums, used where a caller works
/// with more than one aggregate in a single unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// An error occurred on the book aggregate.
    #[error(transparent)]
    Book(#[from] BookError),

    /// An error occurred on the abonent aggregate.
    #[error(transparent)]
    Abonent(#[from] AbonentError),
}

impl DomainError {
    /// Stable error code for logs and API mappings.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Book(e) => e.code(),
            DomainError::Abonent(e) => e.code(),
        }
    }
}
