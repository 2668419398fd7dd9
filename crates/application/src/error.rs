//! Application error taxonomy.

use domain::{AbonentError, BookError, DomainError};
use thiserror::Error;

/// Outcome of a use case that did not succeed.
///
/// Domain rejections pass through typed; infrastructure failures are logged
/// at the use case boundary and collapsed into [`AppError::OperationFailed`]
/// with a per-operation code, so raw store error types never reach callers.
#[derive(Debug, Error)]
pub enum AppError {
    /// A validation or business-rule rejection from the domain.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// No book with the requested id exists.
    #[error("book not found")]
    BookNotFound,

    /// Every matching copy is currently borrowed.
    #[error("there is no book that can be borrowed")]
    NoBookAvailable,

    /// The email is already registered to another abonent.
    #[error("email already exists")]
    EmailAlreadyExists,

    /// An infrastructure failure, reported generically.
    #[error("{operation} failed")]
    OperationFailed {
        operation: &'static str,
        code: &'static str,
    },
}

impl AppError {
    /// Stable error code for logs and API mappings.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Domain(e) => e.code(),
            AppError::BookNotFound => "BL003",
            AppError::EmailAlreadyExists => "BL022",
            AppError::NoBookAvailable => "BL024",
            AppError::OperationFailed { code, .. } => code,
        }
    }
}

impl From<BookError> for AppError {
    fn from(e: BookError) -> Self {
        AppError::Domain(DomainError::Book(e))
    }
}

impl From<AbonentError> for AppError {
    fn from(e: AbonentError) -> Self {
        AppError::Domain(DomainError::Abonent(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_keep_their_codes() {
        let err: AppError = BookError::TooManyBooksBorrowed.into();
        assert_eq!(err.code(), "BL027");

        let err: AppError = AbonentError::InvalidEmail {
            email: "broken".to_string(),
        }
        .into();
        assert_eq!(err.code(), "BL011");
    }

    #[test]
    fn application_outcomes_have_stable_codes() {
        assert_eq!(AppError::BookNotFound.code(), "BL003");
        assert_eq!(AppError::EmailAlreadyExists.code(), "BL022");
        assert_eq!(AppError::NoBookAvailable.code(), "BL024");
    }
}
