//! Abonent aggregate and related types.

mod aggregate;
mod value_objects;

pub use aggregate::Abonent;
pub use value_objects::{AbonentName, Email};

use thiserror::Error;

/// Errors that can occur during abonent operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbonentError {
    /// Abonent identifier was the nil UUID.
    #[error("invalid abonent identifier")]
    InvalidId,

    /// First name was blank.
    #[error("invalid abonent name")]
    InvalidName,

    /// Surname was blank.
    #[error("invalid abonent surname")]
    InvalidSurname,

    /// Email was structurally invalid.
    #[error("'{email}' is not a correct email")]
    InvalidEmail { email: String },
}

impl AbonentError {
    /// Stable error code for logs and API mappings.
    pub fn code(&self) -> &'static str {
        match self {
            AbonentError::InvalidId => "BL005",
            AbonentError::InvalidName => "BL008",
            AbonentError::InvalidSurname => "BL009",
            AbonentError::InvalidEmail { .. } => "BL011",
        }
    }
}
