//! Book aggregate and related types.

mod aggregate;
mod value_objects;

pub use aggregate::Book;
pub use value_objects::{Abonement, Author, BookTitle, BorrowInfo, Isbn, PublicationDate};

use thiserror::Error;

/// How many books an abonent may hold at the same time.
pub const MAX_BORROWED_BOOKS: usize = 3;

/// Errors that can occur during book operations.
///
/// Every variant carries a stable error code (see [`BookError::code`]) so
/// callers and logs can refer to the outcome without matching on message
/// text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    /// Book identifier was the nil UUID.
    #[error("invalid book identifier")]
    InvalidId,

    /// Title was blank or too long.
    #[error("invalid book title: {reason}")]
    InvalidTitle { reason: &'static str },

    /// ISBN did not match the 10- or 13-digit form.
    #[error("invalid ISBN: {isbn}")]
    InvalidIsbn { isbn: String },

    /// Author first name was blank.
    #[error("invalid book author name")]
    InvalidAuthorName,

    /// Author surname was blank.
    #[error("invalid book author surname")]
    InvalidAuthorSurname,

    /// A book cannot exist without authors.
    #[error("book must have an author")]
    MustHaveAuthors,

    /// Abonent identifier on the abonement was the nil UUID.
    #[error("invalid abonent identifier for borrow")]
    InvalidBorrowerId,

    /// Return date was not strictly after the borrow date.
    #[error("book return date must be later than borrowing time")]
    InvalidBorrowingPeriod,

    /// The copy is already held by another abonent.
    #[error("book already borrowed")]
    AlreadyBorrowed,

    /// The abonent reached the concurrent loan limit.
    #[error("too many books borrowed already")]
    TooManyBooksBorrowed,

    /// Return was attempted with a nil abonent identifier.
    #[error("invalid abonent identifier for return")]
    InvalidReturnAbonentId,

    /// Return was attempted on an available copy.
    #[error("book not borrowed by anyone")]
    NotBorrowedByAnyone,

    /// Return was attempted by someone other than the current holder.
    #[error("book can't be returned if you not borrowed it")]
    NotBorrowedByAbonent,
}

impl BookError {
    /// Stable error code for logs and API mappings.
    pub fn code(&self) -> &'static str {
        match self {
            BookError::InvalidId => "BL004",
            BookError::InvalidTitle { .. } => "BL007",
            BookError::InvalidIsbn { .. } => "BL010",
            BookError::InvalidBorrowerId => "BL012",
            BookError::AlreadyBorrowed => "BL013",
            BookError::NotBorrowedByAnyone => "BL015",
            BookError::InvalidAuthorName => "BL016",
            BookError::InvalidAuthorSurname => "BL017",
            BookError::MustHaveAuthors => "BL018",
            BookError::TooManyBooksBorrowed => "BL027",
            BookError::InvalidReturnAbonentId => "BL028",
            BookError::NotBorrowedByAbonent => "BL029",
            BookError::InvalidBorrowingPeriod => "BL034",
        }
    }
}
