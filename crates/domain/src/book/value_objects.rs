//! Value objects for the book domain.

use chrono::{DateTime, NaiveDate, Utc};
use common::AbonentId;
use serde::{Deserialize, Serialize};

use super::{BookError, MAX_BORROWED_BOOKS};

/// Book title, non-blank and at most 300 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookTitle(String);

impl BookTitle {
    pub const MAX_LENGTH: usize = 300;

    /// Creates a validated title.
    pub fn new(value: impl Into<String>) -> Result<Self, BookError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(BookError::InvalidTitle {
                reason: "title cannot be blank",
            });
        }
        if value.chars().count() > Self::MAX_LENGTH {
            return Err(BookError::InvalidTitle {
                reason: "too long book title",
            });
        }
        Ok(Self(value))
    }

    /// Returns the title as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BookTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// International standard book number.
///
/// Accepts the 10- and 13-digit forms, where the final character may be the
/// `X` check digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Isbn(String);

impl Isbn {
    /// Creates a validated ISBN.
    pub fn new(value: impl Into<String>) -> Result<Self, BookError> {
        let value = value.into();
        if !Self::is_valid(&value) {
            return Err(BookError::InvalidIsbn { isbn: value });
        }
        Ok(Self(value))
    }

    fn is_valid(value: &str) -> bool {
        let bytes = value.as_bytes();
        let (body, check) = match bytes.len() {
            10 => (&bytes[..9], bytes[9]),
            13 => (&bytes[..12], bytes[12]),
            _ => return false,
        };
        body.iter().all(u8::is_ascii_digit) && (check.is_ascii_digit() || check == b'X' || check == b'x')
    }

    /// Returns the ISBN as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Isbn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Isbn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The day, month and year a book was published.
///
/// Part of the statistics key: copies of the same ISBN printed on different
/// dates are tracked as separate inventory buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicationDate(NaiveDate);

impl PublicationDate {
    /// Wraps a calendar date.
    pub fn new(value: NaiveDate) -> Self {
        Self(value)
    }

    /// Returns the underlying date.
    pub fn value(&self) -> NaiveDate {
        self.0
    }
}

impl std::fmt::Display for PublicationDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl From<NaiveDate> for PublicationDate {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl From<PublicationDate> for NaiveDate {
    fn from(date: PublicationDate) -> Self {
        date.0
    }
}

/// Book author: surname and name are required, patronymic is optional.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    name: String,
    surname: String,
    patronymic: Option<String>,
}

impl Author {
    /// Creates a validated author.
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        patronymic: Option<String>,
    ) -> Result<Self, BookError> {
        let name = name.into();
        let surname = surname.into();
        if name.trim().is_empty() {
            return Err(BookError::InvalidAuthorName);
        }
        if surname.trim().is_empty() {
            return Err(BookError::InvalidAuthorSurname);
        }
        Ok(Self {
            name,
            surname,
            patronymic,
        })
    }

    /// First name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last name.
    pub fn surname(&self) -> &str {
        &self.surname
    }

    /// Middle name, if any.
    pub fn patronymic(&self) -> Option<&str> {
        self.patronymic.as_deref()
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.surname, self.name)?;
        if let Some(patronymic) = &self.patronymic {
            write!(f, " {patronymic}")?;
        }
        Ok(())
    }
}

/// Active loan details.
///
/// Presence of this value on a book is the sole source of truth for
/// "this copy is borrowed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowInfo {
    /// Who holds the copy.
    pub abonent_id: AbonentId,

    /// When the copy was borrowed.
    pub borrowed_at: DateTime<Utc>,

    /// The date the copy must be returned before.
    pub return_before: NaiveDate,
}

impl BorrowInfo {
    /// Creates loan details.
    pub fn new(abonent_id: AbonentId, borrowed_at: DateTime<Utc>, return_before: NaiveDate) -> Self {
        Self {
            abonent_id,
            borrowed_at,
            return_before,
        }
    }
}

/// The abonent-side view a borrow attempt is checked against.
///
/// Ephemeral: recomputed per attempt from the live loan count, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abonement {
    abonent_id: AbonentId,
    borrowed_books_count: usize,
}

impl Abonement {
    /// Creates an abonement for a borrow attempt.
    pub fn new(abonent_id: AbonentId, borrowed_books_count: usize) -> Result<Self, BookError> {
        if abonent_id.is_nil() {
            return Err(BookError::InvalidBorrowerId);
        }
        Ok(Self {
            abonent_id,
            borrowed_books_count,
        })
    }

    /// The abonent attempting to borrow.
    pub fn abonent_id(&self) -> AbonentId {
        self.abonent_id
    }

    /// How many books the abonent currently holds.
    pub fn borrowed_books_count(&self) -> usize {
        self.borrowed_books_count
    }

    /// Returns true if the abonent is below the concurrent loan limit.
    pub fn can_borrow_more(&self) -> bool {
        self.borrowed_books_count < MAX_BORROWED_BOOKS
    }
}
