//! Domain events recorded by the lending aggregates.

use chrono::{DateTime, NaiveDate, Utc};
use common::{AbonentId, BookId};
use serde::{Deserialize, Serialize};

use crate::book::{BookTitle, Isbn, PublicationDate};

/// Facts that can occur in the lending domain.
///
/// Borrow and return events carry the `(isbn, publication_date)` statistics
/// key directly, so downstream subscribers never have to diff persisted
/// state to learn which inventory bucket changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DomainEvent {
    /// One or more identical book copies were added to the library.
    BookCreated(BookCreatedData),

    /// A book copy was borrowed by an abonent.
    BookBorrowed(BookBorrowedData),

    /// A borrowed book copy was returned.
    BookReturned(BookReturnedData),

    /// A new abonent registered.
    AbonentRegistered(AbonentRegisteredData),
}

/// Discriminant of [`DomainEvent`], used as the dispatch table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BookCreated,
    BookBorrowed,
    BookReturned,
    AbonentRegistered,
}

impl DomainEvent {
    /// Returns the event discriminant.
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::BookCreated(_) => EventKind::BookCreated,
            DomainEvent::BookBorrowed(_) => EventKind::BookBorrowed,
            DomainEvent::BookReturned(_) => EventKind::BookReturned,
            DomainEvent::AbonentRegistered(_) => EventKind::AbonentRegistered,
        }
    }

    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::BookCreated(_) => "BookCreated",
            DomainEvent::BookBorrowed(_) => "BookBorrowed",
            DomainEvent::BookReturned(_) => "BookReturned",
            DomainEvent::AbonentRegistered(_) => "AbonentRegistered",
        }
    }
}

/// Data for the BookCreated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookCreatedData {
    /// Book title.
    pub title: BookTitle,

    /// ISBN.
    pub isbn: Isbn,

    /// Publication date.
    pub publication_date: PublicationDate,

    /// Number of identical copies this event accounts for.
    ///
    /// The aggregate constructor always records count 1; the reducer merges
    /// events for identical copies into one counted event.
    pub count: u32,
}

/// Data for the BookBorrowed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookBorrowedData {
    /// The borrowed copy.
    pub book_id: BookId,

    /// Who borrowed it.
    pub abonent_id: AbonentId,

    /// ISBN of the copy.
    pub isbn: Isbn,

    /// Publication date of the copy.
    pub publication_date: PublicationDate,

    /// When the copy was borrowed.
    pub borrowed_at: DateTime<Utc>,

    /// The date the copy must be returned before.
    pub return_before: NaiveDate,
}

/// Data for the BookReturned event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookReturnedData {
    /// The returned copy.
    pub book_id: BookId,

    /// Who returned it.
    pub abonent_id: AbonentId,

    /// ISBN of the copy.
    pub isbn: Isbn,

    /// Publication date of the copy.
    pub publication_date: PublicationDate,

    /// When the copy was returned.
    pub returned_at: DateTime<Utc>,
}

/// Data for the AbonentRegistered event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbonentRegisteredData {
    /// The newly registered abonent.
    pub abonent_id: AbonentId,
}

// Convenience constructors for events
impl DomainEvent {
    /// Creates a BookCreated event.
    pub fn book_created(
        title: BookTitle,
        isbn: Isbn,
        publication_date: PublicationDate,
        count: u32,
    ) -> Self {
        DomainEvent::BookCreated(BookCreatedData {
            title,
            isbn,
            publication_date,
            count,
        })
    }

    /// Creates a BookBorrowed event.
    pub fn book_borrowed(
        book_id: BookId,
        abonent_id: AbonentId,
        isbn: Isbn,
        publication_date: PublicationDate,
        borrowed_at: DateTime<Utc>,
        return_before: NaiveDate,
    ) -> Self {
        DomainEvent::BookBorrowed(BookBorrowedData {
            book_id,
            abonent_id,
            isbn,
            publication_date,
            borrowed_at,
            return_before,
        })
    }

    /// Creates a BookReturned event.
    pub fn book_returned(
        book_id: BookId,
        abonent_id: AbonentId,
        isbn: Isbn,
        publication_date: PublicationDate,
        returned_at: DateTime<Utc>,
    ) -> Self {
        DomainEvent::BookReturned(BookReturnedData {
            book_id,
            abonent_id,
            isbn,
            publication_date,
            returned_at,
        })
    }

    /// Creates an AbonentRegistered event.
    pub fn abonent_registered(abonent_id: AbonentId) -> Self {
        DomainEvent::AbonentRegistered(AbonentRegisteredData { abonent_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_key() -> (BookTitle, Isbn, PublicationDate) {
        (
            BookTitle::new("Refactoring").unwrap(),
            Isbn::new("9780134434421").unwrap(),
            PublicationDate::new(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap()),
        )
    }

    #[test]
    fn event_kind_matches_variant() {
        let (title, isbn, date) = sample_key();
        let event = DomainEvent::book_created(title, isbn, date, 1);
        assert_eq!(event.kind(), EventKind::BookCreated);
        assert_eq!(event.event_type(), "BookCreated");

        let event = DomainEvent::abonent_registered(AbonentId::new());
        assert_eq!(event.kind(), EventKind::AbonentRegistered);
        assert_eq!(event.event_type(), "AbonentRegistered");
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = DomainEvent::book_borrowed(
            BookId::new(),
            AbonentId::new(),
            Isbn::new("9780134434421").unwrap(),
            PublicationDate::new(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap()),
            Utc::now(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("BookBorrowed"));

        let deserialized: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }
}
