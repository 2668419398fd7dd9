//! Book aggregate implementation.

use chrono::{DateTime, Days, NaiveDate, Utc};
use common::BookId;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::event::DomainEvent;

use super::{Abonement, Author, BookError, BookTitle, BorrowInfo, Isbn, PublicationDate};

/// Default borrow window applied when the caller names no return date.
const DEFAULT_BORROW_DAYS: u64 = 30;

/// Book aggregate root.
///
/// A single physical copy in the library. The copy is available exactly when
/// [`Book::borrow_info`] is `None`; setting and clearing that value are the
/// only state transitions, and each one records a domain event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Unique copy identifier.
    id: BookId,

    /// Book title.
    title: BookTitle,

    /// ISBN.
    isbn: Isbn,

    /// When the book was published.
    publication_date: PublicationDate,

    /// Authors, never empty.
    authors: Vec<Author>,

    /// Active loan, if any.
    borrow_info: Option<BorrowInfo>,

    /// When the copy was added to the library.
    created_at: DateTime<Utc>,

    /// Pending domain events, drained by the dispatcher.
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Entity for Book {
    fn pending_events(&self) -> &[DomainEvent] {
        &self.events
    }

    fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Book {
    /// Adds a new copy to the library.
    ///
    /// Records one `BookCreated` event with count 1; the reducer merges the
    /// events of a bulk add into a single counted event.
    pub fn new(
        id: BookId,
        title: BookTitle,
        isbn: Isbn,
        publication_date: PublicationDate,
        authors: Vec<Author>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, BookError> {
        if id.is_nil() {
            return Err(BookError::InvalidId);
        }
        if authors.is_empty() {
            return Err(BookError::MustHaveAuthors);
        }

        let created = DomainEvent::book_created(title.clone(), isbn.clone(), publication_date, 1);

        Ok(Self {
            id,
            title,
            isbn,
            publication_date,
            authors,
            borrow_info: None,
            created_at,
            events: vec![created],
        })
    }

    /// Reconstructs a copy from persisted state.
    ///
    /// Trusts the stored values and records no event; only store
    /// implementations should call this.
    pub fn hydrate(
        id: BookId,
        title: BookTitle,
        isbn: Isbn,
        publication_date: PublicationDate,
        authors: Vec<Author>,
        borrow_info: Option<BorrowInfo>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            isbn,
            publication_date,
            authors,
            borrow_info,
            created_at,
            events: Vec::new(),
        }
    }
}

// Query methods
impl Book {
    /// Returns the copy identifier.
    pub fn id(&self) -> BookId {
        self.id
    }

    /// Returns the title.
    pub fn title(&self) -> &BookTitle {
        &self.title
    }

    /// Returns the ISBN.
    pub fn isbn(&self) -> &Isbn {
        &self.isbn
    }

    /// Returns the publication date.
    pub fn publication_date(&self) -> PublicationDate {
        self.publication_date
    }

    /// Returns the authors.
    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    /// Returns the active loan, if any.
    pub fn borrow_info(&self) -> Option<&BorrowInfo> {
        self.borrow_info.as_ref()
    }

    /// Returns when the copy was added to the library.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true if the copy can be borrowed right now.
    pub fn is_available(&self) -> bool {
        self.borrow_info.is_none()
    }
}

// Command methods
impl Book {
    /// Borrows the copy for an abonent.
    ///
    /// Without an explicit `return_before` the copy is due back 30 days
    /// after `borrowed_at`. Borrowing a copy the same abonent already holds
    /// is a no-op success: the state is unchanged and no event is recorded.
    /// Every failure leaves the copy untouched.
    pub fn borrow(
        &mut self,
        abonement: &Abonement,
        borrowed_at: DateTime<Utc>,
        return_before: Option<NaiveDate>,
    ) -> Result<(), BookError> {
        // business rule: library default policy, book is borrowed for 30 days
        let return_before = match return_before {
            Some(date) => date,
            None => (borrowed_at + Days::new(DEFAULT_BORROW_DAYS)).date_naive(),
        };

        // business rule: return date must be in the future
        if borrowed_at.date_naive() >= return_before {
            return Err(BookError::InvalidBorrowingPeriod);
        }

        // business rule: the copy must be available to borrow
        if let Some(info) = &self.borrow_info {
            return if info.abonent_id != abonement.abonent_id() {
                Err(BookError::AlreadyBorrowed)
            } else {
                // the same abonent holds it already, borrowing again is a no-op
                Ok(())
            };
        }

        // business rule: no more than MAX_BORROWED_BOOKS per abonent at the same time
        if !abonement.can_borrow_more() {
            return Err(BookError::TooManyBooksBorrowed);
        }

        let info = BorrowInfo::new(abonement.abonent_id(), borrowed_at, return_before);
        self.borrow_info = Some(info.clone());

        self.events.push(DomainEvent::book_borrowed(
            self.id,
            info.abonent_id,
            self.isbn.clone(),
            self.publication_date,
            info.borrowed_at,
            info.return_before,
        ));

        Ok(())
    }

    /// Returns the copy to the library.
    ///
    /// Succeeds only when the copy is currently held by exactly the calling
    /// abonent.
    pub fn return_to_library(
        &mut self,
        abonent_id: common::AbonentId,
        returned_at: DateTime<Utc>,
    ) -> Result<(), BookError> {
        if abonent_id.is_nil() {
            return Err(BookError::InvalidReturnAbonentId);
        }

        let Some(info) = &self.borrow_info else {
            return Err(BookError::NotBorrowedByAnyone);
        };

        if info.abonent_id != abonent_id {
            return Err(BookError::NotBorrowedByAbonent);
        }

        self.borrow_info = None;

        self.events.push(DomainEvent::book_returned(
            self.id,
            abonent_id,
            self.isbn.clone(),
            self.publication_date,
            returned_at,
        ));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AbonentId;
    use uuid::Uuid;

    fn new_book() -> Book {
        Book::new(
            BookId::new(),
            BookTitle::new("Refactoring").unwrap(),
            Isbn::new("9780134434421").unwrap(),
            PublicationDate::new(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap()),
            vec![Author::new("Martin", "Fowler", None).unwrap()],
            Utc::now(),
        )
        .unwrap()
    }

    fn abonement(count: usize) -> Abonement {
        Abonement::new(AbonentId::new(), count).unwrap()
    }

    #[test]
    fn new_book_is_available_and_records_created_event() {
        let book = new_book();
        assert!(book.is_available());
        assert_eq!(book.pending_events().len(), 1);
        assert!(matches!(
            &book.pending_events()[0],
            DomainEvent::BookCreated(data) if data.count == 1
        ));
    }

    #[test]
    fn new_book_rejects_nil_id() {
        let result = Book::new(
            BookId::from_uuid(Uuid::nil()),
            BookTitle::new("Refactoring").unwrap(),
            Isbn::new("9780134434421").unwrap(),
            PublicationDate::new(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap()),
            vec![Author::new("Martin", "Fowler", None).unwrap()],
            Utc::now(),
        );
        assert!(matches!(result, Err(BookError::InvalidId)));
    }

    #[test]
    fn new_book_rejects_empty_authors() {
        let result = Book::new(
            BookId::new(),
            BookTitle::new("Refactoring").unwrap(),
            Isbn::new("9780134434421").unwrap(),
            PublicationDate::new(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap()),
            vec![],
            Utc::now(),
        );
        assert!(matches!(result, Err(BookError::MustHaveAuthors)));
    }

    #[test]
    fn borrow_sets_borrow_info_and_records_event() {
        let mut book = new_book();
        book.take_events();

        let abonement = abonement(0);
        let borrowed_at = Utc::now();
        book.borrow(&abonement, borrowed_at, None).unwrap();

        assert!(!book.is_available());
        let info = book.borrow_info().unwrap();
        assert_eq!(info.abonent_id, abonement.abonent_id());
        assert_eq!(
            info.return_before,
            (borrowed_at + Days::new(30)).date_naive()
        );
        assert_eq!(book.pending_events().len(), 1);
        assert!(matches!(
            &book.pending_events()[0],
            DomainEvent::BookBorrowed(_)
        ));
    }

    #[test]
    fn borrow_uses_explicit_return_date() {
        let mut book = new_book();
        book.take_events();

        let borrowed_at = Utc::now();
        let due = borrowed_at.date_naive() + Days::new(7);
        book.borrow(&abonement(0), borrowed_at, Some(due)).unwrap();

        assert_eq!(book.borrow_info().unwrap().return_before, due);
    }

    #[test]
    fn borrow_rejects_return_date_not_after_borrow_date() {
        let mut book = new_book();
        book.take_events();

        let borrowed_at = Utc::now();
        let same_day = borrowed_at.date_naive();

        let result = book.borrow(&abonement(0), borrowed_at, Some(same_day));
        assert!(matches!(result, Err(BookError::InvalidBorrowingPeriod)));
        assert!(book.is_available());
        assert!(book.pending_events().is_empty());

        let yesterday = same_day - Days::new(1);
        let result = book.borrow(&abonement(0), borrowed_at, Some(yesterday));
        assert!(matches!(result, Err(BookError::InvalidBorrowingPeriod)));
    }

    #[test]
    fn borrow_by_same_abonent_is_idempotent() {
        let mut book = new_book();
        book.take_events();

        let abonement = abonement(0);
        book.borrow(&abonement, Utc::now(), None).unwrap();
        let info_before = book.borrow_info().unwrap().clone();
        book.take_events();

        // second borrow by the same abonent: success, no event, same loan
        book.borrow(&abonement, Utc::now(), None).unwrap();
        assert!(book.pending_events().is_empty());
        assert_eq!(book.borrow_info().unwrap(), &info_before);
    }

    #[test]
    fn borrow_by_other_abonent_fails() {
        let mut book = new_book();
        book.take_events();

        book.borrow(&abonement(0), Utc::now(), None).unwrap();
        book.take_events();

        let result = book.borrow(&abonement(0), Utc::now(), None);
        assert!(matches!(result, Err(BookError::AlreadyBorrowed)));
        assert!(book.pending_events().is_empty());
    }

    #[test]
    fn borrow_rejects_abonent_at_limit() {
        let mut book = new_book();
        book.take_events();

        let result = book.borrow(&abonement(3), Utc::now(), None);
        assert!(matches!(result, Err(BookError::TooManyBooksBorrowed)));
        assert!(book.is_available());
        assert!(book.pending_events().is_empty());
    }

    #[test]
    fn return_clears_borrow_info_and_records_event() {
        let mut book = new_book();
        let abonement = abonement(0);
        book.borrow(&abonement, Utc::now(), None).unwrap();
        book.take_events();

        book.return_to_library(abonement.abonent_id(), Utc::now())
            .unwrap();

        assert!(book.is_available());
        assert_eq!(book.pending_events().len(), 1);
        assert!(matches!(
            &book.pending_events()[0],
            DomainEvent::BookReturned(data) if data.abonent_id == abonement.abonent_id()
        ));
    }

    #[test]
    fn return_rejects_nil_abonent_id() {
        let mut book = new_book();
        let result = book.return_to_library(AbonentId::from_uuid(Uuid::nil()), Utc::now());
        assert!(matches!(result, Err(BookError::InvalidReturnAbonentId)));
    }

    #[test]
    fn return_rejects_available_copy() {
        let mut book = new_book();
        book.take_events();

        let result = book.return_to_library(AbonentId::new(), Utc::now());
        assert!(matches!(result, Err(BookError::NotBorrowedByAnyone)));
        assert!(book.pending_events().is_empty());
    }

    #[test]
    fn return_rejects_other_abonent() {
        let mut book = new_book();
        let abonement = abonement(0);
        book.borrow(&abonement, Utc::now(), None).unwrap();
        book.take_events();

        let result = book.return_to_library(AbonentId::new(), Utc::now());
        assert!(matches!(result, Err(BookError::NotBorrowedByAbonent)));
        assert!(!book.is_available());
        assert!(book.pending_events().is_empty());
    }

    #[test]
    fn hydrate_records_no_events() {
        let book = Book::hydrate(
            BookId::new(),
            BookTitle::new("Refactoring").unwrap(),
            Isbn::new("9780134434421").unwrap(),
            PublicationDate::new(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap()),
            vec![Author::new("Martin", "Fowler", None).unwrap()],
            None,
            Utc::now(),
        );
        assert!(book.pending_events().is_empty());
        assert!(book.is_available());
    }
}
