//! Use case commands.

use chrono::NaiveDate;
use common::{AbonentId, BookId};

/// Author data as it arrives from the caller, validated by the use case.
#[derive(Debug, Clone)]
pub struct NewAuthor {
    /// First name.
    pub name: String,

    /// Last name.
    pub surname: String,

    /// Middle name, if any.
    pub patronymic: Option<String>,
}

impl NewAuthor {
    /// Creates author data.
    pub fn new(
        name: impl Into<String>,
        surname: impl Into<String>,
        patronymic: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            patronymic,
        }
    }
}

/// Command to add `count` identical copies of a book.
#[derive(Debug, Clone)]
pub struct AddBooks {
    /// ISBN.
    pub isbn: String,

    /// Book title.
    pub title: String,

    /// Publication date.
    pub publication_date: NaiveDate,

    /// Book authors.
    pub authors: Vec<NewAuthor>,

    /// How many copies to add.
    pub count: u32,
}

/// Which copy a borrow request targets.
#[derive(Debug, Clone)]
pub enum BorrowTarget {
    /// A specific copy.
    ById(BookId),

    /// Any available copy of an ISBN, optionally narrowed to one printing.
    ByIsbn {
        isbn: String,
        publication_date: Option<NaiveDate>,
    },
}

/// Command to borrow a book.
#[derive(Debug, Clone)]
pub struct BorrowBook {
    /// Who borrows.
    pub abonent_id: AbonentId,

    /// Which copy.
    pub target: BorrowTarget,

    /// Desired return date; defaults to 30 days when absent.
    pub return_before: Option<NaiveDate>,
}

/// Command to return a borrowed book.
#[derive(Debug, Clone)]
pub struct ReturnBook {
    /// The borrowed copy.
    pub book_id: BookId,

    /// Who returns it.
    pub abonent_id: AbonentId,
}

/// Command to register a new abonent.
#[derive(Debug, Clone)]
pub struct RegisterAbonent {
    /// Email, unique across abonents.
    pub email: String,

    /// First name.
    pub name: String,

    /// Last name.
    pub surname: String,

    /// Middle name, if any.
    pub patronymic: Option<String>,
}
