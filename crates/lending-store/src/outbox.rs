//! Statistics outbox records.

use common::ChangeId;
use domain::{Isbn, PublicationDate};
use serde::{Deserialize, Serialize};

/// Grouping key of the statistics read model.
///
/// Copies of the same ISBN printed on different dates are separate buckets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatKey {
    /// ISBN.
    pub isbn: Isbn,

    /// Publication date.
    pub publication_date: PublicationDate,
}

impl StatKey {
    /// Creates a key.
    pub fn new(isbn: Isbn, publication_date: PublicationDate) -> Self {
        Self {
            isbn,
            publication_date,
        }
    }
}

impl std::fmt::Display for StatKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.isbn, self.publication_date)
    }
}

/// A signed statistics delta appended to the outbox.
///
/// Written in the same transaction as the aggregate change that caused it,
/// then consumed in insertion order by the batch processor. The row id is
/// assigned by the producer so a retried append lands on the same row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookStatChange {
    /// Change identifier.
    pub id: ChangeId,

    /// ISBN.
    pub isbn: Isbn,

    /// Publication date.
    pub publication_date: PublicationDate,

    /// Change in the number of copies available for borrowing.
    pub available_count: i64,

    /// Change in the number of borrowed copies.
    pub borrowed_count: i64,
}

impl BookStatChange {
    /// Creates a delta record.
    pub fn new(
        id: ChangeId,
        isbn: Isbn,
        publication_date: PublicationDate,
        available_count: i64,
        borrowed_count: i64,
    ) -> Self {
        Self {
            id,
            isbn,
            publication_date,
            available_count,
            borrowed_count,
        }
    }

    /// Returns the statistics key this delta applies to.
    pub fn key(&self) -> StatKey {
        StatKey::new(self.isbn.clone(), self.publication_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn key_copies_isbn_and_date() {
        let change = BookStatChange::new(
            ChangeId::new(),
            Isbn::new("9780134434421").unwrap(),
            PublicationDate::new(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap()),
            1,
            0,
        );

        let key = change.key();
        assert_eq!(key.isbn.as_str(), "9780134434421");
        assert_eq!(key.to_string(), "9780134434421/2024-01-24");
    }
}
