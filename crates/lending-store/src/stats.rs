//! Statistics read model rows.

use domain::Author;
use serde::{Deserialize, Serialize};

use crate::outbox::StatKey;

/// Aggregated availability statistics for one `(isbn, publication_date)`
/// bucket.
///
/// Mutated only by the outbox batch processor; the primary write path never
/// touches these rows. The counters may lag the authoritative book rows but
/// converge once all pending deltas are folded, and are never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookStat {
    /// Statistics key.
    pub key: StatKey,

    /// Book title.
    pub title: String,

    /// Concatenated author names, kept denormalized for search.
    pub authors: String,

    /// How many copies are available for borrowing.
    pub available_count: i64,

    /// How many copies are borrowed.
    pub borrowed_count: i64,
}

/// Catalog metadata used when the processor inserts a fresh statistics row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Book title.
    pub title: String,

    /// Concatenated author names.
    pub authors: String,
}

/// Formats an author list the way the statistics rows store it:
/// `"Surname Name Patronymic"` per author, comma separated.
pub fn authors_line(authors: &[Author]) -> String {
    authors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authors_line_joins_with_commas() {
        let authors = vec![
            Author::new("Martin", "Fowler", None).unwrap(),
            Author::new("Kent", "Beck", None).unwrap(),
        ];
        assert_eq!(authors_line(&authors), "Fowler Martin,Beck Kent");
    }

    #[test]
    fn authors_line_includes_patronymic() {
        let authors = vec![Author::new("Ivan", "Petrov", Some("Sergeevich".to_string())).unwrap()];
        assert_eq!(authors_line(&authors), "Petrov Ivan Sergeevich");
    }
}
