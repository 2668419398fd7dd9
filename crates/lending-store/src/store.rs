//! Core trait for lending store implementations.

use async_trait::async_trait;
use common::{AbonentId, BookId, ChangeId};
use domain::{Abonent, Book, Isbn, PublicationDate};

use crate::outbox::{BookStatChange, StatKey};
use crate::stats::{BookStat, CatalogEntry};
use crate::Result;

/// Everything a unit of work wants written when it commits.
///
/// Aggregate upserts and outbox appends land in one transaction: either the
/// borrow and its statistics delta both become durable, or neither does.
#[derive(Debug, Default)]
pub struct PendingChanges {
    /// Books to insert or update, keyed by their id.
    pub books: Vec<Book>,

    /// Abonents to insert.
    pub abonents: Vec<Abonent>,

    /// Statistics deltas to append to the outbox.
    pub stat_changes: Vec<BookStatChange>,
}

impl PendingChanges {
    /// Returns true when there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self.books.is_empty() && self.abonents.is_empty() && self.stat_changes.is_empty()
    }
}

/// Persistence surface required by the lending core.
///
/// All implementations must be thread-safe and must make [`commit`] and
/// [`commit_stat_batch`] atomic. The outbox preserves insertion order:
/// [`pending_stat_changes`] always returns the oldest rows first.
///
/// [`commit`]: LendingStore::commit
/// [`commit_stat_batch`]: LendingStore::commit_stat_batch
/// [`pending_stat_changes`]: LendingStore::pending_stat_changes
#[async_trait]
pub trait LendingStore: Send + Sync {
    /// Loads a book copy by id.
    ///
    /// Implementations backed by a database re-lock the row for update
    /// inside the committing transaction.
    async fn book(&self, id: BookId) -> Result<Option<Book>>;

    /// Finds the first copy of an ISBN that is currently available.
    ///
    /// With `publication_date` set, only copies of that printing match.
    async fn find_available_book(
        &self,
        isbn: &Isbn,
        publication_date: Option<PublicationDate>,
    ) -> Result<Option<Book>>;

    /// Counts the books an abonent currently holds.
    async fn count_borrowed_by(&self, abonent_id: AbonentId) -> Result<usize>;

    /// Loads an abonent by id.
    async fn abonent(&self, id: AbonentId) -> Result<Option<Abonent>>;

    /// Commits a unit of work atomically.
    ///
    /// Fails with [`StoreError::EmailTaken`] when an inserted abonent's
    /// email is already registered; nothing is written in that case.
    ///
    /// [`StoreError::EmailTaken`]: crate::StoreError::EmailTaken
    async fn commit(&self, changes: PendingChanges) -> Result<()>;

    /// Returns up to `limit` unprocessed outbox rows, oldest first.
    async fn pending_stat_changes(&self, limit: usize) -> Result<Vec<BookStatChange>>;

    /// Returns how many outbox rows are waiting to be processed.
    async fn pending_stat_change_count(&self) -> Result<usize>;

    /// Loads the statistics row for a key.
    async fn stat(&self, key: &StatKey) -> Result<Option<BookStat>>;

    /// Looks up title and author metadata for a key from the book catalog.
    async fn catalog_entry(&self, key: &StatKey) -> Result<Option<CatalogEntry>>;

    /// Writes folded statistics rows and retires the processed outbox rows
    /// in one transaction.
    ///
    /// Retiring only alongside the fold is what makes a mid-batch crash
    /// safe: an aborted batch leaves every row pending and is retried in
    /// full.
    async fn commit_stat_batch(
        &self,
        upserts: Vec<BookStat>,
        processed: Vec<ChangeId>,
    ) -> Result<()>;
}
