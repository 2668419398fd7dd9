use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{AbonentId, BookId, ChangeId};
use domain::{Abonent, Book, Isbn, PublicationDate};
use tokio::sync::RwLock;

use crate::outbox::{BookStatChange, StatKey};
use crate::stats::{authors_line, BookStat, CatalogEntry};
use crate::store::{LendingStore, PendingChanges};
use crate::{Result, StoreError};

/// In-memory lending store implementation for testing.
///
/// Provides the same interface and the same atomicity guarantees as the
/// PostgreSQL implementation: every commit happens under one write lock, so
/// a unit of work is either fully visible or not at all.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    books: HashMap<BookId, Book>,
    abonents: HashMap<AbonentId, Abonent>,
    outbox: Vec<(u64, BookStatChange)>,
    next_seq: u64,
    stats: HashMap<StatKey, BookStat>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored book copies.
    pub async fn book_count(&self) -> usize {
        self.inner.read().await.books.len()
    }

    /// Returns the total number of registered abonents.
    pub async fn abonent_count(&self) -> usize {
        self.inner.read().await.abonents.len()
    }

    /// Clears all stored state.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        *inner = Inner::default();
    }
}

/// Stored rows carry no pending events; a copy loaded later must not
/// re-publish what the dispatcher already drained.
fn stored_book(book: &Book) -> Book {
    Book::hydrate(
        book.id(),
        book.title().clone(),
        book.isbn().clone(),
        book.publication_date(),
        book.authors().to_vec(),
        book.borrow_info().cloned(),
        book.created_at(),
    )
}

fn stored_abonent(abonent: &Abonent) -> Abonent {
    Abonent::hydrate(
        abonent.id(),
        abonent.name().clone(),
        abonent.email().clone(),
        abonent.created_at(),
    )
}

#[async_trait]
impl LendingStore for InMemoryStore {
    async fn book(&self, id: BookId) -> Result<Option<Book>> {
        let inner = self.inner.read().await;
        Ok(inner.books.get(&id).cloned())
    }

    async fn find_available_book(
        &self,
        isbn: &Isbn,
        publication_date: Option<PublicationDate>,
    ) -> Result<Option<Book>> {
        let inner = self.inner.read().await;
        let found = inner
            .books
            .values()
            .filter(|book| {
                book.is_available()
                    && book.isbn() == isbn
                    && publication_date.is_none_or(|date| book.publication_date() == date)
            })
            .min_by_key(|book| book.created_at());
        Ok(found.cloned())
    }

    async fn count_borrowed_by(&self, abonent_id: AbonentId) -> Result<usize> {
        let inner = self.inner.read().await;
        let count = inner
            .books
            .values()
            .filter(|book| {
                book.borrow_info()
                    .is_some_and(|info| info.abonent_id == abonent_id)
            })
            .count();
        Ok(count)
    }

    async fn abonent(&self, id: AbonentId) -> Result<Option<Abonent>> {
        let inner = self.inner.read().await;
        Ok(inner.abonents.get(&id).cloned())
    }

    async fn commit(&self, changes: PendingChanges) -> Result<()> {
        let mut inner = self.inner.write().await;

        // unique email constraint, checked before anything is applied
        for abonent in &changes.abonents {
            let taken = inner.abonents.values().any(|existing| {
                existing.id() != abonent.id() && existing.email() == abonent.email()
            });
            let duplicated_in_batch = changes
                .abonents
                .iter()
                .filter(|other| other.email() == abonent.email())
                .count()
                > 1;
            if taken || duplicated_in_batch {
                return Err(StoreError::EmailTaken {
                    email: abonent.email().as_str().to_string(),
                });
            }
        }

        for book in &changes.books {
            inner.books.insert(book.id(), stored_book(book));
        }
        for abonent in &changes.abonents {
            inner.abonents.insert(abonent.id(), stored_abonent(abonent));
        }
        for change in changes.stat_changes {
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.outbox.push((seq, change));
        }

        Ok(())
    }

    async fn pending_stat_changes(&self, limit: usize) -> Result<Vec<BookStatChange>> {
        let inner = self.inner.read().await;
        let mut pending: Vec<_> = inner.outbox.clone();
        pending.sort_by_key(|(seq, _)| *seq);
        Ok(pending
            .into_iter()
            .take(limit)
            .map(|(_, change)| change)
            .collect())
    }

    async fn pending_stat_change_count(&self) -> Result<usize> {
        let inner = self.inner.read().await;
        Ok(inner.outbox.len())
    }

    async fn stat(&self, key: &StatKey) -> Result<Option<BookStat>> {
        let inner = self.inner.read().await;
        Ok(inner.stats.get(key).cloned())
    }

    async fn catalog_entry(&self, key: &StatKey) -> Result<Option<CatalogEntry>> {
        let inner = self.inner.read().await;
        let entry = inner
            .books
            .values()
            .find(|book| {
                book.isbn() == &key.isbn && book.publication_date() == key.publication_date
            })
            .map(|book| CatalogEntry {
                title: book.title().to_string(),
                authors: authors_line(book.authors()),
            });
        Ok(entry)
    }

    async fn commit_stat_batch(
        &self,
        upserts: Vec<BookStat>,
        processed: Vec<ChangeId>,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        for stat in upserts {
            inner.stats.insert(stat.key.clone(), stat);
        }
        let processed: HashSet<ChangeId> = processed.into_iter().collect();
        inner.outbox.retain(|(_, change)| !processed.contains(&change.id));
        Ok(())
    }
}
