//! Request-scoped accumulator for one atomic commit.

use domain::{Abonent, Book, DomainEvent, Entity};
use lending_store::{BookStatChange, PendingChanges};

/// Tracks the aggregates touched by one use case together with the outbox
/// rows produced by their events.
///
/// The unit of work owns the pending-changes accumulator; subscribers get a
/// mutable borrow during dispatch to append outbox rows, never an
/// independent handle with its own lifecycle.
#[derive(Debug, Default)]
pub struct UnitOfWork {
    books: Vec<Book>,
    abonents: Vec<Abonent>,
    stat_changes: Vec<BookStatChange>,
}

impl UnitOfWork {
    /// Creates an empty unit of work.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a book for persistence.
    pub fn track_book(&mut self, book: Book) {
        self.books.push(book);
    }

    /// Tracks an abonent for persistence.
    pub fn track_abonent(&mut self, abonent: Abonent) {
        self.abonents.push(abonent);
    }

    /// Appends a statistics delta to be committed with the aggregates.
    pub fn record_stat_change(&mut self, change: BookStatChange) {
        self.stat_changes.push(change);
    }

    /// Returns the tracked books.
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Returns the recorded statistics deltas.
    pub fn stat_changes(&self) -> &[BookStatChange] {
        &self.stat_changes
    }

    /// Returns true while any tracked aggregate has undrained events.
    pub fn has_pending_events(&self) -> bool {
        self.books.iter().any(Entity::has_pending_events)
            || self.abonents.iter().any(Entity::has_pending_events)
    }

    /// Drains the event buffers of every tracked aggregate.
    ///
    /// Buffers are cleared as they are read, so events recorded by handlers
    /// during publication form the next batch instead of re-entering this
    /// one.
    pub fn drain_events(&mut self) -> Vec<DomainEvent> {
        let mut events = Vec::new();
        for book in &mut self.books {
            events.extend(book.take_events());
        }
        for abonent in &mut self.abonents {
            events.extend(abonent.take_events());
        }
        events
    }

    /// Converts the unit of work into the store's commit payload.
    pub fn into_changes(self) -> PendingChanges {
        PendingChanges {
            books: self.books,
            abonents: self.abonents,
            stat_changes: self.stat_changes,
        }
    }
}
