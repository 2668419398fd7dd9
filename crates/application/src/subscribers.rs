//! Statistics delta producers and ambient event subscribers.

use std::sync::Arc;

use common::ChangeId;
use domain::{DomainEvent, EventKind};
use lending_store::BookStatChange;

use crate::dispatcher::{EventDispatcher, EventSubscriber};
use crate::unit_of_work::UnitOfWork;

type HandleResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Appends `+count available` when copies are added to the library.
pub struct BookCreatedStats;

impl EventSubscriber for BookCreatedStats {
    fn name(&self) -> &'static str {
        "BookCreatedStats"
    }

    fn handle(&self, event: &DomainEvent, uow: &mut UnitOfWork) -> HandleResult {
        if let DomainEvent::BookCreated(data) = event {
            uow.record_stat_change(BookStatChange::new(
                ChangeId::new(),
                data.isbn.clone(),
                data.publication_date,
                i64::from(data.count),
                0,
            ));
        }
        Ok(())
    }
}

/// Appends `-1 available / +1 borrowed` when a copy is borrowed.
pub struct BookBorrowedStats;

impl EventSubscriber for BookBorrowedStats {
    fn name(&self) -> &'static str {
        "BookBorrowedStats"
    }

    fn handle(&self, event: &DomainEvent, uow: &mut UnitOfWork) -> HandleResult {
        if let DomainEvent::BookBorrowed(data) = event {
            uow.record_stat_change(BookStatChange::new(
                ChangeId::new(),
                data.isbn.clone(),
                data.publication_date,
                -1,
                1,
            ));
        }
        Ok(())
    }
}

/// Appends `+1 available / -1 borrowed` when a copy comes back.
pub struct BookReturnedStats;

impl EventSubscriber for BookReturnedStats {
    fn name(&self) -> &'static str {
        "BookReturnedStats"
    }

    fn handle(&self, event: &DomainEvent, uow: &mut UnitOfWork) -> HandleResult {
        if let DomainEvent::BookReturned(data) = event {
            uow.record_stat_change(BookStatChange::new(
                ChangeId::new(),
                data.isbn.clone(),
                data.publication_date,
                1,
                -1,
            ));
        }
        Ok(())
    }
}

/// Logs and counts abonent registrations.
pub struct AbonentRegisteredAudit;

impl EventSubscriber for AbonentRegisteredAudit {
    fn name(&self) -> &'static str {
        "AbonentRegisteredAudit"
    }

    fn handle(&self, event: &DomainEvent, _uow: &mut UnitOfWork) -> HandleResult {
        if let DomainEvent::AbonentRegistered(data) = event {
            tracing::info!(abonent_id = %data.abonent_id, "abonent registered");
            metrics::counter!("abonents_registered").increment(1);
        }
        Ok(())
    }
}

/// Builds the dispatch table the system runs with.
pub fn default_dispatcher() -> EventDispatcher {
    EventDispatcher::builder()
        .subscribe(EventKind::BookCreated, Arc::new(BookCreatedStats))
        .subscribe(EventKind::BookBorrowed, Arc::new(BookBorrowedStats))
        .subscribe(EventKind::BookReturned, Arc::new(BookReturnedStats))
        .subscribe(EventKind::AbonentRegistered, Arc::new(AbonentRegisteredAudit))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use common::{AbonentId, BookId};
    use domain::{Isbn, PublicationDate};

    fn isbn() -> Isbn {
        Isbn::new("9780134434421").unwrap()
    }

    fn date() -> PublicationDate {
        PublicationDate::new(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap())
    }

    #[test]
    fn created_event_adds_positive_available_delta() {
        let mut uow = UnitOfWork::new();
        let event = DomainEvent::book_created(
            domain::BookTitle::new("Refactoring").unwrap(),
            isbn(),
            date(),
            10,
        );

        BookCreatedStats.handle(&event, &mut uow).unwrap();

        let changes = uow.stat_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].available_count, 10);
        assert_eq!(changes[0].borrowed_count, 0);
    }

    #[test]
    fn borrowed_event_moves_one_copy_to_borrowed() {
        let mut uow = UnitOfWork::new();
        let event = DomainEvent::book_borrowed(
            BookId::new(),
            AbonentId::new(),
            isbn(),
            date(),
            Utc::now(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        );

        BookBorrowedStats.handle(&event, &mut uow).unwrap();

        let changes = uow.stat_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].available_count, -1);
        assert_eq!(changes[0].borrowed_count, 1);
    }

    #[test]
    fn returned_event_moves_one_copy_back() {
        let mut uow = UnitOfWork::new();
        let event = DomainEvent::book_returned(
            BookId::new(),
            AbonentId::new(),
            isbn(),
            date(),
            Utc::now(),
        );

        BookReturnedStats.handle(&event, &mut uow).unwrap();

        let changes = uow.stat_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].available_count, 1);
        assert_eq!(changes[0].borrowed_count, -1);
    }

    #[test]
    fn subscribers_ignore_foreign_events() {
        let mut uow = UnitOfWork::new();
        let event = DomainEvent::abonent_registered(AbonentId::new());

        BookCreatedStats.handle(&event, &mut uow).unwrap();
        BookBorrowedStats.handle(&event, &mut uow).unwrap();
        BookReturnedStats.handle(&event, &mut uow).unwrap();

        assert!(uow.stat_changes().is_empty());
    }

    #[test]
    fn default_dispatcher_wires_every_kind() {
        let dispatcher = default_dispatcher();
        assert_eq!(dispatcher.subscriber_count(EventKind::BookCreated), 1);
        assert_eq!(dispatcher.subscriber_count(EventKind::BookBorrowed), 1);
        assert_eq!(dispatcher.subscriber_count(EventKind::BookReturned), 1);
        assert_eq!(dispatcher.subscriber_count(EventKind::AbonentRegistered), 1);
    }
}
