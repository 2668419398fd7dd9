//! Collapses redundant domain events within one unit of work.

use crate::book::{BookTitle, Isbn, PublicationDate};
use crate::event::DomainEvent;

/// Reduces a drained event batch.
///
/// `BookCreated` events with identical `(title, isbn, publication_date)` are
/// merged into a single event carrying the summed count; a bulk add of N
/// identical copies becomes one `BookCreated { count: N }`. All other events
/// pass through unchanged, keeping their relative order; merged events are
/// appended after them in first-occurrence order of their key.
pub fn reduce(events: Vec<DomainEvent>) -> Vec<DomainEvent> {
    // nothing to reduce
    if events.len() <= 1 {
        return events;
    }

    let mut reduced = Vec::with_capacity(events.len());
    let mut created: Vec<((BookTitle, Isbn, PublicationDate), u32)> = Vec::new();

    for event in events {
        match event {
            DomainEvent::BookCreated(data) => {
                let key = (data.title, data.isbn, data.publication_date);
                match created.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, count)) => *count += data.count,
                    None => created.push((key, data.count)),
                }
            }
            other => reduced.push(other),
        }
    }

    for ((title, isbn, publication_date), count) in created {
        reduced.push(DomainEvent::book_created(title, isbn, publication_date, count));
    }

    reduced
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use common::{AbonentId, BookId};

    fn created(title: &str, isbn: &str) -> DomainEvent {
        DomainEvent::book_created(
            BookTitle::new(title).unwrap(),
            Isbn::new(isbn).unwrap(),
            PublicationDate::new(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap()),
            1,
        )
    }

    fn returned() -> DomainEvent {
        DomainEvent::book_returned(
            BookId::new(),
            AbonentId::new(),
            Isbn::new("9780134434421").unwrap(),
            PublicationDate::new(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap()),
            Utc::now(),
        )
    }

    #[test]
    fn single_event_passes_through_untouched() {
        let events = vec![created("Refactoring", "9780134434421")];
        let reduced = reduce(events.clone());
        assert_eq!(reduced, events);
    }

    #[test]
    fn empty_batch_stays_empty() {
        assert!(reduce(vec![]).is_empty());
    }

    #[test]
    fn identical_created_events_merge_into_one_counted_event() {
        let events = vec![
            created("Refactoring", "9780134434421"),
            created("Refactoring", "9780134434421"),
            created("Refactoring", "9780134434421"),
        ];

        let reduced = reduce(events);
        assert_eq!(reduced.len(), 1);
        assert!(matches!(
            &reduced[0],
            DomainEvent::BookCreated(data) if data.count == 3
        ));
    }

    #[test]
    fn different_keys_stay_separate() {
        let events = vec![
            created("Refactoring", "9780134434421"),
            created("Refactoring", "9780134434421"),
            created("Domain-Driven Design", "0321125215"),
        ];

        let reduced = reduce(events);
        assert_eq!(reduced.len(), 2);
        assert!(matches!(
            &reduced[0],
            DomainEvent::BookCreated(data) if data.count == 2 && data.isbn.as_str() == "9780134434421"
        ));
        assert!(matches!(
            &reduced[1],
            DomainEvent::BookCreated(data) if data.count == 1 && data.isbn.as_str() == "0321125215"
        ));
    }

    #[test]
    fn other_events_keep_relative_order() {
        let first_return = returned();
        let second_return = returned();
        let events = vec![
            first_return.clone(),
            created("Refactoring", "9780134434421"),
            second_return.clone(),
            created("Refactoring", "9780134434421"),
        ];

        let reduced = reduce(events);
        assert_eq!(reduced.len(), 3);
        assert_eq!(reduced[0], first_return);
        assert_eq!(reduced[1], second_return);
        assert!(matches!(
            &reduced[2],
            DomainEvent::BookCreated(data) if data.count == 2
        ));
    }

    #[test]
    fn counted_events_sum_their_counts() {
        let key_title = BookTitle::new("Refactoring").unwrap();
        let key_isbn = Isbn::new("9780134434421").unwrap();
        let key_date = PublicationDate::new(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap());
        let events = vec![
            DomainEvent::book_created(key_title.clone(), key_isbn.clone(), key_date, 2),
            DomainEvent::book_created(key_title, key_isbn, key_date, 5),
        ];

        let reduced = reduce(events);
        assert_eq!(reduced.len(), 1);
        assert!(matches!(
            &reduced[0],
            DomainEvent::BookCreated(data) if data.count == 7
        ));
    }
}
