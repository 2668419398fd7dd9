use chrono::{NaiveDate, Utc};
use common::{AbonentId, BookId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Abonement, Author, Book, BookTitle, Entity, Isbn, PublicationDate, reducer};

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

fn bench_borrow_return_cycle(c: &mut Criterion) {
    let abonement = Abonement::new(AbonentId::new(), 0).unwrap();

    c.bench_function("domain/borrow_return_cycle", |b| {
        b.iter(|| {
            let mut book = new_book();
            book.take_events();
            book.borrow(&abonement, Utc::now(), None).unwrap();
            book.return_to_library(abonement.abonent_id(), Utc::now())
                .unwrap();
            book.take_events()
        });
    });
}

fn bench_reduce_bulk_created(c: &mut Criterion) {
    c.bench_function("domain/reduce_100_created_events", |b| {
        b.iter(|| {
            let events: Vec<_> = (0..100)
                .map(|_| new_book().take_events().remove(0))
                .collect();
            reducer::reduce(events)
        });
    });
}

criterion_group!(benches, bench_borrow_return_cycle, bench_reduce_bulk_created);
criterion_main!(benches);
