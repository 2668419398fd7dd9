use chrono::NaiveDate;
use common::ChangeId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Isbn, PublicationDate};
use lending_store::BookStatChange;
use stats::fold_changes;

fn make_changes(keys: usize, per_key: usize) -> Vec<BookStatChange> {
    let date = PublicationDate::new(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap());
    let mut changes = Vec::with_capacity(keys * per_key);
    for key in 0..keys {
        let isbn = Isbn::new(format!("97801344{key:05}")).unwrap();
        for i in 0..per_key {
            let (available, borrowed) = if i % 2 == 0 { (-1, 1) } else { (1, -1) };
            changes.push(BookStatChange::new(
                ChangeId::new(),
                isbn.clone(),
                date,
                available,
                borrowed,
            ));
        }
    }
    changes
}

fn bench_fold_batch(c: &mut Criterion) {
    let changes = make_changes(20, 50);

    c.bench_function("stats/fold_1000_changes_20_keys", |b| {
        b.iter(|| fold_changes(&changes));
    });
}

criterion_group!(benches, bench_fold_batch);
criterion_main!(benches);
