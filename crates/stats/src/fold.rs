//! Pure folding of outbox deltas into statistics rows.

use lending_store::{BookStat, BookStatChange, CatalogEntry, StatKey};

/// Summed per-key delta of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatDelta {
    /// Net change in available copies.
    pub available: i64,

    /// Net change in borrowed copies.
    pub borrowed: i64,
}

/// Groups a batch by `(isbn, publication_date)` and sums the deltas per key.
///
/// This is the idempotent-folding step: the fold is a pure sum, so replaying
/// the same batch after a crash-and-retry produces the same per-key deltas.
/// Keys come out in first-occurrence order, which preserves the per-key
/// insertion order of the outbox.
pub fn fold_changes(changes: &[BookStatChange]) -> Vec<(StatKey, StatDelta)> {
    let mut folded: Vec<(StatKey, StatDelta)> = Vec::new();

    for change in changes {
        let key = change.key();
        match folded.iter_mut().find(|(k, _)| *k == key) {
            Some((_, delta)) => {
                delta.available += change.available_count;
                delta.borrowed += change.borrowed_count;
            }
            None => folded.push((
                key,
                StatDelta {
                    available: change.available_count,
                    borrowed: change.borrowed_count,
                },
            )),
        }
    }

    folded
}

/// Clamps a counter to zero.
///
/// A delta stream can transiently sum below zero when retries reorder work
/// across batches; a negative counter is an artifact and must never be
/// persisted.
pub fn clamp_non_negative(value: i64) -> i64 {
    value.max(0)
}

/// Adds a summed delta to an existing row, clamping both counters.
pub fn apply_to_stat(stat: &mut BookStat, delta: &StatDelta) {
    stat.available_count = clamp_non_negative(clamp_non_negative(stat.available_count) + delta.available);
    stat.borrowed_count = clamp_non_negative(clamp_non_negative(stat.borrowed_count) + delta.borrowed);
}

/// Builds a fresh row for a key that has no statistics yet.
pub fn new_stat(key: StatKey, entry: CatalogEntry, delta: &StatDelta) -> BookStat {
    BookStat {
        key,
        title: entry.title,
        authors: entry.authors,
        available_count: clamp_non_negative(delta.available),
        borrowed_count: clamp_non_negative(delta.borrowed),
    }
}
