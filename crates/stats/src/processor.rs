//! Outbox batch processor.

use std::sync::Arc;
use std::time::Duration;

use lending_store::{LendingStore, Result};

use crate::config::ProcessorConfig;
use crate::fold::{apply_to_stat, fold_changes, new_stat};

/// Drains the statistics outbox and folds it into the read model.
///
/// Runs independently of the primary write path; the two share only the
/// store. A batch is applied and retired in one transaction, so aborting
/// mid-batch never double-applies a delta: every row stays pending and the
/// whole batch is retried, which is safe because the fold is a pure
/// sum-then-clamp.
///
/// The processor is the single writer of `BookStat` rows. [`spawn`] consumes
/// the processor, so one instance drives at most one worker loop and batches
/// never overlap.
///
/// [`spawn`]: StatChangeProcessor::spawn
pub struct StatChangeProcessor<S> {
    store: Arc<S>,
    batch_size: usize,
}

impl<S: LendingStore + 'static> StatChangeProcessor<S> {
    /// Creates a processor reading up to `batch_size` rows per run.
    pub fn new(store: Arc<S>, batch_size: usize) -> Self {
        Self { store, batch_size }
    }

    /// Creates a processor from configuration.
    pub fn from_config(store: Arc<S>, config: &ProcessorConfig) -> Self {
        Self::new(store, config.batch_size)
    }

    /// Processes one batch; returns how many outbox rows were retired.
    ///
    /// Rows are fetched in strict insertion order, folded per key, applied
    /// to existing rows (update) or combined with catalog metadata into new
    /// ones (insert), then retired together with the upserts.
    #[tracing::instrument(skip(self))]
    pub async fn run_once(&self) -> Result<usize> {
        let pending = self.store.pending_stat_changes(self.batch_size).await?;
        if pending.is_empty() {
            return Ok(0);
        }

        let folded = fold_changes(&pending);
        let mut upserts = Vec::with_capacity(folded.len());

        for (key, delta) in folded {
            match self.store.stat(&key).await? {
                Some(mut stat) => {
                    apply_to_stat(&mut stat, &delta);
                    upserts.push(stat);
                }
                None => match self.store.catalog_entry(&key).await? {
                    Some(entry) => upserts.push(new_stat(key, entry, &delta)),
                    None => {
                        // no such book in the catalog; retire the delta with no effect
                        tracing::warn!(key = %key, "no catalog entry for statistics key");
                    }
                },
            }
        }

        let processed = pending.iter().map(|change| change.id).collect();
        self.store.commit_stat_batch(upserts, processed).await?;

        metrics::counter!("book_stat_changes_processed").increment(pending.len() as u64);
        tracing::debug!(rows = pending.len(), "statistics batch applied");

        Ok(pending.len())
    }

    /// Runs [`run_once`] on a fixed interval until the task is aborted.
    ///
    /// A failed batch is logged and retried on the next tick.
    ///
    /// [`run_once`]: StatChangeProcessor::run_once
    pub fn spawn(self, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(e) = self.run_once().await {
                    tracing::error!(error = %e, "statistics batch failed, will retry");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::ChangeId;
    use domain::{Isbn, PublicationDate};
    use lending_store::{BookStatChange, InMemoryStore, PendingChanges, StatKey};

    fn key() -> StatKey {
        StatKey::new(
            Isbn::new("9780134434421").unwrap(),
            PublicationDate::new(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap()),
        )
    }

    fn change(available: i64, borrowed: i64) -> BookStatChange {
        let key = key();
        BookStatChange::new(
            ChangeId::new(),
            key.isbn,
            key.publication_date,
            available,
            borrowed,
        )
    }

    async fn store_with_catalog() -> Arc<InMemoryStore> {
        use chrono::Utc;
        use common::BookId;
        use domain::{Author, Book, BookTitle};

        let store = Arc::new(InMemoryStore::new());
        let book = Book::new(
            BookId::new(),
            BookTitle::new("Refactoring").unwrap(),
            Isbn::new("9780134434421").unwrap(),
            PublicationDate::new(NaiveDate::from_ymd_opt(2024, 1, 24).unwrap()),
            vec![Author::new("Martin", "Fowler", None).unwrap()],
            Utc::now(),
        )
        .unwrap();
        store
            .commit(PendingChanges {
                books: vec![book],
                ..Default::default()
            })
            .await
            .unwrap();
        store
    }

    async fn append(store: &InMemoryStore, changes: Vec<BookStatChange>) {
        store
            .commit(PendingChanges {
                stat_changes: changes,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn inserts_new_row_with_catalog_metadata() {
        let store = store_with_catalog().await;
        append(&store, vec![change(10, 0)]).await;

        let processor = StatChangeProcessor::new(store.clone(), 100);
        let processed = processor.run_once().await.unwrap();
        assert_eq!(processed, 1);

        let stat = store.stat(&key()).await.unwrap().unwrap();
        assert_eq!(stat.available_count, 10);
        assert_eq!(stat.borrowed_count, 0);
        assert_eq!(stat.title, "Refactoring");
        assert_eq!(stat.authors, "Fowler Martin");
        assert_eq!(store.pending_stat_change_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn updates_existing_row() {
        let store = store_with_catalog().await;
        let processor = StatChangeProcessor::new(store.clone(), 100);

        append(&store, vec![change(10, 0)]).await;
        processor.run_once().await.unwrap();

        append(&store, vec![change(-1, 1)]).await;
        processor.run_once().await.unwrap();

        let stat = store.stat(&key()).await.unwrap().unwrap();
        assert_eq!(stat.available_count, 9);
        assert_eq!(stat.borrowed_count, 1);
    }

    #[tokio::test]
    async fn folds_a_batch_per_key_before_applying() {
        let store = store_with_catalog().await;
        append(
            &store,
            vec![change(10, 0), change(-1, 1), change(1, -1), change(-1, 1)],
        )
        .await;

        let processor = StatChangeProcessor::new(store.clone(), 100);
        processor.run_once().await.unwrap();

        let stat = store.stat(&key()).await.unwrap().unwrap();
        assert_eq!(stat.available_count, 9);
        assert_eq!(stat.borrowed_count, 1);
    }

    #[tokio::test]
    async fn negative_sums_are_clamped_to_zero() {
        let store = store_with_catalog().await;
        append(&store, vec![change(-4, -2)]).await;

        let processor = StatChangeProcessor::new(store.clone(), 100);
        processor.run_once().await.unwrap();

        let stat = store.stat(&key()).await.unwrap().unwrap();
        assert_eq!(stat.available_count, 0);
        assert_eq!(stat.borrowed_count, 0);
    }

    #[tokio::test]
    async fn batch_size_bounds_one_run() {
        let store = store_with_catalog().await;
        append(&store, vec![change(1, 0), change(1, 0), change(1, 0)]).await;

        let processor = StatChangeProcessor::new(store.clone(), 2);
        assert_eq!(processor.run_once().await.unwrap(), 2);
        assert_eq!(store.pending_stat_change_count().await.unwrap(), 1);

        assert_eq!(processor.run_once().await.unwrap(), 1);
        let stat = store.stat(&key()).await.unwrap().unwrap();
        assert_eq!(stat.available_count, 3);
    }

    #[tokio::test]
    async fn rerun_after_drain_changes_nothing() {
        let store = store_with_catalog().await;
        append(&store, vec![change(10, 0)]).await;

        let processor = StatChangeProcessor::new(store.clone(), 100);
        processor.run_once().await.unwrap();
        let first = store.stat(&key()).await.unwrap().unwrap();

        assert_eq!(processor.run_once().await.unwrap(), 0);
        let second = store.stat(&key()).await.unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_catalog_key_is_retired_without_effect() {
        let store = Arc::new(InMemoryStore::new());
        append(&store, vec![change(5, 0)]).await;

        let processor = StatChangeProcessor::new(store.clone(), 100);
        assert_eq!(processor.run_once().await.unwrap(), 1);

        assert!(store.stat(&key()).await.unwrap().is_none());
        assert_eq!(store.pending_stat_change_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_outbox_is_a_no_op() {
        let store = Arc::new(InMemoryStore::new());
        let processor = StatChangeProcessor::new(store, 100);
        assert_eq!(processor.run_once().await.unwrap(), 0);
    }
}
