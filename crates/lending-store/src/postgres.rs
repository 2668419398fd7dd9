use async_trait::async_trait;
use chrono::NaiveDate;
use common::{AbonentId, BookId, ChangeId};
use domain::{
    Abonent, AbonentName, Author, Book, BookTitle, BorrowInfo, Email, Isbn, PublicationDate,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::outbox::{BookStatChange, StatKey};
use crate::stats::{BookStat, CatalogEntry};
use crate::store::{LendingStore, PendingChanges};
use crate::{Result, StoreError};

const BOOK_COLUMNS: &str = "id, title, isbn, publication_date, authors, \
     borrow_abonent_id, borrowed_at, return_before, created_at";

/// PostgreSQL-backed lending store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL lending store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    fn row_to_book(row: PgRow) -> Result<Book> {
        let title = BookTitle::new(row.try_get::<String, _>("title")?).map_err(corrupt_row)?;
        let isbn = Isbn::new(row.try_get::<String, _>("isbn")?).map_err(corrupt_row)?;
        let publication_date =
            PublicationDate::new(row.try_get::<NaiveDate, _>("publication_date")?);
        let authors: Vec<Author> = serde_json::from_value(row.try_get("authors")?)?;

        let borrow_info = match row.try_get::<Option<Uuid>, _>("borrow_abonent_id")? {
            Some(abonent) => Some(BorrowInfo::new(
                AbonentId::from_uuid(abonent),
                row.try_get("borrowed_at")?,
                row.try_get("return_before")?,
            )),
            None => None,
        };

        Ok(Book::hydrate(
            BookId::from_uuid(row.try_get::<Uuid, _>("id")?),
            title,
            isbn,
            publication_date,
            authors,
            borrow_info,
            row.try_get("created_at")?,
        ))
    }

    fn row_to_abonent(row: PgRow) -> Result<Abonent> {
        let name = AbonentName::new(
            row.try_get::<String, _>("name")?,
            row.try_get::<String, _>("surname")?,
            row.try_get::<Option<String>, _>("patronymic")?,
        )
        .map_err(corrupt_row)?;
        let email = Email::new(row.try_get::<String, _>("email")?).map_err(corrupt_row)?;

        Ok(Abonent::hydrate(
            AbonentId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name,
            email,
            row.try_get("created_at")?,
        ))
    }

    fn row_to_change(row: PgRow) -> Result<BookStatChange> {
        Ok(BookStatChange::new(
            ChangeId::from_uuid(row.try_get::<Uuid, _>("id")?),
            Isbn::new(row.try_get::<String, _>("isbn")?).map_err(corrupt_row)?,
            PublicationDate::new(row.try_get::<NaiveDate, _>("publication_date")?),
            row.try_get("available_count")?,
            row.try_get("borrowed_count")?,
        ))
    }
}

/// A stored value no longer satisfies its own validation rules.
fn corrupt_row(err: impl std::fmt::Display) -> StoreError {
    StoreError::Serialization(serde_json::Error::io(std::io::Error::other(
        err.to_string(),
    )))
}

#[async_trait]
impl LendingStore for PostgresStore {
    async fn book(&self, id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(&format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_book).transpose()
    }

    async fn find_available_book(
        &self,
        isbn: &Isbn,
        publication_date: Option<PublicationDate>,
    ) -> Result<Option<Book>> {
        let row = match publication_date {
            Some(date) => {
                sqlx::query(&format!(
                    "SELECT {BOOK_COLUMNS} FROM books \
                     WHERE isbn = $1 AND publication_date = $2 AND borrow_abonent_id IS NULL \
                     ORDER BY created_at ASC LIMIT 1"
                ))
                .bind(isbn.as_str())
                .bind(date.value())
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {BOOK_COLUMNS} FROM books \
                     WHERE isbn = $1 AND borrow_abonent_id IS NULL \
                     ORDER BY created_at ASC LIMIT 1"
                ))
                .bind(isbn.as_str())
                .fetch_optional(&self.pool)
                .await?
            }
        };

        row.map(Self::row_to_book).transpose()
    }

    async fn count_borrowed_by(&self, abonent_id: AbonentId) -> Result<usize> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE borrow_abonent_id = $1")
                .bind(abonent_id.as_uuid())
                .fetch_one(&self.pool)
                .await?;

        Ok(count as usize)
    }

    async fn abonent(&self, id: AbonentId) -> Result<Option<Abonent>> {
        let row = sqlx::query(
            "SELECT id, name, surname, patronymic, email, created_at FROM abonents WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_abonent).transpose()
    }

    async fn commit(&self, changes: PendingChanges) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            books = changes.books.len(),
            abonents = changes.abonents.len(),
            stat_changes = changes.stat_changes.len(),
            "committing unit of work"
        );

        let mut tx = self.pool.begin().await?;

        // aggregate-level row locks for the whole read-modify-write
        for book in &changes.books {
            sqlx::query("SELECT 1 FROM books WHERE id = $1 FOR UPDATE")
                .bind(book.id().as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
        }

        for book in &changes.books {
            let authors = serde_json::to_value(book.authors())?;
            let info = book.borrow_info();

            sqlx::query(
                r#"
                INSERT INTO books (id, title, isbn, publication_date, authors,
                                   borrow_abonent_id, borrowed_at, return_before, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (id) DO UPDATE SET
                    title = EXCLUDED.title,
                    isbn = EXCLUDED.isbn,
                    publication_date = EXCLUDED.publication_date,
                    authors = EXCLUDED.authors,
                    borrow_abonent_id = EXCLUDED.borrow_abonent_id,
                    borrowed_at = EXCLUDED.borrowed_at,
                    return_before = EXCLUDED.return_before
                "#,
            )
            .bind(book.id().as_uuid())
            .bind(book.title().as_str())
            .bind(book.isbn().as_str())
            .bind(book.publication_date().value())
            .bind(authors)
            .bind(info.map(|i| i.abonent_id.as_uuid()))
            .bind(info.map(|i| i.borrowed_at))
            .bind(info.map(|i| i.return_before))
            .bind(book.created_at())
            .execute(&mut *tx)
            .await?;
        }

        for abonent in &changes.abonents {
            sqlx::query(
                r#"
                INSERT INTO abonents (id, name, surname, patronymic, email, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(abonent.id().as_uuid())
            .bind(abonent.name().name())
            .bind(abonent.name().surname())
            .bind(abonent.name().patronymic())
            .bind(abonent.email().as_str())
            .bind(abonent.created_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("abonents_email_key")
                {
                    return StoreError::EmailTaken {
                        email: abonent.email().as_str().to_string(),
                    };
                }
                StoreError::Database(e)
            })?;
        }

        for change in &changes.stat_changes {
            sqlx::query(
                r#"
                INSERT INTO book_stat_changes (id, isbn, publication_date,
                                               available_count, borrowed_count)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(change.id.as_uuid())
            .bind(change.isbn.as_str())
            .bind(change.publication_date.value())
            .bind(change.available_count)
            .bind(change.borrowed_count)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn pending_stat_changes(&self, limit: usize) -> Result<Vec<BookStatChange>> {
        let rows = sqlx::query(
            r#"
            SELECT id, isbn, publication_date, available_count, borrowed_count
            FROM book_stat_changes
            ORDER BY seq ASC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_change).collect()
    }

    async fn pending_stat_change_count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_stat_changes")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as usize)
    }

    async fn stat(&self, key: &StatKey) -> Result<Option<BookStat>> {
        let row = sqlx::query(
            r#"
            SELECT isbn, publication_date, title, authors, available_count, borrowed_count
            FROM book_stats
            WHERE isbn = $1 AND publication_date = $2
            "#,
        )
        .bind(key.isbn.as_str())
        .bind(key.publication_date.value())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(BookStat {
                key: StatKey::new(
                    Isbn::new(row.try_get::<String, _>("isbn")?).map_err(corrupt_row)?,
                    PublicationDate::new(row.try_get::<NaiveDate, _>("publication_date")?),
                ),
                title: row.try_get("title")?,
                authors: row.try_get("authors")?,
                available_count: row.try_get("available_count")?,
                borrowed_count: row.try_get("borrowed_count")?,
            })),
            None => Ok(None),
        }
    }

    async fn catalog_entry(&self, key: &StatKey) -> Result<Option<CatalogEntry>> {
        let row = sqlx::query(
            r#"
            SELECT title, authors
            FROM books
            WHERE isbn = $1 AND publication_date = $2
            LIMIT 1
            "#,
        )
        .bind(key.isbn.as_str())
        .bind(key.publication_date.value())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let authors: Vec<Author> = serde_json::from_value(row.try_get("authors")?)?;
                Ok(Some(CatalogEntry {
                    title: row.try_get("title")?,
                    authors: crate::stats::authors_line(&authors),
                }))
            }
            None => Ok(None),
        }
    }

    async fn commit_stat_batch(
        &self,
        upserts: Vec<BookStat>,
        processed: Vec<ChangeId>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for stat in &upserts {
            sqlx::query(
                r#"
                INSERT INTO book_stats (isbn, publication_date, title, authors,
                                        available_count, borrowed_count)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (isbn, publication_date) DO UPDATE SET
                    title = EXCLUDED.title,
                    authors = EXCLUDED.authors,
                    available_count = EXCLUDED.available_count,
                    borrowed_count = EXCLUDED.borrowed_count
                "#,
            )
            .bind(stat.key.isbn.as_str())
            .bind(stat.key.publication_date.value())
            .bind(&stat.title)
            .bind(&stat.authors)
            .bind(stat.available_count)
            .bind(stat.borrowed_count)
            .execute(&mut *tx)
            .await?;
        }

        let processed: Vec<Uuid> = processed.iter().map(ChangeId::as_uuid).collect();
        sqlx::query("DELETE FROM book_stat_changes WHERE id = ANY($1)")
            .bind(&processed)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
