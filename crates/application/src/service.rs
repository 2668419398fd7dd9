//! Use cases of the lending system.

use std::sync::Arc;

use chrono::Utc;
use common::{AbonentId, BookId};
use domain::{
    Abonement, Abonent, AbonentName, Author, Book, BookTitle, Email, Isbn, PublicationDate,
};
use lending_store::{LendingStore, StoreError};
use thiserror::Error;

use crate::commands::{AddBooks, BorrowBook, BorrowTarget, RegisterAbonent, ReturnBook};
use crate::dispatcher::{DispatchError, EventDispatcher};
use crate::error::AppError;
use crate::subscribers::default_dispatcher;
use crate::unit_of_work::UnitOfWork;

/// Command-side entry points of the lending system.
///
/// Each use case runs as one request-scoped unit of work: load, call the
/// aggregate, then save. Saving dispatches the recorded domain events to
/// the injected dispatch table before committing, so statistics deltas land
/// in the same transaction as the aggregate write.
pub struct LibraryService<S: LendingStore> {
    store: Arc<S>,
    dispatcher: Arc<EventDispatcher>,
}

/// Failure inside "save changes": either event dispatch or the commit.
#[derive(Debug, Error)]
enum SaveError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl<S: LendingStore> LibraryService<S> {
    /// Creates a service with an explicit dispatch table.
    pub fn new(store: Arc<S>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// Creates a service wired with the default subscribers.
    pub fn with_default_subscribers(store: Arc<S>) -> Self {
        Self::new(store, Arc::new(default_dispatcher()))
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Adds `count` identical copies of a book to the library.
    ///
    /// All copies are created in one unit of work; the reducer collapses
    /// their events so the outbox receives a single `+count` delta.
    #[tracing::instrument(skip(self, cmd), fields(isbn = %cmd.isbn, count = cmd.count))]
    pub async fn add_books(&self, cmd: AddBooks) -> Result<Vec<BookId>, AppError> {
        let title = BookTitle::new(cmd.title)?;
        let isbn = Isbn::new(cmd.isbn)?;
        let publication_date = PublicationDate::new(cmd.publication_date);

        let mut authors = Vec::with_capacity(cmd.authors.len());
        for author in cmd.authors {
            authors.push(Author::new(author.name, author.surname, author.patronymic)?);
        }

        let created_at = Utc::now();
        let mut uow = UnitOfWork::new();
        let mut ids = Vec::with_capacity(cmd.count as usize);

        for _ in 0..cmd.count {
            let book = Book::new(
                BookId::new(),
                title.clone(),
                isbn.clone(),
                publication_date,
                authors.clone(),
                created_at,
            )?;
            ids.push(book.id());
            uow.track_book(book);
        }

        if ids.is_empty() {
            return Ok(ids);
        }

        self.save(uow)
            .await
            .map_err(|e| operation_failed("adding books", "BL019", e))?;

        tracing::info!(added = ids.len(), "added new books");
        Ok(ids)
    }

    /// Borrows a copy for an abonent.
    ///
    /// The abonement (current loan count) is recomputed from live data on
    /// every attempt; the aggregate enforces the borrow window and the
    /// concurrent loan limit.
    #[tracing::instrument(skip(self, cmd), fields(abonent_id = %cmd.abonent_id))]
    pub async fn borrow_book(&self, cmd: BorrowBook) -> Result<BookId, AppError> {
        let mut book = self.fetch_borrow_target(&cmd.target).await?;

        let borrowed_count = self
            .store
            .count_borrowed_by(cmd.abonent_id)
            .await
            .map_err(|e| operation_failed("borrowing book", "BL026", e))?;
        let abonement = Abonement::new(cmd.abonent_id, borrowed_count)?;

        book.borrow(&abonement, Utc::now(), cmd.return_before)?;
        let book_id = book.id();

        let mut uow = UnitOfWork::new();
        uow.track_book(book);
        self.save(uow)
            .await
            .map_err(|e| operation_failed("borrowing book", "BL026", e))?;

        tracing::info!(book_id = %book_id, "borrow request processed");
        Ok(book_id)
    }

    /// Returns a borrowed copy to the library.
    #[tracing::instrument(skip(self, cmd), fields(book_id = %cmd.book_id, abonent_id = %cmd.abonent_id))]
    pub async fn return_book(&self, cmd: ReturnBook) -> Result<(), AppError> {
        let mut book = self
            .store
            .book(cmd.book_id)
            .await
            .map_err(|e| operation_failed("returning book", "BL030", e))?
            .ok_or(AppError::BookNotFound)?;

        book.return_to_library(cmd.abonent_id, Utc::now())?;

        let mut uow = UnitOfWork::new();
        uow.track_book(book);
        self.save(uow)
            .await
            .map_err(|e| operation_failed("returning book", "BL030", e))?;

        tracing::info!("book returned");
        Ok(())
    }

    /// Registers a new abonent.
    ///
    /// The store's unique email constraint is translated into
    /// [`AppError::EmailAlreadyExists`].
    #[tracing::instrument(skip(self, cmd))]
    pub async fn register_abonent(&self, cmd: RegisterAbonent) -> Result<AbonentId, AppError> {
        let name = AbonentName::new(cmd.name, cmd.surname, cmd.patronymic)?;
        let email = Email::new(cmd.email)?;

        let abonent = Abonent::new(AbonentId::new(), name, email, Utc::now())?;
        let abonent_id = abonent.id();

        let mut uow = UnitOfWork::new();
        uow.track_abonent(abonent);

        match self.save(uow).await {
            Ok(()) => {
                tracing::info!(abonent_id = %abonent_id, "abonent registered");
                Ok(abonent_id)
            }
            Err(SaveError::Store(StoreError::EmailTaken { email })) => {
                tracing::info!(email, "registration rejected, email already exists");
                Err(AppError::EmailAlreadyExists)
            }
            Err(e) => Err(operation_failed("registering abonent", "BL021", e)),
        }
    }

    /// Loads a book copy by id.
    pub async fn book(&self, id: BookId) -> Result<Option<Book>, AppError> {
        self.store
            .book(id)
            .await
            .map_err(|e| operation_failed("getting book", "BL020", e))
    }

    async fn fetch_borrow_target(&self, target: &BorrowTarget) -> Result<Book, AppError> {
        match target {
            BorrowTarget::ById(id) => self
                .store
                .book(*id)
                .await
                .map_err(|e| operation_failed("borrowing book", "BL026", e))?
                .ok_or(AppError::BookNotFound),
            BorrowTarget::ByIsbn {
                isbn,
                publication_date,
            } => {
                let isbn = Isbn::new(isbn.clone())?;
                let publication_date = publication_date.map(PublicationDate::new);
                self.store
                    .find_available_book(&isbn, publication_date)
                    .await
                    .map_err(|e| operation_failed("borrowing book", "BL026", e))?
                    .ok_or(AppError::NoBookAvailable)
            }
        }
    }

    /// Dispatches pending domain events, then commits the unit of work.
    async fn save(&self, mut uow: UnitOfWork) -> Result<(), SaveError> {
        self.dispatcher.dispatch(&mut uow)?;
        self.store.commit(uow.into_changes()).await?;
        Ok(())
    }
}

/// Collapses an infrastructure failure into a generic per-operation outcome,
/// keeping the cause in the log.
fn operation_failed(
    operation: &'static str,
    code: &'static str,
    err: impl std::error::Error,
) -> AppError {
    tracing::error!(code, error = %err, "{operation} failed");
    AppError::OperationFailed { operation, code }
}
