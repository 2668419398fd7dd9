//! Domain layer for the book lending system.
//!
//! This crate provides the core domain model:
//! - [`Entity`] trait giving aggregates an in-memory domain event buffer
//! - [`DomainEvent`] enum with the facts aggregates record
//! - `Book` aggregate with the borrow/return state machine
//! - `Abonent` aggregate for registered patrons
//! - [`reducer`] for collapsing redundant events within one unit of work

pub mod abonent;
pub mod book;
pub mod entity;
pub mod error;
pub mod event;
pub mod reducer;

pub use abonent::{Abonent, AbonentError, AbonentName, Email};
pub use book::{
    Abonement, Author, Book, BookError, BookTitle, BorrowInfo, Isbn, PublicationDate,
    MAX_BORROWED_BOOKS,
};
pub use entity::Entity;
pub use error::DomainError;
pub use event::{
    AbonentRegisteredData, BookBorrowedData, BookCreatedData, BookReturnedData, DomainEvent,
    EventKind,
};
