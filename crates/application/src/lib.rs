//! Application layer for the book lending system.
//!
//! Ties the domain and the store together:
//! - [`UnitOfWork`] accumulates aggregate changes and outbox rows for one
//!   atomic commit
//! - [`EventDispatcher`] drains, reduces, and publishes domain events to an
//!   explicit dispatch table before the commit
//! - statistics delta [`subscribers`] translate events into outbox rows
//! - [`LibraryService`] exposes the command use cases

pub mod commands;
pub mod dispatcher;
pub mod error;
pub mod service;
pub mod subscribers;
pub mod unit_of_work;

pub use commands::{AddBooks, BorrowBook, BorrowTarget, NewAuthor, RegisterAbonent, ReturnBook};
pub use dispatcher::{DispatchError, EventDispatcher, EventSubscriber, MAX_DISPATCH_PASSES};
pub use error::AppError;
pub use service::LibraryService;
pub use subscribers::default_dispatcher;
pub use unit_of_work::UnitOfWork;
