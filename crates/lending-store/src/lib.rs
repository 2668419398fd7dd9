//! Persistence adapter for the book lending system.
//!
//! The core only requires a narrow surface from its database: commit a unit
//! of work atomically, load aggregates, append statistics deltas to the
//! outbox, and fold those deltas into the read model. This crate defines
//! that surface ([`LendingStore`]) together with the durable row types, and
//! provides two implementations:
//! - [`InMemoryStore`] for tests and examples
//! - [`PostgresStore`] backed by `sqlx`

pub mod error;
pub mod memory;
pub mod outbox;
pub mod postgres;
pub mod stats;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use outbox::{BookStatChange, StatKey};
pub use postgres::PostgresStore;
pub use stats::{BookStat, CatalogEntry, authors_line};
pub use store::{LendingStore, PendingChanges};
