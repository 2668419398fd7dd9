//! Shared identifier types used across the lending system.

mod types;

pub use types::{AbonentId, BookId, ChangeId};
