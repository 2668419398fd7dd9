//! Eventually-consistent availability statistics.
//!
//! The primary write path appends signed deltas to a durable outbox; this
//! crate drains that outbox in insertion order and folds the deltas into
//! the `BookStat` read model:
//! - [`fold`] provides the pure sum-then-clamp folding step
//! - [`StatChangeProcessor`] is the periodic batch worker

pub mod config;
pub mod fold;
pub mod processor;

pub use config::ProcessorConfig;
pub use fold::{StatDelta, apply_to_stat, clamp_non_negative, fold_changes, new_stat};
pub use processor::StatChangeProcessor;
