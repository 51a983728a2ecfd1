//! Storage Layer
//!
//! SQLite-backed store for flattened feed events. Every row carries the same
//! grouping-key value so a single equality-scoped query can return the whole
//! dataset in either sort order:
//!
//! - the primary key `(id, title, date)` serves the title ordering
//! - a secondary index on `(id, date)` serves the date ordering
//!
//! # Components
//!
//! - [`EventStore`]: connection owner; table setup, upserts, ordered queries
//! - [`EventRow`] / [`OrderBy`]: row shape and ordering attribute
//! - [`WriteReport`]: per-row failure report from batch writes

mod error;
mod event_store;
mod row;

pub use error::StorageError;
pub use event_store::{EventStore, WriteReport};
pub use row::{EventRow, OrderBy};
