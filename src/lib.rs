//! eonetd - EONET event snapshot service.
//!
//! Fetches a bounded batch of natural-event records from NASA's EONET feed
//! once at startup, flattens each event's geometry entries into individual
//! rows in an embedded SQLite store, and serves two read-only endpoints
//! returning the stored rows ordered by `title` or by `date`.
//!
//! # Architecture
//!
//! - **Feed**: typed payload schema, bounded HTTP fetch, startup ingestion pass
//! - **Storage**: SQLite-backed event store with a secondary ordering index
//! - **Server**: axum router exposing the two ordered query endpoints
//! - **Config**: YAML configuration with CLI/env overrides

pub mod config;
pub mod feed;
pub mod server;
pub mod storage;

pub use config::AppConfig;
pub use feed::{DEFAULT_GROUPING_KEY, FeedClient};
pub use storage::{EventRow, EventStore, OrderBy};
