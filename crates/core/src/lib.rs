//! Core domain types and shared logic for the Ladder leaderboard store.
//!
//! This crate defines the data model used by the cache and the CLI:
//! - Board and table names, validated before they reach any SQL
//! - Time windows and their epoch-aligned reset grid
//! - Query results (`Entry`) including sentinel placeholders
//! - The external collaborators that feed ingestion (metric resolver, identity provider)
//! - Configuration for the storage backends

pub mod board;
pub mod config;
pub mod entry;
pub mod error;
pub mod provider;
pub mod window;

pub use board::{BoardName, TableName};
pub use entry::{Entry, EntryKind};
pub use error::{Error, Result};
pub use provider::{
    DisplayMeta, EntityRef, IdentityProvider, MetricResolver, NoIdentity, ResolveError, metric_key,
};
pub use window::TimeWindow;

/// Display name used for no-data placeholders unless configured otherwise.
pub const DEFAULT_NO_DATA_NAME: &str = "---";

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    // Saturate instead of wrapping for clocks far outside the i64 millisecond range
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}
