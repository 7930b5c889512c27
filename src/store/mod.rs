//! Durable write contracts and the implementations shipped with the crate.
//!
//! Sources append `(timestamp, value)` lines through [`RecordSink`]; the
//! snapshot engine submits whole records through [`SnapshotStore`]. Both are
//! append-only from this crate's perspective: nothing here reads back, updates,
//! or deletes what it wrote.

mod migrations;

pub mod csv;
pub mod sqlite;

use anyhow::Result;

use crate::snapshot::SnapshotRecord;

/// Per-source data sink. `append` is fire-and-forget from the source's point
/// of view: callers log a failure and move on.
pub trait RecordSink: Send + Sync {
    fn append(&self, timestamp_ms: i64, value: &str) -> Result<()>;

    /// Push buffered data to durable storage. Called when a source stops.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Append-only store for snapshot records.
pub trait SnapshotStore: Send + Sync {
    fn insert(&self, record: &SnapshotRecord) -> Result<()>;
}
