//! Store trait definitions

use chrono::{DateTime, Local};
use std::time::Duration;

use crate::{AuditEvent, StoreResult};

/// Durable key/value store for the usage counters.
///
/// Reads never fail because a value is missing or undecodable: the default
/// (zero, or the supplied `now`) is persisted and returned instead, so a
/// corrupted field heals to a safe baseline. Only I/O failures are errors.
pub trait CounterStore: Send + Sync {
    // Counters

    /// Read a duration, persisting zero if absent
    fn read_duration(&self, key: &str) -> StoreResult<Duration>;

    /// Read a timestamp, persisting `now` if absent
    fn read_timestamp(&self, key: &str, now: DateTime<Local>) -> StoreResult<DateTime<Local>>;

    /// Overwrite a duration; durable on return
    fn write_duration(&self, key: &str, value: Duration) -> StoreResult<()>;

    /// Overwrite a timestamp; durable on return
    fn write_timestamp(&self, key: &str, value: DateTime<Local>) -> StoreResult<()>;

    /// Add `delta` to a duration and return the new value.
    ///
    /// Not atomic against other writers; the tracker is the only one.
    fn increment(&self, key: &str, delta: Duration) -> StoreResult<Duration> {
        let value = self.read_duration(key)?.saturating_add(delta);
        self.write_duration(key, value)?;
        Ok(value)
    }

    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
