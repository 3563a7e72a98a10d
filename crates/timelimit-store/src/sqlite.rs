//! SQLite-based store implementation

use chrono::{DateTime, Local};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use timelimit_util::{format_duration, parse_duration};
use tracing::{debug, warn};

use crate::{AuditEvent, AuditEventType, CounterStore, StoreError, StoreResult};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path, creating parent directories
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Named counters (timestamps and durations as text)
            CREATE TABLE IF NOT EXISTS counters (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }

    fn read_raw(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row("SELECT value FROM counters WHERE key = ?", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write_raw(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO counters (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key)
            DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value, timelimit_util::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Decode the stored value, or persist and return `default` if it is
    /// absent or cannot be decoded.
    fn read_or_init<T, E: std::fmt::Display>(
        &self,
        key: &str,
        decode: impl FnOnce(&str) -> Result<T, E>,
        default: T,
        encode: impl FnOnce(&T) -> String,
    ) -> StoreResult<T> {
        if let Some(raw) = self.read_raw(key)? {
            match decode(&raw) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(key, value = %raw, error = %e, "Undecodable counter, resetting to default");
                }
            }
        } else {
            debug!(key, "Counter absent, initializing");
        }

        self.write_raw(key, &encode(&default))?;
        Ok(default)
    }
}

impl CounterStore for SqliteStore {
    fn read_duration(&self, key: &str) -> StoreResult<Duration> {
        self.read_or_init(key, parse_duration, Duration::ZERO, |d| format_duration(*d))
    }

    fn read_timestamp(&self, key: &str, now: DateTime<Local>) -> StoreResult<DateTime<Local>> {
        self.read_or_init(
            key,
            |s| DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Local)),
            now,
            |t| t.to_rfc3339(),
        )
    }

    fn write_duration(&self, key: &str, value: Duration) -> StoreResult<()> {
        self.write_raw(key, &format_duration(value))?;
        debug!(key, value = %format_duration(value), "Duration written");
        Ok(())
    }

    fn write_timestamp(&self, key: &str, value: DateTime<Local>) -> StoreResult<()> {
        self.write_raw(key, &value.to_rfc3339())?;
        debug!(key, value = %value, "Timestamp written");
        Ok(())
    }

    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Local))
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            let event: AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use timelimit_util::LimitKind;

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    #[test]
    fn test_in_memory_store() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_healthy());
    }

    #[test]
    fn absent_timestamp_defaults_once() {
        let store = SqliteStore::in_memory().unwrap();

        let first = store.read_timestamp("cycle_start", at(8, 0)).unwrap();
        assert_eq!(first, at(8, 0));

        // A later read sees the persisted default, not a fresh "now"
        let second = store.read_timestamp("cycle_start", at(9, 30)).unwrap();
        assert_eq!(second, at(8, 0));
    }

    #[test]
    fn absent_duration_defaults_to_zero() {
        let store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.read_duration("session").unwrap(), Duration::ZERO);
        assert_eq!(store.read_raw("session").unwrap().as_deref(), Some("0s"));
    }

    #[test]
    fn values_survive_write_and_read() {
        let store = SqliteStore::in_memory().unwrap();

        let when = Local::now();
        store.write_timestamp("base_time", when).unwrap();
        assert_eq!(store.read_timestamp("base_time", at(0, 0)).unwrap(), when);

        let d = Duration::from_secs(15 * 60 + 2);
        store.write_duration("total_duration", d).unwrap();
        assert_eq!(store.read_duration("total_duration").unwrap(), d);
    }

    #[test]
    fn increment_adds_delta() {
        let store = SqliteStore::in_memory().unwrap();
        let minute = Duration::from_secs(60);

        assert_eq!(store.increment("cycle", minute).unwrap(), minute);
        assert_eq!(store.increment("cycle", minute).unwrap(), minute * 2);
        assert_eq!(store.read_duration("cycle").unwrap(), minute * 2);
    }

    #[test]
    fn malformed_values_heal_to_defaults() {
        let store = SqliteStore::in_memory().unwrap();
        store.write_raw("session", "a long time").unwrap();
        store.write_raw("last_on", "yesterday").unwrap();

        assert_eq!(store.read_duration("session").unwrap(), Duration::ZERO);
        assert_eq!(store.read_raw("session").unwrap().as_deref(), Some("0s"));

        assert_eq!(store.read_timestamp("last_on", at(7, 15)).unwrap(), at(7, 15));
        assert_eq!(store.read_timestamp("last_on", at(9, 0)).unwrap(), at(7, 15));
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("timelimit.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .write_duration("session", Duration::from_secs(1200))
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(
            store.read_duration("session").unwrap(),
            Duration::from_secs(1200)
        );
    }

    #[test]
    fn test_audit_log() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .append_audit(AuditEvent::new(AuditEventType::DaemonStarted))
            .unwrap();
        store
            .append_audit(AuditEvent::new(AuditEventType::LimitReached {
                limit: LimitKind::Session,
                used: Duration::from_secs(3000),
                allowed: Duration::from_secs(3000),
            }))
            .unwrap();

        let events = store.recent_audits(10).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0].event,
            AuditEventType::LimitReached { limit: LimitKind::Session, .. }
        ));
        assert!(matches!(events[1].event, AuditEventType::DaemonStarted));
    }
}
