//! Audit event types

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use timelimit_util::LimitKind;

/// Types of audit events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Daemon started
    DaemonStarted,

    /// Daemon stopped
    DaemonStopped { reason: String },

    /// The previous tick is too far in the past; the daemon was not running
    RestartDetected {
        last_time_on: DateTime<Local>,
        gap: Duration,
    },

    /// Session accumulator reset after a full rest
    SessionReset { previous: Duration },

    /// Session accumulator reduced after a partial rest
    SessionCredited { credit: Duration, remaining: Duration },

    /// New accounting cycle started
    CycleReset {
        previous_start: DateTime<Local>,
        used: Duration,
    },

    /// A budget was exhausted
    LimitReached {
        limit: LimitKind,
        used: Duration,
        allowed: Duration,
    },

    /// Monitoring stopped because it is outside daylight hours
    NightCutoff,

    /// The shutdown action was requested
    ShutdownRequested,
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: timelimit_util::now(),
            event,
        }
    }
}
