//! Audit trail of tracker transitions

use std::sync::Arc;
use timelimit_store::{AuditEvent, AuditEventType, CounterStore};
use tracing::warn;

use crate::{TrackerEvent, TrackerObserver};

/// Appends every tracker transition to the store's audit log.
///
/// A failed append is logged and dropped; the counters, not the audit log,
/// are what the tracker depends on.
pub struct AuditObserver {
    store: Arc<dyn CounterStore>,
}

impl AuditObserver {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }
}

impl From<&TrackerEvent> for AuditEventType {
    fn from(event: &TrackerEvent) -> Self {
        match event.clone() {
            TrackerEvent::RestartDetected { last_time_on, gap } => {
                AuditEventType::RestartDetected { last_time_on, gap }
            }
            TrackerEvent::SessionReset { previous } => AuditEventType::SessionReset { previous },
            TrackerEvent::SessionCredited { credit, remaining } => {
                AuditEventType::SessionCredited { credit, remaining }
            }
            TrackerEvent::CycleReset {
                previous_start,
                used,
            } => AuditEventType::CycleReset {
                previous_start,
                used,
            },
            TrackerEvent::LimitReached {
                limit,
                used,
                allowed,
            } => AuditEventType::LimitReached {
                limit,
                used,
                allowed,
            },
            TrackerEvent::NightCutoff => AuditEventType::NightCutoff,
            TrackerEvent::ShutdownRequested => AuditEventType::ShutdownRequested,
        }
    }
}

impl TrackerObserver for AuditObserver {
    fn on_event(&self, event: &TrackerEvent) {
        if let Err(e) = self.store.append_audit(AuditEvent::new(event.into())) {
            warn!(error = %e, ?event, "Failed to record audit event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use timelimit_store::SqliteStore;
    use timelimit_util::LimitKind;

    #[test]
    fn transitions_land_in_the_audit_log() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let observer = AuditObserver::new(store.clone());

        observer.on_event(&TrackerEvent::SessionReset {
            previous: Duration::from_secs(1200),
        });
        observer.on_event(&TrackerEvent::LimitReached {
            limit: LimitKind::Cycle,
            used: Duration::from_secs(9000),
            allowed: Duration::from_secs(9000),
        });
        observer.on_event(&TrackerEvent::ShutdownRequested);

        let events: Vec<_> = store
            .recent_audits(10)
            .unwrap()
            .into_iter()
            .map(|e| e.event)
            .collect();
        assert_eq!(
            events,
            vec![
                AuditEventType::ShutdownRequested,
                AuditEventType::LimitReached {
                    limit: LimitKind::Cycle,
                    used: Duration::from_secs(9000),
                    allowed: Duration::from_secs(9000),
                },
                AuditEventType::SessionReset {
                    previous: Duration::from_secs(1200),
                },
            ]
        );
    }
}
