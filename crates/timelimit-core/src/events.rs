//! Transitions reported by the tracker

use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use timelimit_util::{LimitKind, format_duration};
use tracing::{info, warn};

/// State transitions of the usage tracker
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// `last_time_on` is older than the restart-gap threshold
    RestartDetected {
        last_time_on: DateTime<Local>,
        gap: Duration,
    },

    /// Full rest: the session accumulator went back to zero
    SessionReset { previous: Duration },

    /// Partial rest: the session accumulator was reduced by `credit`
    SessionCredited {
        credit: Duration,
        remaining: Duration,
    },

    /// A new cycle started at the tick's `now`
    CycleReset {
        previous_start: DateTime<Local>,
        used: Duration,
    },

    /// An accumulator reached its budget
    LimitReached {
        limit: LimitKind,
        used: Duration,
        allowed: Duration,
    },

    /// Outside daylight; monitoring stops
    NightCutoff,

    /// The shutdown trigger was invoked
    ShutdownRequested,
}

/// Receives tracker transitions.
///
/// Called synchronously from inside the tick, so implementations must not block.
pub trait TrackerObserver: Send + Sync {
    fn on_event(&self, event: &TrackerEvent);
}

/// Logs every transition through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TrackerObserver for TracingObserver {
    fn on_event(&self, event: &TrackerEvent) {
        match event {
            TrackerEvent::RestartDetected { last_time_on, gap } => info!(
                last_time_on = %last_time_on,
                gap = %format_duration(*gap),
                "Restart detected"
            ),
            TrackerEvent::SessionReset { previous } => info!(
                previous = %format_duration(*previous),
                "Rested long enough, new session"
            ),
            TrackerEvent::SessionCredited { credit, remaining } => info!(
                credit = %format_duration(*credit),
                remaining = %format_duration(*remaining),
                "Partial rest credited to session"
            ),
            TrackerEvent::CycleReset {
                previous_start,
                used,
            } => info!(
                previous_start = %previous_start,
                used = %format_duration(*used),
                "New cycle"
            ),
            TrackerEvent::LimitReached {
                limit,
                used,
                allowed,
            } => warn!(
                limit = %limit,
                used = %format_duration(*used),
                allowed = %format_duration(*allowed),
                "Limit reached"
            ),
            TrackerEvent::NightCutoff => info!("Outside daylight, stopping"),
            TrackerEvent::ShutdownRequested => warn!("Shutting down"),
        }
    }
}

/// Forwards every event to each observer in order
#[derive(Default, Clone)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn TrackerObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn TrackerObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl TrackerObserver for ObserverSet {
    fn on_event(&self, event: &TrackerEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

/// Keeps every event it sees (for tests)
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<TrackerEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events seen so far, oldest first
    pub fn events(&self) -> Vec<TrackerEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Forget everything seen so far
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl TrackerObserver for RecordingObserver {
    fn on_event(&self, event: &TrackerEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
