//! Names of the durable counters and of the budgets they are checked against

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four durable values the usage tracker owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterKey {
    /// Start instant of the current accounting cycle (timestamp)
    CycleStart,
    /// Accumulated on-time within the current cycle (duration)
    SinceTheBeginningOfTheCycle,
    /// Instant of the previous successful tick (timestamp)
    LastTimeOn,
    /// Accumulated on-time within the current session (duration)
    SinceTheStartOfTheSession,
}

impl CounterKey {
    pub const ALL: [CounterKey; 4] = [
        CounterKey::CycleStart,
        CounterKey::SinceTheBeginningOfTheCycle,
        CounterKey::LastTimeOn,
        CounterKey::SinceTheStartOfTheSession,
    ];

    /// Stable key under which the value is persisted
    pub const fn as_str(&self) -> &'static str {
        match self {
            CounterKey::CycleStart => "cycle_start",
            CounterKey::SinceTheBeginningOfTheCycle => "since_the_beginning_of_the_cycle",
            CounterKey::LastTimeOn => "last_time_on",
            CounterKey::SinceTheStartOfTheSession => "since_the_start_of_the_session",
        }
    }

    /// Whether the persisted value is a timestamp (otherwise a duration)
    pub fn is_timestamp(&self) -> bool {
        matches!(self, CounterKey::CycleStart | CounterKey::LastTimeOn)
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which budget a threshold check is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    Session,
    Cycle,
}

impl LimitKind {
    /// The accumulator compared against this budget
    pub fn counter(&self) -> CounterKey {
        match self {
            LimitKind::Session => CounterKey::SinceTheStartOfTheSession,
            LimitKind::Cycle => CounterKey::SinceTheBeginningOfTheCycle,
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitKind::Session => f.write_str("session"),
            LimitKind::Cycle => f.write_str("cycle"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn keys_are_distinct() {
        let names: HashSet<_> = CounterKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn key_kinds() {
        assert!(CounterKey::CycleStart.is_timestamp());
        assert!(CounterKey::LastTimeOn.is_timestamp());
        assert!(!CounterKey::SinceTheStartOfTheSession.is_timestamp());
        assert!(!CounterKey::SinceTheBeginningOfTheCycle.is_timestamp());
    }

    #[test]
    fn limit_kinds_map_to_accumulators() {
        assert_eq!(LimitKind::Session.counter(), CounterKey::SinceTheStartOfTheSession);
        assert_eq!(LimitKind::Cycle.counter(), CounterKey::SinceTheBeginningOfTheCycle);
        assert!(!LimitKind::Cycle.counter().is_timestamp());
    }

    #[test]
    fn key_serializes_as_persisted_name() {
        for key in CounterKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }
}
