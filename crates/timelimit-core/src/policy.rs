//! Pure session and cycle rules

use std::time::Duration;
use timelimit_config::LimitsPolicy;

/// What an absence of length `gap` means for the session accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapAssessment {
    /// The loop kept ticking; not a restart
    Live,
    /// Restart, but the absence was too short to count as rest
    ShortAbsence,
    /// Restart after a partial rest; the session shrinks by `credit`
    PartialRest { credit: Duration },
    /// Restart after a full rest; a new session starts
    FullRest,
}

impl GapAssessment {
    /// Whether the process was not ticking during the gap
    pub fn is_restart(&self) -> bool {
        !matches!(self, GapAssessment::Live)
    }

    /// Session accumulator after applying this assessment
    pub fn apply(&self, session: Duration) -> Duration {
        match self {
            GapAssessment::Live | GapAssessment::ShortAbsence => session,
            GapAssessment::PartialRest { credit } => session.saturating_sub(*credit),
            GapAssessment::FullRest => Duration::ZERO,
        }
    }
}

/// Classify the time since `last_time_on`.
///
/// Anything up to the restart-gap threshold is normal ticking. Beyond it, more
/// than `necessary_rest` is a full rest, more than half of it a partial rest,
/// and the rest is a short absence.
pub fn assess_gap(gap: Duration, limits: &LimitsPolicy) -> GapAssessment {
    if gap <= limits.restart_gap_threshold() {
        GapAssessment::Live
    } else if gap > limits.necessary_rest {
        GapAssessment::FullRest
    } else if gap > limits.necessary_rest / 2 {
        GapAssessment::PartialRest {
            credit: rest_credit(gap, limits),
        }
    } else {
        GapAssessment::ShortAbsence
    }
}

/// Session time given back for a rest of `gap`: `gap * allowed_session / necessary_rest`
pub fn rest_credit(gap: Duration, limits: &LimitsPolicy) -> Duration {
    let rest = limits.necessary_rest.as_nanos();
    if rest == 0 {
        return limits.allowed_session;
    }
    let nanos = gap.as_nanos() * limits.allowed_session.as_nanos() / rest;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Whether a cycle that started `since_cycle_start` ago is over
pub fn cycle_expired(since_cycle_start: Duration, limits: &LimitsPolicy) -> bool {
    since_cycle_start >= limits.cycle_length
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(m: u64) -> Duration {
        Duration::from_secs(m * 60)
    }

    fn limits() -> LimitsPolicy {
        LimitsPolicy {
            check_interval: minutes(1),
            allowed_session: minutes(50),
            allowed_cycle: minutes(150),
            cycle_length: minutes(875),
            necessary_rest: minutes(30),
            restart_gap_factor: 2,
            liveness_factor: 2,
        }
    }

    #[test]
    fn small_gaps_are_live() {
        let limits = limits();
        assert_eq!(assess_gap(Duration::ZERO, &limits), GapAssessment::Live);
        assert_eq!(assess_gap(minutes(1), &limits), GapAssessment::Live);
        // Exactly twice the interval is still normal ticking
        assert_eq!(assess_gap(minutes(2), &limits), GapAssessment::Live);
        assert_eq!(
            assess_gap(minutes(2) + Duration::from_secs(1), &limits),
            GapAssessment::ShortAbsence
        );
    }

    #[test]
    fn rest_scenarios_from_twenty_minutes_used() {
        let limits = limits();
        let session = minutes(20);

        let full = assess_gap(minutes(35), &limits);
        assert_eq!(full, GapAssessment::FullRest);
        assert_eq!(full.apply(session), Duration::ZERO);

        let partial = assess_gap(minutes(20), &limits);
        assert!(matches!(partial, GapAssessment::PartialRest { .. }));
        assert_eq!(partial.apply(session), Duration::ZERO);

        let short = assess_gap(minutes(10), &limits);
        assert_eq!(short, GapAssessment::ShortAbsence);
        assert!(short.is_restart());
        assert_eq!(short.apply(session), session);
    }

    #[test]
    fn rest_boundaries() {
        let limits = limits();
        // Exactly half the rest is still too short
        assert_eq!(assess_gap(minutes(15), &limits), GapAssessment::ShortAbsence);
        // Exactly the full rest is only partial
        assert!(matches!(
            assess_gap(minutes(30), &limits),
            GapAssessment::PartialRest { .. }
        ));
        assert_eq!(assess_gap(minutes(31), &limits), GapAssessment::FullRest);
    }

    #[test]
    fn credit_is_prorated() {
        let limits = limits();
        // 20m of a 30m rest earns 20 * 50 / 30 minutes
        assert_eq!(rest_credit(minutes(20), &limits), Duration::from_secs(2000));
        assert_eq!(rest_credit(minutes(30), &limits), minutes(50));

        let partial = assess_gap(minutes(18), &limits);
        assert_eq!(
            partial,
            GapAssessment::PartialRest {
                credit: minutes(30)
            }
        );
        assert_eq!(partial.apply(minutes(45)), minutes(15));
    }

    #[test]
    fn cycle_expiry_is_inclusive() {
        let limits = limits();
        assert!(!cycle_expired(minutes(874), &limits));
        assert!(cycle_expired(minutes(875), &limits));
        assert!(cycle_expired(minutes(2000), &limits));
    }
}
