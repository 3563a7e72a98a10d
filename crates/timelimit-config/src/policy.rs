//! Validated policy structures

use crate::schema::{RawConfig, RawDaemonConfig, RawLimits, RawNightCutoff, RawShutdown};
use std::path::PathBuf;
use std::time::Duration;

/// Default poll interval
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);
/// Default on-time allowed in one session
pub const DEFAULT_ALLOWED_SESSION: Duration = Duration::from_secs(50 * 60);
/// Default on-time allowed in one cycle
pub const DEFAULT_ALLOWED_CYCLE: Duration = Duration::from_secs(150 * 60);
/// Default cycle length (14h35m)
pub const DEFAULT_CYCLE_LENGTH: Duration = Duration::from_secs((14 * 60 + 35) * 60);
/// Default rest needed before a new session
pub const DEFAULT_NECESSARY_REST: Duration = Duration::from_secs(30 * 60);
/// Default multiple of the poll interval that counts as a restart gap
pub const DEFAULT_RESTART_GAP_FACTOR: u32 = 2;
/// Default multiple of the poll interval within which `last_time_on` is still live
pub const DEFAULT_LIVENESS_FACTOR: u32 = 2;
/// Default location for the night cutoff (Tehran)
pub const DEFAULT_LATITUDE: f64 = 35.6892;
pub const DEFAULT_LONGITUDE: f64 = 51.3890;
/// Longest duration accepted for any configured interval, budget or threshold (100 years)
pub const MAX_CONFIGURED_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

/// Divisor applied to the interval and the budgets by the debug profile
const DEBUG_TIME_DIVISOR: u32 = 3000;

/// Validated policy ready for use by the tracker
#[derive(Debug, Clone)]
pub struct Policy {
    /// Daemon configuration
    pub daemon: DaemonConfig,

    /// Budgets and polling
    pub limits: LimitsPolicy,

    /// Night cutoff location. None disables the cutoff.
    pub night_cutoff: Option<Location>,

    /// Shutdown action
    pub shutdown: ShutdownPolicy,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            daemon: DaemonConfig::from_raw(raw.daemon),
            limits: LimitsPolicy::from_raw(raw.limits),
            night_cutoff: Location::from_raw(raw.night_cutoff),
            shutdown: ShutdownPolicy::from_raw(raw.shutdown),
        }
    }

    /// Compressed-time profile for trying the daemon by hand.
    ///
    /// A whole session fits in about a second and a cycle lasts one minute.
    /// The shutdown command is never run.
    pub fn debug_profile(mut self) -> Self {
        self.limits = self.limits.debug_profile();
        self.shutdown.dry_run = true;
        self
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::from_raw(RawConfig::default())
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl DaemonConfig {
    fn from_raw(raw: RawDaemonConfig) -> Self {
        Self {
            data_dir: raw
                .data_dir
                .unwrap_or_else(timelimit_util::default_data_dir),
            log_dir: raw
                .log_dir
                .unwrap_or_else(timelimit_util::default_log_dir),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self::from_raw(RawDaemonConfig::default())
    }
}

/// Session and cycle budgets
#[derive(Debug, Clone, PartialEq)]
pub struct LimitsPolicy {
    /// Time between two ticks, and the amount accrued per tick
    pub check_interval: Duration,
    /// Session budget
    pub allowed_session: Duration,
    /// Cycle budget
    pub allowed_cycle: Duration,
    /// Length of one cycle
    pub cycle_length: Duration,
    /// Absence that starts a fresh session
    pub necessary_rest: Duration,
    pub restart_gap_factor: u32,
    pub liveness_factor: u32,
}

impl LimitsPolicy {
    fn from_raw(raw: RawLimits) -> Self {
        let minutes = |m: Option<u64>, default: Duration| {
            m.map(|m| Duration::from_secs(m.saturating_mul(60)))
                .unwrap_or(default)
        };

        Self {
            check_interval: raw
                .check_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CHECK_INTERVAL),
            allowed_session: minutes(raw.allowed_session_minutes, DEFAULT_ALLOWED_SESSION),
            allowed_cycle: minutes(raw.allowed_cycle_minutes, DEFAULT_ALLOWED_CYCLE),
            cycle_length: minutes(raw.cycle_length_minutes, DEFAULT_CYCLE_LENGTH),
            necessary_rest: minutes(raw.necessary_rest_minutes, DEFAULT_NECESSARY_REST),
            restart_gap_factor: raw.restart_gap_factor.unwrap_or(DEFAULT_RESTART_GAP_FACTOR),
            liveness_factor: raw.liveness_factor.unwrap_or(DEFAULT_LIVENESS_FACTOR),
        }
    }

    /// A gap since `last_time_on` longer than this means the daemon was not ticking
    pub fn restart_gap_threshold(&self) -> Duration {
        self.check_interval
            .checked_mul(self.restart_gap_factor)
            .unwrap_or(Duration::MAX)
    }

    /// `last_time_on` is only advanced at accrual if it is younger than this
    pub fn liveness_threshold(&self) -> Duration {
        self.check_interval
            .checked_mul(self.liveness_factor)
            .unwrap_or(Duration::MAX)
    }

    fn debug_profile(&self) -> Self {
        Self {
            check_interval: self.check_interval / DEBUG_TIME_DIVISOR,
            allowed_session: self.allowed_session / DEBUG_TIME_DIVISOR,
            allowed_cycle: self.allowed_cycle / DEBUG_TIME_DIVISOR,
            cycle_length: Duration::from_secs(60),
            necessary_rest: Duration::from_secs(10),
            ..self.clone()
        }
    }
}

impl Default for LimitsPolicy {
    fn default() -> Self {
        Self::from_raw(RawLimits::default())
    }
}

/// Fixed position used to compute the daylight window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    fn from_raw(raw: RawNightCutoff) -> Option<Self> {
        raw.enabled.then(|| Self {
            latitude: raw.latitude.unwrap_or(DEFAULT_LATITUDE),
            longitude: raw.longitude.unwrap_or(DEFAULT_LONGITUDE),
        })
    }
}

/// Shutdown action
#[derive(Debug, Clone)]
pub struct ShutdownPolicy {
    pub command: Vec<String>,
    pub dry_run: bool,
}

impl ShutdownPolicy {
    fn from_raw(raw: RawShutdown) -> Self {
        Self {
            command: raw.command.unwrap_or_else(default_shutdown_command),
            dry_run: raw.dry_run,
        }
    }
}

fn default_shutdown_command() -> Vec<String> {
    vec!["systemctl".into(), "poweroff".into()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_defaults() {
        let policy = Policy::default();
        assert_eq!(policy.limits.check_interval, Duration::from_secs(60));
        assert_eq!(policy.limits.allowed_session, Duration::from_secs(50 * 60));
        assert_eq!(policy.limits.allowed_cycle, Duration::from_secs(150 * 60));
        assert_eq!(policy.limits.cycle_length, Duration::from_secs(875 * 60));
        assert_eq!(policy.limits.necessary_rest, Duration::from_secs(30 * 60));
        assert!(policy.night_cutoff.is_none());
        assert_eq!(policy.shutdown.command, vec!["systemctl", "poweroff"]);
        assert!(!policy.shutdown.dry_run);
    }

    #[test]
    fn thresholds_are_independent() {
        let limits = LimitsPolicy {
            restart_gap_factor: 3,
            liveness_factor: 2,
            ..LimitsPolicy::default()
        };
        assert_eq!(limits.restart_gap_threshold(), Duration::from_secs(180));
        assert_eq!(limits.liveness_threshold(), Duration::from_secs(120));
    }

    #[test]
    fn oversized_values_saturate() {
        let raw = RawLimits {
            allowed_session_minutes: Some(u64::MAX),
            check_interval_seconds: Some(u64::MAX),
            restart_gap_factor: Some(u32::MAX),
            ..RawLimits::default()
        };
        let limits = LimitsPolicy::from_raw(raw);
        assert_eq!(limits.allowed_session, Duration::from_secs(u64::MAX));
        assert_eq!(limits.restart_gap_threshold(), Duration::MAX);
        assert_eq!(limits.liveness_threshold(), Duration::MAX);
    }

    #[test]
    fn night_cutoff_uses_default_location() {
        let raw = RawNightCutoff {
            enabled: true,
            latitude: None,
            longitude: Some(10.0),
        };
        let location = Location::from_raw(raw).unwrap();
        assert_eq!(location.latitude, DEFAULT_LATITUDE);
        assert_eq!(location.longitude, 10.0);
    }

    #[test]
    fn debug_profile_compresses_time() {
        let policy = Policy::default().debug_profile();
        assert_eq!(policy.limits.check_interval, Duration::from_millis(20));
        assert_eq!(policy.limits.allowed_session, Duration::from_secs(1));
        assert_eq!(policy.limits.allowed_cycle, Duration::from_secs(3));
        assert_eq!(policy.limits.cycle_length, Duration::from_secs(60));
        assert_eq!(policy.limits.necessary_rest, Duration::from_secs(10));
        assert!(policy.shutdown.dry_run);
    }
}
