//! Time utilities for timelimitd
//!
//! All accounting is done on wall-clock timestamps, because the counters must
//! survive process restarts and machine power-off. Elapsed values derived from
//! two timestamps are clamped to zero so a clock step backwards never produces
//! a negative duration.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `TIMELIMIT_MOCK_TIME` environment variable can be set
//! to override the system time. The mocked clock advances at the same rate as
//! the real one, which is useful for trying the night cutoff during the day.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "TIMELIMIT_MOCK_TIME";

/// Offset between mock time and real time, computed once at first use.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match NaiveDateTime::parse_from_str(&mock_time_str, "%Y-%m-%d %H:%M:%S") {
                    Ok(naive_dt) => match Local.from_local_datetime(&naive_dt).single() {
                        Some(mock_dt) => {
                            let offset = mock_dt.signed_duration_since(chrono::Local::now());
                            tracing::info!(
                                mock_time = %mock_time_str,
                                offset_secs = offset.num_seconds(),
                                "Mock time enabled"
                            );
                            return Some(offset);
                        }
                        None => tracing::warn!(
                            mock_time = %mock_time_str,
                            "Failed to convert mock time to local timezone"
                        ),
                    },
                    Err(_) => tracing::warn!(
                        mock_time = %mock_time_str,
                        expected_format = "%Y-%m-%d %H:%M:%S",
                        "Invalid mock time format"
                    ),
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Format a DateTime for display with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Elapsed time from `earlier` to `now`, or zero if `earlier` is in the future.
pub fn elapsed_between(earlier: DateTime<Local>, now: DateTime<Local>) -> Duration {
    now.signed_duration_since(earlier)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Convert a std duration for timestamp arithmetic, saturating on overflow.
pub fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 2, h, m, s).unwrap()
    }

    #[test]
    fn elapsed_forward() {
        assert_eq!(
            elapsed_between(at(10, 0, 0), at(10, 30, 15)),
            Duration::from_secs(30 * 60 + 15)
        );
    }

    #[test]
    fn elapsed_is_clamped_when_clock_goes_back() {
        assert_eq!(elapsed_between(at(10, 30, 0), at(10, 0, 0)), Duration::ZERO);
    }

    #[test]
    fn to_chrono_round_trips_minutes() {
        let d = Duration::from_secs(50 * 60);
        assert_eq!(to_chrono(d), chrono::Duration::minutes(50));
    }

    #[test]
    fn format_full() {
        assert_eq!(format_datetime_full(&at(9, 5, 7)), "2025-06-02 09:05:07");
    }
}
