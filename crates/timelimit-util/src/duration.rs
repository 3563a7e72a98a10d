//! Human-readable duration text, used to persist accumulated on-time.
//!
//! The format is a sequence of `<integer><unit>` parts with units `h`, `m`,
//! `s`, `ms`, written from largest to smallest, e.g. `1h2m3s450ms`. Zero is
//! written as `0s`. Values are kept to millisecond precision.

use std::time::Duration;
use thiserror::Error;

/// Error decoding a persisted duration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("empty duration")]
    Empty,

    #[error("missing number before unit in '{0}'")]
    MissingNumber(String),

    #[error("missing unit after number in '{0}'")]
    MissingUnit(String),

    #[error("unknown unit '{unit}' in '{input}'")]
    UnknownUnit { input: String, unit: String },

    #[error("duration '{0}' is out of range")]
    Overflow(String),
}

const MS_PER_SECOND: u128 = 1_000;
const MS_PER_MINUTE: u128 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u128 = 60 * MS_PER_MINUTE;

/// Format a duration as `1h2m3s450ms`, dropping zero parts.
pub fn format_duration(duration: Duration) -> String {
    let mut rest = duration.as_millis();
    if rest == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for (unit, size) in [
        ("h", MS_PER_HOUR),
        ("m", MS_PER_MINUTE),
        ("s", MS_PER_SECOND),
        ("ms", 1),
    ] {
        let count = rest / size;
        if count > 0 {
            out.push_str(&count.to_string());
            out.push_str(unit);
            rest -= count * size;
        }
    }
    out
}

/// Parse text produced by [`format_duration`].
///
/// Parts may appear in any order and repeat; they are summed.
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let overflow = || DurationParseError::Overflow(input.to_string());
    let mut total_ms: u64 = 0;
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, _)) = chars.peek() {
        let mut digits_end = start;
        while let Some(&(i, c)) = chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            digits_end = i + c.len_utf8();
            chars.next();
        }
        if digits_end == start {
            return Err(DurationParseError::MissingNumber(input.to_string()));
        }

        let mut unit_end = digits_end;
        while let Some(&(i, c)) = chars.peek() {
            if !c.is_ascii_alphabetic() {
                break;
            }
            unit_end = i + c.len_utf8();
            chars.next();
        }
        if unit_end == digits_end {
            return Err(DurationParseError::MissingUnit(input.to_string()));
        }

        let count: u64 = text[start..digits_end].parse().map_err(|_| overflow())?;
        let size: u64 = match &text[digits_end..unit_end] {
            "h" => MS_PER_HOUR as u64,
            "m" => MS_PER_MINUTE as u64,
            "s" => MS_PER_SECOND as u64,
            "ms" => 1,
            other => {
                return Err(DurationParseError::UnknownUnit {
                    input: input.to_string(),
                    unit: other.to_string(),
                });
            }
        };

        let part = count.checked_mul(size).ok_or_else(overflow)?;
        total_ms = total_ms.checked_add(part).ok_or_else(overflow)?;
    }

    Ok(Duration::from_millis(total_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_examples() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_secs(50 * 60)), "50m");
        assert_eq!(
            format_duration(Duration::from_millis(3_723_450)),
            "1h2m3s450ms"
        );
        assert_eq!(format_duration(Duration::from_millis(20)), "20ms");
    }

    #[test]
    fn parse_accepts_formatted_output() {
        for d in [
            Duration::ZERO,
            Duration::from_millis(20),
            Duration::from_secs(15 * 60 + 2),
            Duration::from_secs(14 * 3600 + 35 * 60),
        ] {
            assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
        }
    }

    #[test]
    fn parse_sums_parts() {
        assert_eq!(
            parse_duration("30m30m").unwrap(),
            Duration::from_secs(3600)
        );
    }

    #[test]
    fn sub_millisecond_precision_is_dropped() {
        let d = Duration::from_micros(1_500);
        assert_eq!(parse_duration(&format_duration(d)).unwrap(), Duration::from_millis(1));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_duration(""), Err(DurationParseError::Empty));
        assert!(matches!(
            parse_duration("m5"),
            Err(DurationParseError::MissingNumber(_))
        ));
        assert!(matches!(
            parse_duration("15"),
            Err(DurationParseError::MissingUnit(_))
        ));
        assert!(matches!(
            parse_duration("3days"),
            Err(DurationParseError::UnknownUnit { .. })
        ));
        assert!(matches!(
            parse_duration("-5s"),
            Err(DurationParseError::MissingNumber(_))
        ));
        assert!(matches!(
            parse_duration("99999999999999999999h"),
            Err(DurationParseError::Overflow(_))
        ));
    }
}
