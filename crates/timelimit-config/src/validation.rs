//! Configuration validation

use crate::policy::{
    DEFAULT_CHECK_INTERVAL, DEFAULT_LIVENESS_FACTOR, DEFAULT_RESTART_GAP_FACTOR,
    MAX_CONFIGURED_SECONDS,
};
use crate::schema::RawConfig;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("[limits] {field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("[limits] {field} = {value} exceeds {} seconds", MAX_CONFIGURED_SECONDS)]
    ValueTooLarge { field: &'static str, value: u64 },

    #[error(
        "[limits] check_interval_seconds * {field} ({value}) exceeds {} seconds",
        MAX_CONFIGURED_SECONDS
    )]
    ThresholdTooLarge { field: &'static str, value: u32 },

    #[error("[limits] {field} must be at least 1, got {value}")]
    FactorTooSmall { field: &'static str, value: u32 },

    #[error("[night_cutoff] {field} {value} is outside {min}..={max}")]
    CoordinateOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("[shutdown] command cannot be empty unless dry_run is set")]
    EmptyShutdownCommand,
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let limits = &config.limits;
    for (field, value, unit) in [
        ("check_interval_seconds", limits.check_interval_seconds, 1),
        ("allowed_session_minutes", limits.allowed_session_minutes, 60),
        ("allowed_cycle_minutes", limits.allowed_cycle_minutes, 60),
        ("cycle_length_minutes", limits.cycle_length_minutes, 60),
        ("necessary_rest_minutes", limits.necessary_rest_minutes, 60),
    ] {
        match value {
            Some(0) => errors.push(ValidationError::ZeroValue { field }),
            Some(value) if exceeds_max(value, unit) => {
                errors.push(ValidationError::ValueTooLarge { field, value })
            }
            _ => {}
        }
    }

    for (field, value) in [
        ("restart_gap_factor", limits.restart_gap_factor),
        ("liveness_factor", limits.liveness_factor),
    ] {
        if let Some(value) = value
            && value < 1
        {
            errors.push(ValidationError::FactorTooSmall { field, value });
        }
    }

    // An oversized interval is already reported above
    let interval = limits
        .check_interval_seconds
        .unwrap_or(DEFAULT_CHECK_INTERVAL.as_secs());
    if !exceeds_max(interval, 1) {
        for (field, value) in [
            (
                "restart_gap_factor",
                limits.restart_gap_factor.unwrap_or(DEFAULT_RESTART_GAP_FACTOR),
            ),
            (
                "liveness_factor",
                limits.liveness_factor.unwrap_or(DEFAULT_LIVENESS_FACTOR),
            ),
        ] {
            if exceeds_max(interval, u64::from(value)) {
                errors.push(ValidationError::ThresholdTooLarge { field, value });
            }
        }
    }

    let cutoff = &config.night_cutoff;
    errors.extend(check_coordinate("latitude", cutoff.latitude, 90.0));
    errors.extend(check_coordinate("longitude", cutoff.longitude, 180.0));

    if let Some(command) = &config.shutdown.command
        && !config.shutdown.dry_run
        && command.first().is_none_or(|program| program.trim().is_empty())
    {
        errors.push(ValidationError::EmptyShutdownCommand);
    }

    errors
}

fn exceeds_max(value: u64, unit: u64) -> bool {
    value
        .checked_mul(unit)
        .is_none_or(|seconds| seconds > MAX_CONFIGURED_SECONDS)
}

fn check_coordinate(field: &'static str, value: Option<f64>, bound: f64) -> Option<ValidationError> {
    let value = value?;
    if value.is_finite() && (-bound..=bound).contains(&value) {
        None
    } else {
        Some(ValidationError::CoordinateOutOfRange {
            field,
            value,
            min: -bound,
            max: bound,
        })
    }
}
