//! Configuration parsing and validation for timelimitd
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Session and cycle budgets, poll interval, rest threshold
//! - Optional night cutoff location
//! - Shutdown command
//! - Environment overrides for the two budgets
//!
//! The result is an immutable [`Policy`], built once at startup.

mod policy;
mod schema;
mod validation;

pub use policy::*;
pub use schema::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Overrides `[limits] allowed_session_minutes`
pub const ALLOWED_SESSION_ENV: &str = "TIMELIMIT_ALLOWED_SESSION_MIN";

/// Overrides `[limits] allowed_cycle_minutes`
pub const ALLOWED_CYCLE_ENV: &str = "TIMELIMIT_ALLOWED_CYCLE_MIN";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid value {value:?} for environment variable {var}: expected whole minutes")]
    InvalidEnv { var: &'static str, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Policy> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load configuration from `path`, or use the built-in defaults if the file does not exist.
///
/// Environment overrides apply in both cases.
pub fn load_config_or_default(path: impl AsRef<Path>) -> ConfigResult<Policy> {
    let path = path.as_ref();
    if path.exists() {
        return load_config(path);
    }

    info!(config_path = %path.display(), "No config file, using built-in defaults");
    build_policy(RawConfig::default(), env_lookup)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Policy> {
    parse_config_with_env(content, env_lookup)
}

/// Like [`parse_config`], reading overrides through `lookup` instead of the process environment
pub fn parse_config_with_env(
    content: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> ConfigResult<Policy> {
    let raw: RawConfig = toml::from_str(content)?;
    build_policy(raw, lookup)
}

fn build_policy(
    mut raw: RawConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ConfigResult<Policy> {
    // Check version
    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    apply_env_overrides(&mut raw, lookup)?;

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Policy::from_raw(raw))
}

fn apply_env_overrides(
    raw: &mut RawConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ConfigResult<()> {
    for (var, slot) in [
        (ALLOWED_SESSION_ENV, &mut raw.limits.allowed_session_minutes),
        (ALLOWED_CYCLE_ENV, &mut raw.limits.allowed_cycle_minutes),
    ] {
        let Some(value) = lookup(var).filter(|v| !v.is_empty()) else {
            continue;
        };
        let minutes = value
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidEnv { var, value: value.clone() })?;
        info!(var, minutes, "Budget overridden from environment");
        *slot = Some(minutes);
    }
    Ok(())
}

fn env_lookup(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parse_minimal_config() {
        let policy = parse_config_with_env("config_version = 1", no_env).unwrap();
        assert_eq!(policy.limits, LimitsPolicy::default());
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config_with_env("config_version = 99", no_env);
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_values() {
        let config = r#"
            config_version = 1

            [limits]
            allowed_cycle_minutes = 0
        "#;

        let result = parse_config_with_env(config, no_env);
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }

    #[test]
    fn reject_oversized_values() {
        let config = r#"
            config_version = 1

            [limits]
            allowed_session_minutes = 9223372036854775807
        "#;

        let result = parse_config_with_env(config, no_env);
        assert!(matches!(
            result,
            Err(ConfigError::ValidationFailed { ref errors })
                if matches!(errors[..], [ValidationError::ValueTooLarge { .. }])
        ));

        let config = r#"
            config_version = 1

            [limits]
            check_interval_seconds = 1000000000
            liveness_factor = 4000000000
        "#;

        let result = parse_config_with_env(config, no_env);
        assert!(matches!(
            result,
            Err(ConfigError::ValidationFailed { ref errors })
                if matches!(
                    errors[..],
                    [ValidationError::ThresholdTooLarge { field: "liveness_factor", .. }]
                )
        ));
    }

    #[test]
    fn env_overrides_budgets() {
        let config = r#"
            config_version = 1

            [limits]
            allowed_session_minutes = 50
            allowed_cycle_minutes = 150
        "#;

        let policy = parse_config_with_env(config, |var| match var {
            ALLOWED_SESSION_ENV => Some("40".into()),
            ALLOWED_CYCLE_ENV => Some(" 90 ".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(policy.limits.allowed_session, Duration::from_secs(40 * 60));
        assert_eq!(policy.limits.allowed_cycle, Duration::from_secs(90 * 60));
    }

    #[test]
    fn empty_env_value_is_ignored() {
        let policy = parse_config_with_env("config_version = 1", |var| {
            (var == ALLOWED_SESSION_ENV).then(String::new)
        })
        .unwrap();
        assert_eq!(policy.limits.allowed_session, DEFAULT_ALLOWED_SESSION);
    }

    #[test]
    fn invalid_env_value_is_an_error() {
        let result = parse_config_with_env("config_version = 1", |var| {
            (var == ALLOWED_CYCLE_ENV).then(|| "two hours".to_string())
        });
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv { var: ALLOWED_CYCLE_ENV, .. })
        ));
    }

    #[test]
    fn env_zero_fails_validation() {
        let result = parse_config_with_env("config_version = 1", |var| {
            (var == ALLOWED_SESSION_ENV).then(|| "0".to_string())
        });
        assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
    }

    #[test]
    fn load_from_file_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let policy = load_config_or_default(&path).unwrap();
        assert!(policy.night_cutoff.is_none());

        std::fs::write(
            &path,
            "config_version = 1\n[night_cutoff]\nenabled = true\n",
        )
        .unwrap();
        let policy = load_config(&path).unwrap();
        assert!(policy.night_cutoff.is_some());
    }
}
