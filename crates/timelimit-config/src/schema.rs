//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::CURRENT_CONFIG_VERSION;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Global daemon settings
    #[serde(default)]
    pub daemon: RawDaemonConfig,

    /// Session and cycle budgets
    #[serde(default)]
    pub limits: RawLimits,

    /// Stop monitoring outside daylight hours
    #[serde(default)]
    pub night_cutoff: RawNightCutoff,

    /// What to run when a budget is exhausted
    #[serde(default)]
    pub shutdown: RawShutdown,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_CONFIG_VERSION,
            daemon: RawDaemonConfig::default(),
            limits: RawLimits::default(),
            night_cutoff: RawNightCutoff::default(),
            shutdown: RawShutdown::default(),
        }
    }
}

/// Daemon-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDaemonConfig {
    /// Data directory for the counter store
    pub data_dir: Option<PathBuf>,

    /// Log directory
    pub log_dir: Option<PathBuf>,
}

/// Budgets and polling. Missing values fall back to the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawLimits {
    /// How often the tracker wakes up
    pub check_interval_seconds: Option<u64>,

    /// On-time allowed in one continuous session
    pub allowed_session_minutes: Option<u64>,

    /// On-time allowed in one cycle
    pub allowed_cycle_minutes: Option<u64>,

    /// Length of one accounting cycle
    pub cycle_length_minutes: Option<u64>,

    /// Absence needed before a new session starts from zero
    pub necessary_rest_minutes: Option<u64>,

    /// A gap longer than this many intervals means the daemon was not running
    pub restart_gap_factor: Option<u32>,

    /// At accrual, `last_time_on` only advances if it is younger than this many intervals
    pub liveness_factor: Option<u32>,
}

/// Night cutoff settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawNightCutoff {
    #[serde(default)]
    pub enabled: bool,

    pub latitude: Option<f64>,

    pub longitude: Option<f64>,
}

/// Shutdown action
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawShutdown {
    /// Command and arguments, e.g. `["systemctl", "poweroff"]`
    pub command: Option<Vec<String>>,

    /// Log the shutdown request instead of running the command
    #[serde(default)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
            config_version = 1

            [daemon]
            data_dir = "/var/lib/timelimit"

            [limits]
            check_interval_seconds = 30
            allowed_session_minutes = 45
            allowed_cycle_minutes = 120
            cycle_length_minutes = 1440
            necessary_rest_minutes = 20

            [night_cutoff]
            enabled = true
            latitude = 35.6892
            longitude = 51.3890

            [shutdown]
            command = ["shutdown", "-h", "now"]
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.limits.check_interval_seconds, Some(30));
        assert_eq!(config.limits.cycle_length_minutes, Some(1440));
        assert!(config.night_cutoff.enabled);
        assert_eq!(config.shutdown.command.unwrap().len(), 3);
        assert!(!config.shutdown.dry_run);
    }

    #[test]
    fn sections_are_optional() {
        let config: RawConfig = toml::from_str("config_version = 1").unwrap();
        assert!(config.limits.allowed_session_minutes.is_none());
        assert!(!config.night_cutoff.enabled);
        assert!(config.shutdown.command.is_none());
    }
}
