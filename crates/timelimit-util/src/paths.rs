//! Default paths for timelimitd
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/timelimit/config.toml` or `~/.config/timelimit/config.toml`
//! - Data: `$XDG_DATA_HOME/timelimit` or `~/.local/share/timelimit`
//! - Logs: `$XDG_STATE_HOME/timelimit` or `~/.local/state/timelimit`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const TIMELIMIT_DATA_DIR_ENV: &str = "TIMELIMIT_DATA_DIR";

/// Environment variable for overriding the config file path
pub const TIMELIMIT_CONFIG_ENV: &str = "TIMELIMIT_CONFIG";

/// Application subdirectory name
const APP_DIR: &str = "timelimit";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Database filename within the data directory
pub const DATABASE_FILENAME: &str = "timelimit.db";

/// Log filename within the log directory
pub const LOG_FILENAME: &str = "timelimitd.log";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/timelimit/config.toml` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/timelimit/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$TIMELIMIT_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/timelimit` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/timelimit` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(TIMELIMIT_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking TIMELIMIT_DATA_DIR env var.
/// Used for default values in configs where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Get the default log directory.
///
/// Order of precedence:
/// 1. `$XDG_STATE_HOME/timelimit` (if XDG_STATE_HOME is set)
/// 2. `~/.local/state/timelimit` (fallback)
pub fn default_log_dir() -> PathBuf {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(state_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("state")
            .join(APP_DIR);
    }

    PathBuf::from("/tmp").join(APP_DIR).join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_toml_under_app_dir() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("timelimit"));
        assert_eq!(path.extension().unwrap(), "toml");
    }

    #[test]
    fn data_dir_contains_app_dir() {
        let path = data_dir_without_env();
        assert!(path.to_string_lossy().contains("timelimit"));
    }

    #[test]
    fn log_dir_contains_app_dir() {
        let path = default_log_dir();
        assert!(path.to_string_lossy().contains("timelimit"));
    }
}
