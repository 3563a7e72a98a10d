//! Config validation CLI tool
//!
//! Validates a timelimitd configuration file and prints the effective budgets.

use std::path::PathBuf;
use std::process::ExitCode;
use timelimit_config::{ConfigError, CURRENT_CONFIG_VERSION};
use timelimit_util::{default_config_path, format_duration};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a timelimitd configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match timelimit_config::load_config(&config_path) {
        Ok(policy) => {
            let limits = &policy.limits;
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version:  {}", CURRENT_CONFIG_VERSION);
            println!("  Check interval:  {}", format_duration(limits.check_interval));
            println!("  Session budget:  {}", format_duration(limits.allowed_session));
            println!("  Cycle budget:    {}", format_duration(limits.allowed_cycle));
            println!("  Cycle length:    {}", format_duration(limits.cycle_length));
            println!("  Necessary rest:  {}", format_duration(limits.necessary_rest));
            match &policy.night_cutoff {
                Some(location) => println!(
                    "  Night cutoff:    on ({:.4}, {:.4})",
                    location.latitude, location.longitude
                ),
                None => println!("  Night cutoff:    off"),
            }
            if policy.shutdown.dry_run {
                println!("  Shutdown:        dry run");
            } else {
                println!("  Shutdown:        {}", policy.shutdown.command.join(" "));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver, CURRENT_CONFIG_VERSION
                    );
                }
                ConfigError::InvalidEnv { .. } => {
                    eprintln!("{}", e);
                }
            }
            ExitCode::from(1)
        }
    }
}
