//! Host collaborator traits

use chrono::{DateTime, Local};
use thiserror::Error;

/// Errors from host operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Shutdown command is empty")]
    EmptyCommand,

    #[error("Failed to start shutdown command '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

pub type HostResult<T> = Result<T, HostError>;

/// Halts the machine.
///
/// Fire-and-forget: the call starts the action and returns without waiting
/// for it to finish. Failures are logged by the implementation; the caller
/// never sees them.
pub trait ShutdownTrigger: Send + Sync {
    fn request_shutdown(&self);
}

/// Answers whether `now` falls outside the local daytime window
pub trait DaylightOracle: Send + Sync {
    fn is_outside_daylight(&self, now: DateTime<Local>) -> bool;
}
