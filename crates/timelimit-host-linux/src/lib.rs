//! Linux host collaborators for timelimitd
//!
//! Provides:
//! - Shutdown by running a configured command in its own session
//! - A dry-run shutdown that only logs
//! - A daylight oracle based on sunrise/sunset for a fixed location

mod shutdown;
mod solar;

pub use shutdown::*;
pub use solar::*;
