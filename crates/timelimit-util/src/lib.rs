//! Shared utilities for timelimitd
//!
//! This crate provides:
//! - Counter keys and limit kinds shared by the store and the tracker
//! - Time utilities (mock-able wall clock, elapsed clamping)
//! - A lossless text codec for durations
//! - Default paths for config, data, and log directories

mod counters;
mod duration;
mod paths;
mod time;

pub use counters::*;
pub use duration::*;
pub use paths::*;
pub use time::*;
