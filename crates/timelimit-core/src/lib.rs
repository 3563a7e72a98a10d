//! Usage accounting state machine for timelimitd
//!
//! This crate is the heart of timelimitd, containing:
//! - Restart-gap detection and rest credit for the session accumulator
//! - Cycle rollover
//! - Session and cycle threshold checks
//! - Accrual of one poll interval per tick
//! - The cancellable polling loop that ends in either a clean stop or a shutdown
//! - Observers that log transitions and record them in the audit log

mod audit;
mod events;
mod policy;
mod tracker;

pub use audit::*;
pub use events::*;
pub use policy::*;
pub use tracker::*;
