//! Host collaborator interfaces for timelimitd
//!
//! This crate defines what the usage tracker needs from the machine it runs
//! on: a way to halt it, and optionally a way to tell day from night. It
//! contains no platform code itself.

mod mock;
mod once;
mod traits;

pub use mock::*;
pub use once::*;
pub use traits::*;
