//! Coop door controller library.
//!
//! Opens a motorised door once per day, a configurable time after sunset
//! and never before a configured time of day.  Everything that touches the
//! outside world sits behind a port trait in [`app::ports`], so the whole
//! schedule can be exercised on a host with simulated pins and clocks.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod daemon;
pub mod drivers;
pub mod error;
pub mod logging;
pub mod pins;
pub mod scheduler;
pub mod shutdown;
pub mod solar;
