//! Application core: pure domain types and port traits, zero I/O.
//!
//! All interaction with GPIO, astronomy, the wall clock and logging happens
//! through the **port traits** defined in [`ports`], keeping the scheduler
//! fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
