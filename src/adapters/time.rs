//! Host time adapters.
//!
//! [`SystemClock`] reads the local wall clock with its current UTC offset,
//! so a DST change shows up as a new offset on the next poll.  [`StdDelay`]
//! is a blocking [`DelayNs`] over `std::thread::sleep`.

use core::time::Duration;

use chrono::{DateTime, FixedOffset, Local};
use embedded_hal::delay::DelayNs;

use crate::app::ports::Clock;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
