//! Solar clock: derives each day's trigger instant from sunset.
//!
//! ```text
//!   raw = sunset(date) + BUFFER_AFTER_SUNSET
//!   at  = max(raw, EARLIEST_OPEN on date)
//! ```
//!
//! Astronomy is delegated to a [`SunsetProvider`]; this module only applies
//! the signed buffer and the earliest-open clamp.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta};

use crate::app::ports::SunsetProvider;
use crate::error::SolarError;

/// The instant at which a given day's actuation becomes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerInstant {
    /// Calendar day this trigger belongs to.
    pub date: NaiveDate,
    /// Sunset as reported by the provider.
    pub sunset: DateTime<FixedOffset>,
    /// `sunset + buffer`, before clamping.
    pub raw: DateTime<FixedOffset>,
    /// Effective trigger, never earlier than the earliest-open time.
    pub at: DateTime<FixedOffset>,
    /// True if the earliest-open floor replaced `raw`.
    pub clamped: bool,
}

/// Combine `date` and a local wall-clock `time` in a fixed UTC offset.
pub fn at_local(date: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    let utc = date.and_time(time) - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, offset)
}

/// Apply the buffer and earliest-open clamp to a known sunset.
pub fn clamp_trigger(
    date: NaiveDate,
    sunset: DateTime<FixedOffset>,
    buffer: TimeDelta,
    earliest_open: NaiveTime,
) -> TriggerInstant {
    let raw = sunset + buffer;
    let floor = at_local(date, earliest_open, *sunset.offset());
    let clamped = raw < floor;
    TriggerInstant {
        date,
        sunset,
        raw,
        at: if clamped { floor } else { raw },
        clamped,
    }
}

/// Sunset-relative trigger calculator.
pub struct SolarClock<S> {
    provider: S,
    buffer: TimeDelta,
    earliest_open: NaiveTime,
}

impl<S: SunsetProvider> SolarClock<S> {
    pub fn new(provider: S, buffer: TimeDelta, earliest_open: NaiveTime) -> Self {
        Self {
            provider,
            buffer,
            earliest_open,
        }
    }

    /// Trigger instant for `date`, expressed in `offset`.
    ///
    /// Pure: repeated calls with the same inputs return the same value.
    pub fn trigger_for(
        &self,
        date: NaiveDate,
        offset: FixedOffset,
    ) -> Result<TriggerInstant, SolarError> {
        let sunset = self.provider.sunset(date, offset)?.with_timezone(&offset);
        Ok(clamp_trigger(date, sunset, self.buffer, self.earliest_open))
    }

    pub fn buffer(&self) -> TimeDelta {
        self.buffer
    }

    pub fn earliest_open(&self) -> NaiveTime {
        self.earliest_open
    }
}
