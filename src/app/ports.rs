//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ActuationScheduler (domain)
//! ```
//!
//! Driven adapters (GPIO, astronomy, wall clock, event sinks) implement these
//! traits.  The scheduler and motor driver consume them via generics, so the
//! domain core never touches hardware or the system clock directly.

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::error::{DriverError, SolarError};

// ───────────────────────────────────────────────────────────────
// Pin port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the three bridge lines.
///
/// Implementations address pins by their BCM number and must not touch any
/// pin outside the [`PinMap`](crate::pins::PinMap) they were built for.
pub trait PinPort {
    /// Drive a pin high (`true`) or low (`false`).
    fn set_digital(&mut self, pin: u8, high: bool) -> Result<(), DriverError>;

    /// Start PWM on `pin` at `frequency_hz` with `duty_cycle` percent (0–100).
    fn set_pwm(&mut self, pin: u8, frequency_hz: u32, duty_cycle: u8) -> Result<(), DriverError>;

    /// Stop PWM on `pin`.  Must succeed if PWM was never started.
    fn stop_pwm(&mut self, pin: u8) -> Result<(), DriverError>;
}

impl<P: PinPort + ?Sized> PinPort for &mut P {
    fn set_digital(&mut self, pin: u8, high: bool) -> Result<(), DriverError> {
        (**self).set_digital(pin, high)
    }

    fn set_pwm(&mut self, pin: u8, frequency_hz: u32, duty_cycle: u8) -> Result<(), DriverError> {
        (**self).set_pwm(pin, frequency_hz, duty_cycle)
    }

    fn stop_pwm(&mut self, pin: u8) -> Result<(), DriverError> {
        (**self).stop_pwm(pin)
    }
}

// ───────────────────────────────────────────────────────────────
// Sunset port (driven adapter: astronomy → domain)
// ───────────────────────────────────────────────────────────────

/// Supplies the sunset instant for a calendar date at a fixed location.
///
/// The location is owned by the implementation; the domain only knows the
/// date and the UTC offset it wants the answer expressed in.
pub trait SunsetProvider {
    fn sunset(&self, date: NaiveDate, offset: FixedOffset)
    -> Result<DateTime<FixedOffset>, SolarError>;
}

impl<F> SunsetProvider for F
where
    F: Fn(NaiveDate, FixedOffset) -> Result<DateTime<FixedOffset>, SolarError>,
{
    fn sunset(
        &self,
        date: NaiveDate,
        offset: FixedOffset,
    ) -> Result<DateTime<FixedOffset>, SolarError> {
        self(date, offset)
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock time source.  The offset of the returned instant defines the
/// local calendar day.
pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
