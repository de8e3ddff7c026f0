//! Unified error types for the coop door controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! scheduler's error handling uniform.  All variants are `Copy` so they can
//! be stored in the scheduler state and carried in events without allocation.
//!
//! Only [`Error::Config`] is allowed to stop the process; every other kind is
//! contained by the scheduler and surfaces as log output.

use core::fmt;

use chrono::NaiveDate;

use crate::app::commands::BridgeLevels;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid.  Fatal at startup.
    Config(ConfigError),
    /// Sunset could not be computed for a date.  Skips that day.
    Solar(SolarError),
    /// Both (or neither) direction pins were requested.  Indicates a bug in
    /// the caller; the bridge is never energised.
    InvalidDirection(BridgeLevels),
    /// A pin write or PWM call failed during actuation.  Pins are already
    /// forced low when this propagates.
    Driver(DriverError),
}

impl Error {
    /// Whether the scheduler should try again on the next poll of the same day.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Driver(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Solar(e) => write!(f, "solar: {e}"),
            Self::InvalidDirection(levels) => write!(
                f,
                "invalid direction: IN1={} IN2={} (exactly one must be asserted)",
                levels.in1, levels.in2
            ),
            Self::Driver(e) => write!(f, "driver: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is absent from the document.
    Missing(&'static str),
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required key {key}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Solar errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolarError {
    /// The sun stays above the horizon all day.
    MidnightSun(NaiveDate),
    /// The sun stays below the horizon all day.
    PolarNight(NaiveDate),
    /// The computed instant is not representable.
    OutOfRange(NaiveDate),
}

impl fmt::Display for SolarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MidnightSun(d) => write!(f, "no sunset on {d} (midnight sun)"),
            Self::PolarNight(d) => write!(f, "no sunset on {d} (polar night)"),
            Self::OutOfRange(d) => write!(f, "sunset on {d} out of range"),
        }
    }
}

impl From<SolarError> for Error {
    fn from(e: SolarError) -> Self {
        Self::Solar(e)
    }
}

// ---------------------------------------------------------------------------
// Driver errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// The GPIO peripheral could not be opened.
    GpioUnavailable,
    /// The pin is not one of the three bridge lines.
    UnknownPin(u8),
    /// Digital write failed.
    DigitalWrite(u8),
    /// Starting PWM on the enable line failed.
    PwmStart(u8),
    /// Stopping PWM on the enable line failed.
    PwmStop(u8),
    /// Shutdown was requested while the motor was running.
    Interrupted,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioUnavailable => write!(f, "GPIO unavailable"),
            Self::UnknownPin(pin) => write!(f, "pin {pin} is not a bridge line"),
            Self::DigitalWrite(pin) => write!(f, "GPIO write failed on pin {pin}"),
            Self::PwmStart(pin) => write!(f, "PWM start failed on pin {pin}"),
            Self::PwmStop(pin) => write!(f, "PWM stop failed on pin {pin}"),
            Self::Interrupted => write!(f, "interrupted by shutdown"),
        }
    }
}

impl From<DriverError> for Error {
    fn from(e: DriverError) -> Self {
        Self::Driver(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
