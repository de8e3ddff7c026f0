//! H-bridge pin assignments.
//!
//! The three control lines are addressed by Broadcom (BCM) GPIO numbers, as
//! they appear in the configuration document.
//!
//! ```text
//!   IN1 ──┐
//!         ├── direction (exactly one HIGH while running)
//!   IN2 ──┘
//!   EN  ──── PWM power enable
//! ```

use crate::error::ConfigError;

/// Highest user-accessible BCM GPIO on the 40-pin header.
pub const MAX_BCM_GPIO: u8 = 27;

/// Pin identifiers for the three H-bridge control lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    /// Forward-enable direction line.
    pub in1: u8,
    /// Reverse-enable direction line.
    pub in2: u8,
    /// Power-enable line, driven with PWM.
    pub en: u8,
}

impl PinMap {
    /// Build a pin map, rejecting out-of-range or shared pins.
    pub fn new(in1: u8, in2: u8, en: u8) -> Result<Self, ConfigError> {
        for pin in [in1, in2, en] {
            if pin > MAX_BCM_GPIO {
                return Err(ConfigError::ValidationFailed(
                    "IN1, IN2 and EN must be BCM GPIO 0–27",
                ));
            }
        }
        if in1 == in2 || in1 == en || in2 == en {
            return Err(ConfigError::ValidationFailed(
                "IN1, IN2 and EN must be distinct pins",
            ));
        }
        Ok(Self { in1, in2, en })
    }

    /// All three lines, in release order (enable first).
    pub fn release_order(&self) -> [u8; 3] {
        [self.en, self.in1, self.in2]
    }

    pub fn contains(&self, pin: u8) -> bool {
        pin == self.in1 || pin == self.in2 || pin == self.en
    }
}
