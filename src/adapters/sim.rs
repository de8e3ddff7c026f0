//! In-memory pin adapter for `--simulate` runs and host tests.
//!
//! Tracks the level and PWM state of every line it is asked to drive and
//! logs each write, so a simulated run shows exactly what the bridge would
//! have seen.

use std::collections::BTreeMap;

use log::debug;

use crate::app::ports::PinPort;
use crate::error::DriverError;
use crate::pins::PinMap;

/// One recorded pin operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOp {
    Digital { pin: u8, high: bool },
    PwmStart { pin: u8, frequency_hz: u32, duty_cycle: u8 },
    PwmStop { pin: u8 },
}

/// Simulated bridge lines.
#[derive(Debug)]
pub struct SimPins {
    map: PinMap,
    levels: BTreeMap<u8, bool>,
    pwm: BTreeMap<u8, (u32, u8)>,
    history: Vec<PinOp>,
}

impl SimPins {
    pub fn new(map: PinMap) -> Self {
        Self {
            map,
            levels: BTreeMap::new(),
            pwm: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// Current digital level (`false` if never written).
    pub fn level(&self, pin: u8) -> bool {
        self.levels.get(&pin).copied().unwrap_or(false)
    }

    /// Active PWM `(frequency_hz, duty_cycle)` on a pin.
    pub fn pwm(&self, pin: u8) -> Option<(u32, u8)> {
        self.pwm.get(&pin).copied()
    }

    /// All lines low and no PWM running.
    pub fn is_safe(&self) -> bool {
        self.pwm.is_empty() && self.levels.values().all(|high| !high)
    }

    pub fn history(&self) -> &[PinOp] {
        &self.history
    }

    fn check(&self, pin: u8) -> Result<(), DriverError> {
        if self.map.contains(pin) {
            Ok(())
        } else {
            Err(DriverError::UnknownPin(pin))
        }
    }
}

impl PinPort for SimPins {
    fn set_digital(&mut self, pin: u8, high: bool) -> Result<(), DriverError> {
        self.check(pin)?;
        debug!("SIM: GPIO{} <- {}", pin, if high { "HIGH" } else { "LOW" });
        self.levels.insert(pin, high);
        self.history.push(PinOp::Digital { pin, high });
        Ok(())
    }

    fn set_pwm(&mut self, pin: u8, frequency_hz: u32, duty_cycle: u8) -> Result<(), DriverError> {
        self.check(pin)?;
        debug!("SIM: GPIO{} PWM {} Hz @ {}%", pin, frequency_hz, duty_cycle);
        self.pwm.insert(pin, (frequency_hz, duty_cycle));
        self.history.push(PinOp::PwmStart {
            pin,
            frequency_hz,
            duty_cycle,
        });
        Ok(())
    }

    fn stop_pwm(&mut self, pin: u8) -> Result<(), DriverError> {
        self.check(pin)?;
        debug!("SIM: GPIO{} PWM stopped", pin);
        self.pwm.remove(&pin);
        self.history.push(PinOp::PwmStop { pin });
        Ok(())
    }
}
