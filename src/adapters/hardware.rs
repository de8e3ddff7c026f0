//! Raspberry Pi GPIO adapter (feature `rpi`).
//!
//! Claims the three bridge lines through `rppal` at construction and keeps
//! them for the life of the process.  PWM on the enable line is rppal's
//! software PWM, which is adequate at the tens-of-Hz frequencies an
//! H-bridge enable input needs.

use std::collections::BTreeMap;

use log::{debug, error};
use rppal::gpio::{Gpio, OutputPin};

use crate::app::ports::PinPort;
use crate::error::DriverError;
use crate::pins::PinMap;

pub struct RppalPins {
    lines: BTreeMap<u8, OutputPin>,
}

impl RppalPins {
    /// Claim IN1, IN2 and EN as outputs, all driven low.
    pub fn new(map: PinMap) -> Result<Self, DriverError> {
        let gpio = Gpio::new().map_err(|e| {
            error!("GPIO: controller unavailable: {e}");
            DriverError::GpioUnavailable
        })?;

        let mut lines = BTreeMap::new();
        for pin in map.release_order() {
            let line = gpio
                .get(pin)
                .map_err(|e| {
                    error!("GPIO: cannot claim BCM {pin}: {e}");
                    DriverError::UnknownPin(pin)
                })?
                .into_output_low();
            lines.insert(pin, line);
        }
        debug!("GPIO: claimed IN1={} IN2={} EN={}", map.in1, map.in2, map.en);
        Ok(Self { lines })
    }

    fn line(&mut self, pin: u8) -> Result<&mut OutputPin, DriverError> {
        self.lines.get_mut(&pin).ok_or(DriverError::UnknownPin(pin))
    }
}

impl PinPort for RppalPins {
    fn set_digital(&mut self, pin: u8, high: bool) -> Result<(), DriverError> {
        let line = self.line(pin)?;
        if high {
            line.set_high();
        } else {
            line.set_low();
        }
        Ok(())
    }

    fn set_pwm(&mut self, pin: u8, frequency_hz: u32, duty_cycle: u8) -> Result<(), DriverError> {
        let duty = f64::from(duty_cycle.min(100)) / 100.0;
        self.line(pin)?
            .set_pwm_frequency(f64::from(frequency_hz), duty)
            .map_err(|e| {
                error!("GPIO: PWM start on BCM {pin} failed: {e}");
                DriverError::PwmStart(pin)
            })
    }

    fn stop_pwm(&mut self, pin: u8) -> Result<(), DriverError> {
        self.line(pin)?.clear_pwm().map_err(|e| {
            error!("GPIO: PWM stop on BCM {pin} failed: {e}");
            DriverError::PwmStop(pin)
        })
    }
}
