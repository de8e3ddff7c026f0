//! Door motor driver (L298N-style H-bridge).
//!
//! Direction is selected with two digital lines (IN1/IN2), power is gated by
//! PWM on the enable line (EN).
//!
//! ## Safety contract
//!
//! - IN1 and IN2 are never asserted together.  Invalid levels are rejected
//!   before any pin is written.
//! - Every actuation ends with PWM stopped and all three lines low, whether
//!   the hold completed, a pin write failed, shutdown was requested, or the
//!   thread unwound.  The `EnergisedBridge` guard owns that release.
//!
//! ## Dual-target design
//!
//! Pin writes go through [`PinPort`] and the hold through
//! [`embedded_hal::delay::DelayNs`], so the same driver runs against rppal
//! GPIO, the simulator, and test mocks.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};

use crate::app::commands::{BridgeLevels, Direction, MotorCommand};
use crate::app::ports::PinPort;
use crate::error::{DriverError, Error, Result};
use crate::pins::PinMap;
use crate::shutdown::ShutdownFlag;

/// Longest single delay between shutdown checks while holding.
pub const HOLD_SLICE_MS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    Stopped,
    Running { duty: u8, direction: Direction },
}

pub struct MotorDriver<P, D> {
    pins: P,
    map: PinMap,
    frequency_hz: u32,
    delay: D,
    shutdown: ShutdownFlag,
    state: MotorState,
}

impl<P: PinPort, D: DelayNs> MotorDriver<P, D> {
    pub fn new(pins: P, map: PinMap, frequency_hz: u32, delay: D, shutdown: ShutdownFlag) -> Self {
        Self {
            pins,
            map,
            frequency_hz,
            delay,
            shutdown,
            state: MotorState::Stopped,
        }
    }

    /// Run one [`MotorCommand`] to completion.
    pub fn actuate(&mut self, cmd: &MotorCommand) -> Result<()> {
        self.drive(cmd.direction.levels(), cmd.duty_cycle, cmd.duration)
    }

    /// Energise the bridge with explicit direction levels, hold, then release.
    pub fn drive(&mut self, levels: BridgeLevels, duty: u8, duration: Duration) -> Result<()> {
        let Some(direction) = levels.direction() else {
            error!(
                "Motor: refusing IN1={} IN2={} (exactly one direction line may be HIGH)",
                levels.in1, levels.in2
            );
            return Err(Error::InvalidDirection(levels));
        };
        if self.shutdown.is_triggered() {
            warn!("Motor: shutdown pending, not energising");
            return Err(DriverError::Interrupted.into());
        }

        let duty = duty.min(100);
        info!(
            "Motor: {} at {}% / {} Hz for {}s",
            direction,
            duty,
            self.frequency_hz,
            duration.as_secs_f32()
        );

        let bridge = match EnergisedBridge::energise(
            &mut self.pins,
            self.map,
            levels,
            self.frequency_hz,
            duty,
        ) {
            Ok(bridge) => bridge,
            Err(e) => {
                error!("Motor: energise failed ({e}), lines released");
                return Err(e.into());
            }
        };
        self.state = MotorState::Running { duty, direction };

        let held = hold(&mut self.delay, duration, &self.shutdown);
        let released = bridge.release();
        self.state = MotorState::Stopped;

        if let Err(e) = released {
            error!("Motor: release reported {e}");
        }
        held?;
        released?;
        info!("Motor: stopped");
        Ok(())
    }

    /// Force all three lines to the safe state.  Used at startup and exit.
    pub fn park(&mut self) -> Result<()> {
        self.state = MotorState::Stopped;
        release_lines(&mut self.pins, &self.map).map_err(Error::from)
    }

    pub fn state(&self) -> MotorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.state, MotorState::Stopped)
    }

    pub fn pins(&self) -> &P {
        &self.pins
    }

    pub fn pin_map(&self) -> PinMap {
        self.map
    }
}

// ── Scoped bridge acquisition ─────────────────────────────────

/// Live H-bridge.  Dropping it without [`release`](Self::release) still
/// drives every line low.
struct EnergisedBridge<'a, P: PinPort> {
    pins: &'a mut P,
    map: PinMap,
    released: bool,
}

impl<'a, P: PinPort> EnergisedBridge<'a, P> {
    fn energise(
        pins: &'a mut P,
        map: PinMap,
        levels: BridgeLevels,
        frequency_hz: u32,
        duty: u8,
    ) -> core::result::Result<Self, DriverError> {
        let mut guard = Self {
            pins,
            map,
            released: false,
        };
        // The de-asserted line goes first so both are never HIGH mid-switch.
        let (first, second) = if levels.in1 {
            ((map.in2, false), (map.in1, true))
        } else {
            ((map.in1, false), (map.in2, true))
        };
        guard.pins.set_digital(first.0, first.1)?;
        guard.pins.set_digital(second.0, second.1)?;
        guard.pins.set_pwm(map.en, frequency_hz, duty)?;
        Ok(guard)
    }

    fn release(mut self) -> core::result::Result<(), DriverError> {
        self.released = true;
        release_lines(&mut *self.pins, &self.map)
    }
}

impl<P: PinPort> Drop for EnergisedBridge<'_, P> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = release_lines(&mut *self.pins, &self.map) {
                error!("Motor: release on drop failed: {e}");
            }
        }
    }
}

/// Stop PWM, then drive EN, IN1, IN2 low.  Every line is attempted; the
/// first failure is returned.
fn release_lines<P: PinPort>(pins: &mut P, map: &PinMap) -> core::result::Result<(), DriverError> {
    let mut first_err = pins.stop_pwm(map.en).err();
    for pin in map.release_order() {
        if let Err(e) = pins.set_digital(pin, false) {
            first_err.get_or_insert(e);
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn hold<D: DelayNs>(
    delay: &mut D,
    duration: Duration,
    shutdown: &ShutdownFlag,
) -> core::result::Result<(), DriverError> {
    let mut remaining = duration.as_millis();
    while remaining > 0 {
        if shutdown.is_triggered() {
            warn!("Motor: shutdown during hold, {remaining} ms early");
            return Err(DriverError::Interrupted);
        }
        let step = remaining.min(u128::from(HOLD_SLICE_MS)) as u32;
        delay.delay_ms(step);
        remaining -= u128::from(step);
    }
    Ok(())
}
