//! Mock adapters for integration tests.
//!
//! Records every pin call so tests can assert on the full command history
//! without touching real GPIO, and can inject PWM or digital-write faults.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use coopdoor::app::events::AppEvent;
use coopdoor::app::ports::{EventSink, PinPort};
use coopdoor::error::{DriverError, SolarError};
use coopdoor::pins::PinMap;
use coopdoor::shutdown::ShutdownFlag;
use coopdoor::solar::at_local;
use embedded_hal::delay::DelayNs;

// ── Pin call record ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinCall {
    Digital { pin: u8, high: bool },
    PwmStart { pin: u8, frequency_hz: u32, duty_cycle: u8 },
    PwmStop { pin: u8 },
}

// ── MockPins ──────────────────────────────────────────────────

pub struct MockPins {
    map: PinMap,
    pub calls: Vec<PinCall>,
    levels: HashMap<u8, bool>,
    pwm_running: bool,
    /// Set if IN1 and IN2 were ever HIGH at the same time.
    pub overlap_seen: bool,
    fail_pwm_starts: u32,
    fail_pwm_stops: u32,
}

#[allow(dead_code)]
impl MockPins {
    pub fn new(map: PinMap) -> Self {
        Self {
            map,
            calls: Vec::new(),
            levels: HashMap::new(),
            pwm_running: false,
            overlap_seen: false,
            fail_pwm_starts: 0,
            fail_pwm_stops: 0,
        }
    }

    /// Fail the next `n` PWM starts.
    pub fn failing_pwm_starts(mut self, n: u32) -> Self {
        self.fail_pwm_starts = n;
        self
    }

    /// Fail the next `n` PWM stops.  The line still counts as stopped.
    pub fn failing_pwm_stops(mut self, n: u32) -> Self {
        self.fail_pwm_stops = n;
        self
    }

    pub fn level(&self, pin: u8) -> bool {
        self.levels.get(&pin).copied().unwrap_or(false)
    }

    pub fn pwm_running(&self) -> bool {
        self.pwm_running
    }

    /// PWM off and every bridge line low.
    pub fn is_safe(&self) -> bool {
        !self.pwm_running && self.map.release_order().iter().all(|p| !self.level(*p))
    }

    pub fn pwm_starts(&self) -> Vec<(u32, u8)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                PinCall::PwmStart {
                    frequency_hz,
                    duty_cycle,
                    ..
                } => Some((frequency_hz, duty_cycle)),
                _ => None,
            })
            .collect()
    }
}

impl PinPort for MockPins {
    fn set_digital(&mut self, pin: u8, high: bool) -> Result<(), DriverError> {
        self.calls.push(PinCall::Digital { pin, high });
        self.levels.insert(pin, high);
        if self.level(self.map.in1) && self.level(self.map.in2) {
            self.overlap_seen = true;
        }
        Ok(())
    }

    fn set_pwm(&mut self, pin: u8, frequency_hz: u32, duty_cycle: u8) -> Result<(), DriverError> {
        self.calls.push(PinCall::PwmStart {
            pin,
            frequency_hz,
            duty_cycle,
        });
        if self.fail_pwm_starts > 0 {
            self.fail_pwm_starts -= 1;
            return Err(DriverError::PwmStart(pin));
        }
        self.pwm_running = true;
        Ok(())
    }

    fn stop_pwm(&mut self, pin: u8) -> Result<(), DriverError> {
        self.calls.push(PinCall::PwmStop { pin });
        self.pwm_running = false;
        if self.fail_pwm_stops > 0 {
            self.fail_pwm_stops -= 1;
            return Err(DriverError::PwmStop(pin));
        }
        Ok(())
    }
}

// ── Delay ─────────────────────────────────────────────────────

/// Returns immediately; counts requested milliseconds.  Can raise a
/// shutdown request once a given amount of time has been slept.
#[derive(Default)]
pub struct InstantDelay {
    pub elapsed_ms: u64,
    trip: Option<(u64, ShutdownFlag)>,
}

#[allow(dead_code)]
impl InstantDelay {
    /// Trigger `flag` once, after `ms` of simulated sleep.
    pub fn tripping_after(ms: u64, flag: ShutdownFlag) -> Self {
        Self {
            elapsed_ms: 0,
            trip: Some((ms, flag)),
        }
    }
}

impl DelayNs for InstantDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ms += u64::from(ns) / 1_000_000;
        if self.trip.as_ref().is_some_and(|(ms, _)| self.elapsed_ms >= *ms) {
            if let Some((_, flag)) = self.trip.take() {
                flag.trigger();
            }
        }
    }
}

// ── Sunset provider ───────────────────────────────────────────

pub type SunsetFn = fn(NaiveDate, FixedOffset) -> Result<DateTime<FixedOffset>, SolarError>;

pub fn sunset_18_00(date: NaiveDate, offset: FixedOffset) -> Result<DateTime<FixedOffset>, SolarError> {
    Ok(at_local(date, hms(18, 0), offset))
}

#[allow(dead_code)]
pub fn sunset_06_30(date: NaiveDate, offset: FixedOffset) -> Result<DateTime<FixedOffset>, SolarError> {
    Ok(at_local(date, hms(6, 30), offset))
}

#[allow(dead_code)]
pub fn sunset_22_00(date: NaiveDate, offset: FixedOffset) -> Result<DateTime<FixedOffset>, SolarError> {
    Ok(at_local(date, hms(22, 0), offset))
}

pub fn hms(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn completed_dates(&self) -> Vec<NaiveDate> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::ActuationCompleted { date } => Some(*date),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::ActuationFailed { .. }))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
