//! Integration tests for the SolarClock → ActuationScheduler → MotorDriver
//! pipeline, driven by synthetic poll timestamps.

use core::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta};
use coopdoor::app::commands::{Direction, MotorCommand};
use coopdoor::app::events::AppEvent;
use coopdoor::drivers::motor::MotorDriver;
use coopdoor::error::{DriverError, Error, SolarError};
use coopdoor::pins::PinMap;
use coopdoor::scheduler::{ActuationScheduler, PollOutcome, SchedulerState};
use coopdoor::shutdown::ShutdownFlag;
use coopdoor::solar::{SolarClock, at_local};

use crate::mock_hw::{
    InstantDelay, MockPins, RecordingSink, SunsetFn, hms, sunset_06_30, sunset_18_00,
    sunset_22_00,
};

type Sched = ActuationScheduler<MockPins, InstantDelay, SunsetFn>;

fn cest() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).unwrap()
}

fn cet() -> FixedOffset {
    FixedOffset::east_opt(3600).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn at(d: u32, h: u32, m: u32) -> DateTime<FixedOffset> {
    at_local(day(d), hms(h, m), cest())
}

fn pin_map() -> PinMap {
    PinMap::new(23, 24, 25).unwrap()
}

fn make(sunset: SunsetFn, buffer_secs: i64, pins: MockPins) -> Sched {
    make_with(sunset, buffer_secs, pins, InstantDelay::default(), ShutdownFlag::new())
}

fn make_with(
    sunset: SunsetFn,
    buffer_secs: i64,
    pins: MockPins,
    delay: InstantDelay,
    shutdown: ShutdownFlag,
) -> Sched {
    let solar = SolarClock::new(sunset, TimeDelta::seconds(buffer_secs), hms(7, 0));
    let driver = MotorDriver::new(pins, pin_map(), 50, delay, shutdown);
    let open = MotorCommand {
        direction: Direction::Reverse,
        duty_cycle: 75,
        duration: Duration::from_secs(60),
    };
    ActuationScheduler::new(solar, driver, open)
}

// ── Sunset + 45 min, no clamp ─────────────────────────────────

#[test]
fn opens_once_at_sunset_plus_buffer() {
    let mut s = make(sunset_18_00, 2700, MockPins::new(pin_map()));
    let mut sink = RecordingSink::default();

    let mut minute = at(21, 12, 0);
    while minute < at(21, 23, 59) {
        s.poll(minute, &mut sink);
        minute += TimeDelta::minutes(1);
    }

    let trigger = s.trigger().unwrap();
    assert_eq!(trigger.at, at(21, 18, 45));
    assert!(!trigger.clamped);

    let pins = s.driver().pins();
    assert_eq!(pins.pwm_starts(), vec![(50, 75)]);
    assert!(!pins.overlap_seen);
    assert!(pins.is_safe());
    assert_eq!(sink.completed_dates(), vec![day(21)]);

    let started_at = sink.events.iter().find_map(|e| match e {
        AppEvent::ActuationStarted { at, command, .. } => Some((*at, *command)),
        _ => None,
    });
    let (started, command) = started_at.unwrap();
    assert_eq!(started, at(21, 18, 45));
    assert_eq!(command.direction, Direction::Reverse);
    assert_eq!(command.duration, Duration::from_secs(60));
}

// ── Negative buffer clamped to EARLIEST_OPEN ──────────────────

#[test]
fn negative_buffer_clamped_to_earliest_open() {
    let mut s = make(sunset_06_30, -3600, MockPins::new(pin_map()));
    let mut sink = RecordingSink::default();

    assert_eq!(
        s.poll(at(21, 6, 59), &mut sink),
        PollOutcome::Waiting { until: at(21, 7, 0) }
    );
    assert!(s.trigger().unwrap().clamped);
    assert_eq!(s.poll(at(21, 7, 0), &mut sink), PollOutcome::Actuated);
    assert_eq!(s.poll(at(21, 7, 1), &mut sink), PollOutcome::AlreadyActuated);
}

// ── Trigger past midnight ─────────────────────────────────────

#[test]
fn buffer_past_midnight_opens_every_day() {
    // 22:00 sunset + 3 h lands at 01:00 on the following date.
    let mut s = make(sunset_22_00, 3 * 3600, MockPins::new(pin_map()));
    let mut sink = RecordingSink::default();

    let mut now = at(10, 0, 0);
    while now < at(20, 0, 0) {
        s.poll(now, &mut sink);
        now += TimeDelta::minutes(5);
    }

    let opened = sink.completed_dates();
    assert_eq!(opened, (10..=18).map(day).collect::<Vec<_>>());
    let starts: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::ActuationStarted { date, at, .. } => Some((*date, *at)),
            _ => None,
        })
        .collect();
    for (date, started) in starts {
        assert_eq!(started.date_naive(), date.succ_opt().unwrap());
        assert_eq!(started.time(), hms(1, 0));
    }
    let pins = s.driver().pins();
    assert_eq!(pins.pwm_starts().len(), 9);
    assert!(pins.is_safe());

    // Day 19's trigger is still pending across the last midnight.
    assert_eq!(
        s.poll(at(20, 0, 0), &mut sink),
        PollOutcome::Waiting { until: at(20, 1, 0) }
    );
    assert_eq!(s.carried().map(|t| t.date), Some(day(19)));
}

#[test]
fn carried_trigger_fires_once_and_is_not_repeated() {
    let mut s = make(sunset_22_00, 3 * 3600, MockPins::new(pin_map()));
    let mut sink = RecordingSink::default();

    assert_eq!(
        s.poll(at(21, 23, 0), &mut sink),
        PollOutcome::Waiting { until: at(22, 1, 0) }
    );
    assert_eq!(
        s.poll(at(22, 0, 30), &mut sink),
        PollOutcome::Waiting { until: at(22, 1, 0) }
    );
    assert_eq!(s.poll(at(22, 1, 0), &mut sink), PollOutcome::Actuated);
    assert_eq!(s.last_actuated(), Some(day(21)));
    assert!(s.carried().is_none());

    // The rest of the 22nd waits for its own trigger on the 23rd.
    assert_eq!(
        s.poll(at(22, 1, 5), &mut sink),
        PollOutcome::Waiting { until: at(23, 1, 0) }
    );
    assert_eq!(s.driver().pins().pwm_starts().len(), 1);
}

// ── UTC offset change ─────────────────────────────────────────

#[test]
fn earliest_open_follows_offset_change_within_the_day() {
    // Clamped to 07:00; clocks go back from +02:00 to +01:00 overnight.
    let mut s = make(sunset_06_30, -3600, MockPins::new(pin_map()));
    let mut sink = RecordingSink::default();

    assert_eq!(
        s.poll(at(27, 0, 10), &mut sink),
        PollOutcome::Waiting { until: at(27, 7, 0) }
    );

    // 06:10 at +01:00 is already past 07:00 at +02:00.
    let early = at_local(day(27), hms(6, 10), cet());
    let floor = at_local(day(27), hms(7, 0), cet());
    assert_eq!(s.poll(early, &mut sink), PollOutcome::Waiting { until: floor });
    let trigger = s.trigger().unwrap();
    assert!(trigger.clamped);
    assert_eq!(trigger.at.offset(), &cet());
    assert!(s.driver().pins().calls.is_empty());

    assert_eq!(s.poll(floor, &mut sink), PollOutcome::Actuated);
    assert_eq!(s.last_actuated(), Some(day(27)));
}

// ── Late start ────────────────────────────────────────────────

#[test]
fn late_start_actuates_on_first_poll() {
    let mut s = make(sunset_18_00, 2700, MockPins::new(pin_map()));
    let mut sink = RecordingSink::default();
    assert_eq!(s.poll(at(21, 20, 0), &mut sink), PollOutcome::Actuated);
    assert_eq!(s.last_actuated(), Some(day(21)));
}

// ── Driver faults ─────────────────────────────────────────────

#[test]
fn pwm_start_fault_leaves_pins_safe_and_retries() {
    let mut s = make(sunset_18_00, 2700, MockPins::new(pin_map()).failing_pwm_starts(1));
    let mut sink = RecordingSink::default();

    let outcome = s.poll(at(21, 19, 0), &mut sink);
    assert_eq!(outcome, PollOutcome::Failed(Error::Driver(DriverError::PwmStart(25))));
    assert!(s.driver().pins().is_safe());
    assert_eq!(s.last_actuated(), None);
    assert!(matches!(s.state(), SchedulerState::Faulted { retry: true, .. }));
    assert_eq!(sink.failures(), 1);

    assert_eq!(s.poll(at(21, 19, 1), &mut sink), PollOutcome::Actuated);
    assert_eq!(s.last_actuated(), Some(day(21)));
    assert_eq!(s.state(), SchedulerState::Idle);
}

#[test]
fn release_fault_still_drives_lines_low() {
    let mut s = make(sunset_18_00, 2700, MockPins::new(pin_map()).failing_pwm_stops(1));
    let mut sink = RecordingSink::default();

    let outcome = s.poll(at(21, 19, 0), &mut sink);
    assert_eq!(outcome, PollOutcome::Failed(Error::Driver(DriverError::PwmStop(25))));
    let pins = s.driver().pins();
    assert!(pins.is_safe());
    assert!(!pins.level(23) && !pins.level(24) && !pins.level(25));
    assert_eq!(s.last_actuated(), None);

    assert_eq!(s.poll(at(21, 19, 1), &mut sink), PollOutcome::Actuated);
    assert_eq!(s.driver().pins().pwm_starts().len(), 2);
}

#[test]
fn interrupted_hold_is_released_and_retried() {
    let shutdown = ShutdownFlag::new();
    let delay = InstantDelay::tripping_after(30_000, shutdown.clone());
    let mut s = make_with(sunset_18_00, 2700, MockPins::new(pin_map()), delay, shutdown.clone());
    let mut sink = RecordingSink::default();

    let outcome = s.poll(at(21, 19, 0), &mut sink);
    assert_eq!(outcome, PollOutcome::Failed(Error::Driver(DriverError::Interrupted)));
    assert_eq!(s.last_actuated(), None);
    assert!(matches!(s.state(), SchedulerState::Faulted { retry: true, .. }));
    let pins = s.driver().pins();
    assert!(pins.is_safe());
    assert!(!pins.overlap_seen);
    assert_eq!(pins.pwm_starts().len(), 1);

    shutdown.clear();
    assert_eq!(s.poll(at(21, 19, 1), &mut sink), PollOutcome::Actuated);
    assert_eq!(s.last_actuated(), Some(day(21)));
    assert_eq!(sink.completed_dates(), vec![day(21)]);
    assert!(s.driver().pins().is_safe());
}

#[test]
fn fault_state_clears_at_day_rollover() {
    // Every attempt on the first day fails.
    let mut s = make(sunset_18_00, 2700, MockPins::new(pin_map()).failing_pwm_starts(3));
    let mut sink = RecordingSink::default();
    for m in [50, 51, 52] {
        assert!(matches!(s.poll(at(21, 18, m), &mut sink), PollOutcome::Failed(_)));
    }
    assert!(matches!(s.state(), SchedulerState::Faulted { .. }));

    assert!(matches!(
        s.poll(at(22, 0, 1), &mut sink),
        PollOutcome::Waiting { .. }
    ));
    assert_eq!(s.state(), SchedulerState::Idle);
    assert_eq!(s.poll(at(22, 18, 45), &mut sink), PollOutcome::Actuated);
    assert_eq!(sink.completed_dates(), vec![day(22)]);
}

// ── Solar failure ─────────────────────────────────────────────

fn dark_on_the_21st(date: NaiveDate, offset: FixedOffset) -> Result<DateTime<FixedOffset>, SolarError> {
    if date == day(21) {
        Err(SolarError::PolarNight(date))
    } else {
        sunset_18_00(date, offset)
    }
}

#[test]
fn solar_failure_skips_only_that_day() {
    let mut s = make(dark_on_the_21st, 2700, MockPins::new(pin_map()));
    let mut sink = RecordingSink::default();

    assert_eq!(s.poll(at(21, 19, 0), &mut sink), PollOutcome::Skipped);
    assert_eq!(s.poll(at(21, 23, 0), &mut sink), PollOutcome::Skipped);
    assert!(s.driver().pins().calls.is_empty());
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::SolarFailed {
            error: SolarError::PolarNight(_),
            ..
        }
    )));

    assert_eq!(s.poll(at(22, 19, 0), &mut sink), PollOutcome::Actuated);
}

// ── Rollover bookkeeping ──────────────────────────────────────

#[test]
fn rollover_event_carries_previous_day() {
    let mut s = make(sunset_18_00, 2700, MockPins::new(pin_map()));
    let mut sink = RecordingSink::default();
    s.poll(at(21, 12, 0), &mut sink);
    s.poll(at(22, 12, 0), &mut sink);

    let rollovers: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::DayRollover { previous, today } => Some((*previous, *today)),
            _ => None,
        })
        .collect();
    assert_eq!(rollovers, vec![(None, day(21)), (Some(day(21)), day(22))]);
}
