//! Actuation scheduler: fires the door motor once per calendar day.
//!
//! ```text
//!              ┌──────────────[already fired today]──────────────┐
//!              ▼                                                 │
//!   ┌────────────────┐  now ≥ trigger   ┌───────────┐  Ok    ┌────┴───┐
//!   │      Idle      │ ───────────────▶ │ Actuating │ ─────▶ │  Idle  │
//!   └────────────────┘                  └─────┬─────┘        └────────┘
//!        ▲      ▲                             │ Err
//!        │      └──────[next poll, retry]─────▼
//!        │                              ┌───────────┐
//!        └────────[day rollover]─────── │  Faulted  │
//!                                       └───────────┘
//! ```
//!
//! The scheduler owns the only copy of the last-actuated date and the cached
//! trigger instant.  A buffer can push a day's trigger past its own midnight;
//! that trigger is carried into the next day and still recorded against the
//! day it was computed for, so "once per day" means once per trigger date.  It is polled by the daemon; every decision is a pure
//! function of the poll timestamp and that state, so tests drive it with
//! synthetic clocks.

use chrono::{DateTime, FixedOffset, NaiveDate};
use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::app::commands::MotorCommand;
use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, PinPort, SunsetProvider};
use crate::drivers::motor::MotorDriver;
use crate::error::Error;
use crate::solar::{SolarClock, TriggerInstant};

// ═══════════════════════════════════════════════════════════════
//  State
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the trigger instant, or done for today.
    Idle,
    /// The motor driver is running.  Also acts as the actuation lock.
    Actuating,
    /// The last attempt failed.  `retry` is false for errors that would
    /// fail identically on every attempt (a direction bug).
    Faulted { reason: Error, retry: bool },
}

/// Date of the last completed actuation.  Never rolled back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ActuationRecord(Option<NaiveDate>);

impl ActuationRecord {
    fn last(&self) -> Option<NaiveDate> {
        self.0
    }

    fn is_done(&self, date: NaiveDate) -> bool {
        self.0 == Some(date)
    }

    fn mark(&mut self, date: NaiveDate) {
        self.0 = Some(date);
    }
}

/// What a single [`ActuationScheduler::poll`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Trigger instant not reached yet.
    Waiting { until: DateTime<FixedOffset> },
    /// Today's actuation already completed.
    AlreadyActuated,
    /// No trigger could be computed for today.
    Skipped,
    /// A non-retryable fault is latched until tomorrow.
    Halted,
    /// The motor ran to completion.
    Actuated,
    /// The motor command failed; pins were released.
    Failed(Error),
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

pub struct ActuationScheduler<P, D, S> {
    solar: SolarClock<S>,
    driver: MotorDriver<P, D>,
    /// Template for the daily open command.
    open: MotorCommand,
    state: SchedulerState,
    record: ActuationRecord,
    /// Calendar day of the last poll.
    today: Option<NaiveDate>,
    /// Trigger for `today`; `None` when the sunset could not be computed.
    trigger: Option<TriggerInstant>,
    /// An earlier day's trigger that falls after its own midnight and has
    /// not fired yet.  Fires before `trigger` and is recorded against its
    /// own date.
    carried: Option<TriggerInstant>,
}

impl<P: PinPort, D: DelayNs, S: SunsetProvider> ActuationScheduler<P, D, S> {
    pub fn new(solar: SolarClock<S>, driver: MotorDriver<P, D>, open: MotorCommand) -> Self {
        Self {
            solar,
            driver,
            open,
            state: SchedulerState::Idle,
            record: ActuationRecord::default(),
            today: None,
            trigger: None,
            carried: None,
        }
    }

    /// Evaluate the schedule at `now`, actuating if due.
    pub fn poll(&mut self, now: DateTime<FixedOffset>, sink: &mut impl EventSink) -> PollOutcome {
        let today = now.date_naive();
        if self.today != Some(today) {
            self.roll_over(today, now, sink);
        } else if self.offset_changed(now) {
            debug!("Scheduler: UTC offset is now {}, recomputing trigger", now.offset());
            self.refresh_trigger(today, *now.offset(), sink);
        }

        if let Some(carried) = self.carried {
            if let SchedulerState::Faulted { retry: false, .. } = self.state {
                return PollOutcome::Halted;
            }
            if now < carried.at {
                debug!("Scheduler: waiting until {} for {}", carried.at, carried.date);
                return PollOutcome::Waiting { until: carried.at };
            }
            let outcome = self.actuate(carried.date, now, sink);
            if self.record.is_done(carried.date) {
                self.carried = None;
            }
            return outcome;
        }

        if self.record.is_done(today) {
            debug!("Scheduler: already actuated on {today}");
            return PollOutcome::AlreadyActuated;
        }
        if let SchedulerState::Faulted { retry: false, .. } = self.state {
            return PollOutcome::Halted;
        }
        let Some(trigger) = self.trigger else {
            return PollOutcome::Skipped;
        };
        if now < trigger.at {
            debug!("Scheduler: waiting until {}", trigger.at);
            return PollOutcome::Waiting { until: trigger.at };
        }

        self.actuate(trigger.date, now, sink)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn last_actuated(&self) -> Option<NaiveDate> {
        self.record.last()
    }

    pub fn trigger(&self) -> Option<TriggerInstant> {
        self.trigger
    }

    /// Previous day's trigger still waiting to fire after midnight.
    pub fn carried(&self) -> Option<TriggerInstant> {
        self.carried
    }

    pub fn driver(&self) -> &MotorDriver<P, D> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut MotorDriver<P, D> {
        &mut self.driver
    }

    // ── Internal ──────────────────────────────────────────────

    fn roll_over(&mut self, today: NaiveDate, now: DateTime<FixedOffset>, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::DayRollover {
            previous: self.today,
            today,
        });
        self.today = Some(today);
        if matches!(self.state, SchedulerState::Faulted { .. }) {
            self.state = SchedulerState::Idle;
        }

        // A trigger that was still ahead when its day ended stays pending.
        let record = self.record;
        self.carried = [self.carried, self.trigger]
            .into_iter()
            .flatten()
            .find(|t| !record.is_done(t.date) && t.at >= now);
        if let Some(carried) = self.carried {
            info!(
                "Scheduler: trigger for {} at {} carried past midnight",
                carried.date, carried.at
            );
        }

        self.refresh_trigger(today, *now.offset(), sink);
    }

    /// Today's trigger was computed under a different UTC offset and has
    /// not fired yet.
    fn offset_changed(&self, now: DateTime<FixedOffset>) -> bool {
        self.trigger
            .is_some_and(|t| t.at.offset() != now.offset() && !self.record.is_done(t.date))
    }

    fn refresh_trigger(&mut self, today: NaiveDate, offset: FixedOffset, sink: &mut impl EventSink) {
        self.trigger = match self.solar.trigger_for(today, offset) {
            Ok(trigger) => {
                if trigger.at.date_naive() != today {
                    info!(
                        "Scheduler: trigger for {} falls on {}, it stays pending past midnight",
                        today,
                        trigger.at.date_naive()
                    );
                }
                sink.emit(&AppEvent::TriggerComputed(trigger));
                Some(trigger)
            }
            Err(error) => {
                sink.emit(&AppEvent::SolarFailed { date: today, error });
                None
            }
        };
    }

    /// Run the open command and record it against `date`, the day whose
    /// trigger is being served.
    fn actuate(
        &mut self,
        date: NaiveDate,
        now: DateTime<FixedOffset>,
        sink: &mut impl EventSink,
    ) -> PollOutcome {
        let command = self.open;
        self.state = SchedulerState::Actuating;
        sink.emit(&AppEvent::ActuationStarted {
            date,
            at: now,
            command,
        });

        match self.driver.actuate(&command) {
            Ok(()) => {
                self.record.mark(date);
                self.state = SchedulerState::Idle;
                sink.emit(&AppEvent::ActuationCompleted { date });
                PollOutcome::Actuated
            }
            Err(reason) => {
                let retry = reason.is_retryable();
                self.state = SchedulerState::Faulted { reason, retry };
                sink.emit(&AppEvent::ActuationFailed {
                    date,
                    error: reason,
                    will_retry: retry,
                });
                PollOutcome::Failed(reason)
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
