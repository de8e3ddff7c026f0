//! Outbound application events.
//!
//! The scheduler and daemon emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them; in production they become log records.

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::error::{Error, SolarError};
use crate::solar::TriggerInstant;

use super::commands::MotorCommand;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The daemon loop has started.
    Started { poll_interval_secs: u64 },

    /// The daemon loop has stopped after `polls` polls.
    Stopped { polls: u64 },

    /// The scheduler's notion of "today" changed.
    DayRollover {
        previous: Option<NaiveDate>,
        today: NaiveDate,
    },

    /// Today's trigger instant was computed.
    TriggerComputed(TriggerInstant),

    /// Sunset could not be computed; today is skipped.
    SolarFailed { date: NaiveDate, error: SolarError },

    /// The motor was commanded.
    ActuationStarted {
        date: NaiveDate,
        at: DateTime<FixedOffset>,
        command: MotorCommand,
    },

    /// The motor ran for the full duration and was released.
    ActuationCompleted { date: NaiveDate },

    /// The actuation failed; pins were released.
    ActuationFailed {
        date: NaiveDate,
        error: Error,
        will_retry: bool,
    },
}
