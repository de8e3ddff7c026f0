//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each [`AppEvent`] as one leveled
//! `log` record.  Failed days are logged at error level, skipped days at
//! warn, everything else at info.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { poll_interval_secs } => {
                info!("START | polling every {poll_interval_secs}s");
            }
            AppEvent::Stopped { polls } => {
                info!("STOP  | after {polls} polls");
            }
            AppEvent::DayRollover { previous, today } => match previous {
                Some(prev) => info!("DAY   | {prev} -> {today}"),
                None => info!("DAY   | {today}"),
            },
            AppEvent::TriggerComputed(t) => {
                info!(
                    "SUN   | sunset {} | with buffer {} | open at {}{}",
                    t.sunset.format("%H:%M:%S"),
                    t.raw.format("%H:%M:%S"),
                    t.at.format("%H:%M:%S %:z"),
                    if t.clamped { " (earliest-open floor)" } else { "" },
                );
            }
            AppEvent::SolarFailed { date, error } => {
                warn!("SUN   | no trigger for {date}: {error}; skipping the day");
            }
            AppEvent::ActuationStarted { date, at, command } => {
                info!(
                    "OPEN  | {date} at {} | {} {}% for {}s",
                    at.format("%H:%M:%S"),
                    command.direction,
                    command.duty_cycle,
                    command.duration.as_secs()
                );
            }
            AppEvent::ActuationCompleted { date } => {
                info!("OPEN  | {date} done");
            }
            AppEvent::ActuationFailed {
                date,
                error,
                will_retry,
            } => {
                error!(
                    "FAULT | {date}: {error}{}",
                    if *will_retry {
                        "; retrying on next poll"
                    } else {
                        "; halted until tomorrow"
                    }
                );
            }
        }
    }
}
