//! Poll loop.
//!
//! Wakes every `SLEEP_DURATION`, asks the scheduler whether the door is due,
//! and goes back to sleep.  The sleep is cut into slices of at most one
//! second so a shutdown request is noticed promptly.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::app::events::AppEvent;
use crate::app::ports::{Clock, EventSink, PinPort, SunsetProvider};
use crate::scheduler::{ActuationScheduler, PollOutcome};
use crate::shutdown::ShutdownFlag;

/// Longest uninterrupted sleep between shutdown checks.
pub const SLEEP_SLICE: Duration = Duration::from_secs(1);

pub struct Daemon<C, E, W> {
    clock: C,
    sink: E,
    /// Wall-clock sleeper; separate from the motor's hold delay.
    sleeper: W,
    poll_interval: Duration,
    shutdown: ShutdownFlag,
    polls: u64,
}

impl<C: Clock, E: EventSink, W: DelayNs> Daemon<C, E, W> {
    pub fn new(
        clock: C,
        sink: E,
        sleeper: W,
        poll_interval: Duration,
        shutdown: ShutdownFlag,
    ) -> Self {
        Self {
            clock,
            sink,
            sleeper,
            poll_interval,
            shutdown,
            polls: 0,
        }
    }

    /// Run until the shutdown flag is raised.  Returns the number of polls.
    pub fn run<P, D, S>(&mut self, scheduler: &mut ActuationScheduler<P, D, S>) -> u64
    where
        P: PinPort,
        D: DelayNs,
        S: SunsetProvider,
    {
        self.sink.emit(&AppEvent::Started {
            poll_interval_secs: self.poll_interval.as_secs(),
        });

        while !self.shutdown.is_triggered() {
            self.poll_once(scheduler);
            self.sleep();
        }

        info!("Daemon: shutdown requested after {} polls", self.polls);
        self.sink.emit(&AppEvent::Stopped { polls: self.polls });
        self.polls
    }

    /// One scheduler evaluation at the current wall-clock time.
    pub fn poll_once<P, D, S>(&mut self, scheduler: &mut ActuationScheduler<P, D, S>) -> PollOutcome
    where
        P: PinPort,
        D: DelayNs,
        S: SunsetProvider,
    {
        let now = self.clock.now();
        self.polls += 1;
        let outcome = scheduler.poll(now, &mut self.sink);
        debug!("Daemon: poll #{} at {} -> {:?}", self.polls, now, outcome);
        outcome
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    fn sleep(&mut self) {
        let mut remaining = self.poll_interval;
        while !remaining.is_zero() && !self.shutdown.is_triggered() {
            let step = remaining.min(SLEEP_SLICE);
            self.sleeper.delay_ms(step.as_millis() as u32);
            remaining -= step;
        }
    }
}
