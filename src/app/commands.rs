//! Motor commands issued by the application core.
//!
//! A [`MotorCommand`] is created by the
//! [`ActuationScheduler`](crate::scheduler::ActuationScheduler), consumed
//! immediately by [`MotorDriver`](crate::drivers::motor::MotorDriver), and
//! discarded.

use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};

/// Motor rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// IN1 high, IN2 low.
    Forward,
    /// IN1 low, IN2 high.
    Reverse,
}

impl Direction {
    /// Direction-pin levels that select this rotation.
    pub const fn levels(self) -> BridgeLevels {
        match self {
            Self::Forward => BridgeLevels { in1: true, in2: false },
            Self::Reverse => BridgeLevels { in1: false, in2: true },
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Reverse,
            Self::Reverse => Self::Forward,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Reverse => write!(f, "reverse"),
        }
    }
}

/// Requested levels of the two direction pins.
///
/// Only the two one-hot combinations are drivable; both-high shorts the
/// bridge and both-low is not a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeLevels {
    pub in1: bool,
    pub in2: bool,
}

impl BridgeLevels {
    /// Exactly one direction line asserted.
    pub const fn is_valid(self) -> bool {
        self.in1 != self.in2
    }

    /// The direction these levels select, if they are valid.
    pub const fn direction(self) -> Option<Direction> {
        match (self.in1, self.in2) {
            (true, false) => Some(Direction::Forward),
            (false, true) => Some(Direction::Reverse),
            _ => None,
        }
    }
}

/// A single timed actuation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorCommand {
    pub direction: Direction,
    /// PWM duty cycle on the enable line (0–100).
    pub duty_cycle: u8,
    /// How long the bridge stays energised.
    pub duration: Duration,
}
