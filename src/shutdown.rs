//! Process-wide shutdown flag.
//!
//! Set from the signal handler thread; polled by the daemon between ticks
//! and by the motor driver between hold slices.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Withdraw a pending request.  An interrupted hold that was not
    /// followed by an exit can then run again.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
