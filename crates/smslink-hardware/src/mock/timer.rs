//! Manually fired timer for deterministic tests.
//!
//! The engine arms the timer; the test decides when the expiry happens by
//! taking the armed window from the handle and calling the engine's timer
//! entry point.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::traits::Timer;

#[derive(Debug, Default)]
struct ManualTimerState {
    armed: Option<Duration>,
    arm_count: usize,
}

/// Timer that never fires on its own.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use smslink_hardware::mock::ManualTimer;
/// use smslink_hardware::traits::Timer;
///
/// let (mut timer, handle) = ManualTimer::new();
///
/// timer.arm(Duration::from_secs(1));
/// timer.arm(Duration::from_secs(5)); // supersedes the first window
///
/// assert_eq!(handle.fire(), Some(Duration::from_secs(5)));
/// assert_eq!(handle.fire(), None);
/// assert_eq!(handle.arm_count(), 2);
/// ```
#[derive(Debug)]
pub struct ManualTimer {
    state: Arc<Mutex<ManualTimerState>>,
}

impl ManualTimer {
    pub fn new() -> (Self, ManualTimerHandle) {
        let state = Arc::new(Mutex::new(ManualTimerState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            ManualTimerHandle { state },
        )
    }
}

impl Timer for ManualTimer {
    fn arm(&mut self, after: Duration) {
        let mut state = lock(&self.state);
        state.armed = Some(after);
        state.arm_count += 1;
    }

    fn cancel(&mut self) {
        lock(&self.state).armed = None;
    }
}

/// Handle for inspecting and firing a [`ManualTimer`].
#[derive(Debug, Clone)]
pub struct ManualTimerHandle {
    state: Arc<Mutex<ManualTimerState>>,
}

impl ManualTimerHandle {
    /// Window of the pending expiry, if armed.
    pub fn armed(&self) -> Option<Duration> {
        lock(&self.state).armed
    }

    /// Consume the pending expiry.
    ///
    /// Returns the window that elapsed, or `None` if nothing was armed. The
    /// caller then runs the engine's timer entry point.
    pub fn fire(&self) -> Option<Duration> {
        lock(&self.state).armed.take()
    }

    /// Total number of `arm` calls.
    pub fn arm_count(&self) -> usize {
        lock(&self.state).arm_count
    }
}

fn lock(state: &Mutex<ManualTimerState>) -> MutexGuard<'_, ManualTimerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
