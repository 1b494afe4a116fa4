//! Mock serial transmitter for testing and development.
//!
//! This module provides a simulated serial link that records every byte the
//! engine writes, so tests can assert the exact wire dialogue.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{HardwareError, Result, traits::SerialSink};

#[derive(Debug, Default)]
struct MockSerialState {
    written: Vec<u8>,
    fail_writes: bool,
}

/// Mock serial transmitter.
///
/// Writes are appended to a buffer shared with a [`MockSerialHandle`].
///
/// # Examples
///
/// ```
/// use smslink_hardware::mock::MockSerial;
/// use smslink_hardware::traits::SerialSink;
///
/// let (mut serial, handle) = MockSerial::new();
///
/// serial.write_all(b"AT\r").unwrap();
/// serial.write_all(b"ATE0\r").unwrap();
///
/// assert_eq!(handle.take_written(), b"AT\rATE0\r");
/// assert!(handle.written().is_empty());
/// ```
#[derive(Debug)]
pub struct MockSerial {
    state: Arc<Mutex<MockSerialState>>,
}

impl MockSerial {
    /// Create a new mock transmitter.
    ///
    /// Returns a tuple of (MockSerial, MockSerialHandle) where the handle
    /// observes and controls the transmitter.
    pub fn new() -> (Self, MockSerialHandle) {
        let state = Arc::new(Mutex::new(MockSerialState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockSerialHandle { state },
        )
    }
}

impl SerialSink for MockSerial {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(HardwareError::communication("Mock serial write failure"));
        }
        state.written.extend_from_slice(bytes);
        Ok(())
    }
}

/// Handle for observing a mock transmitter.
///
/// It can be cloned and shared across tasks.
#[derive(Debug, Clone)]
pub struct MockSerialHandle {
    state: Arc<Mutex<MockSerialState>>,
}

impl MockSerialHandle {
    /// Everything written since the last [`take_written`](Self::take_written).
    pub fn written(&self) -> Vec<u8> {
        lock(&self.state).written.clone()
    }

    /// Return and clear the recorded bytes.
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut lock(&self.state).written)
    }

    /// Make subsequent writes fail with a communication error.
    pub fn set_fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }
}

fn lock(state: &Mutex<MockSerialState>) -> MutexGuard<'_, MockSerialState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
