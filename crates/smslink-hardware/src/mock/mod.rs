//! Mock collaborator implementations for testing and development.
//!
//! This module provides a recording serial transmitter and a manually fired
//! timer that can be controlled programmatically without a modem attached.

pub mod serial;
pub mod timer;

// Re-export commonly used types
pub use serial::{MockSerial, MockSerialHandle};
pub use timer::{ManualTimer, ManualTimerHandle};
