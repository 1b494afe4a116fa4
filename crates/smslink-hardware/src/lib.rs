//! Link collaborator abstractions for the modem engine.
//!
//! The engine is independent of any particular port, clock or executor. This
//! crate defines the two interfaces it drives and ships implementations for
//! tests and for real hardware.
//!
//! # Collaborators
//!
//! - [`SerialSink`]: transmit raw bytes to the modem
//! - [`Timer`]: one reusable single-shot timer
//!
//! ```
//! use std::time::Duration;
//! use smslink_hardware::mock::{ManualTimer, MockSerial};
//! use smslink_hardware::{SerialSink, Timer};
//!
//! let (mut serial, serial_handle) = MockSerial::new();
//! let (mut timer, timer_handle) = ManualTimer::new();
//!
//! serial.write_all(b"AT\r").unwrap();
//! timer.arm(Duration::from_secs(1));
//!
//! assert_eq!(serial_handle.written(), b"AT\r");
//! assert_eq!(timer_handle.armed(), Some(Duration::from_secs(1)));
//! ```
//!
//! # Features
//!
//! - `hardware-serial`: [`serial`] adapter over the `serialport` crate
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`][error::Result] with a
//! [`HardwareError`], which converts into `smslink_core::Error`.

pub mod error;
pub mod mock;
#[cfg(feature = "hardware-serial")]
pub mod serial;
pub mod traits;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use traits::{SerialSink, Timer};
