//! Physical serial port adapter built on the `serialport` crate.
//!
//! Enabled with the `hardware-serial` feature. The port is split in two
//! handles sharing the same device: a [`SerialPortSink`] given to the engine
//! and a [`SerialPortSource`] polled by the host's receive loop.
//!
//! ```no_run
//! use smslink_core::SerialSettings;
//! use smslink_hardware::serial;
//!
//! # fn example() -> smslink_hardware::Result<()> {
//! let settings = SerialSettings::new("/dev/ttyUSB0");
//! let (sink, mut source) = serial::open(&settings)?;
//!
//! let mut buf = [0u8; 64];
//! let n = source.read_chunk(&mut buf)?;
//! # Ok(())
//! # }
//! ```

use std::io::{ErrorKind, Read, Write};

use serialport::SerialPort;
use smslink_core::SerialSettings;
use tracing::{debug, info};

use crate::{HardwareError, Result, traits::SerialSink};

/// Open the port described by `settings`.
///
/// # Errors
/// Returns `HardwareError::CommunicationError` if the port cannot be opened
/// or its handle cannot be duplicated.
pub fn open(settings: &SerialSettings) -> Result<(SerialPortSink, SerialPortSource)> {
    info!(
        "Opening serial port {} at {} baud",
        settings.path, settings.baud_rate
    );
    let port = serialport::new(&settings.path, settings.baud_rate)
        .timeout(settings.read_timeout())
        .open()
        .map_err(|e| HardwareError::communication(format!("{}: {e}", settings.path)))?;

    split(port)
}

/// Split an already opened port into transmit and receive halves.
///
/// # Errors
/// Returns `HardwareError::CommunicationError` if the handle cannot be
/// duplicated.
pub fn split(port: Box<dyn SerialPort>) -> Result<(SerialPortSink, SerialPortSource)> {
    let reader = port
        .try_clone()
        .map_err(|e| HardwareError::communication(format!("Cannot clone port handle: {e}")))?;

    Ok((SerialPortSink { port }, SerialPortSource { port: reader }))
}

/// Transmit half of a physical port.
pub struct SerialPortSink {
    port: Box<dyn SerialPort>,
}

impl SerialSink for SerialPortSink {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }
}

/// Receive half of a physical port.
pub struct SerialPortSource {
    port: Box<dyn SerialPort>,
}

impl SerialPortSource {
    /// Read whatever is available into `buf`.
    ///
    /// Returns `Ok(0)` when the read timeout elapses without data, so the
    /// host loop can service timers between polls.
    ///
    /// # Errors
    /// Returns `HardwareError::Disconnected` when the device reports end of
    /// stream, or `HardwareError::Io` for other failures.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.port.read(buf) {
            Ok(0) => Err(HardwareError::disconnected(
                self.port.name().unwrap_or_else(|| "serial".to_string()),
            )),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::TimedOut => {
                debug!("Serial read timed out without data");
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }
}
