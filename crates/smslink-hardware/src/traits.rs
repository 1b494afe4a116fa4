//! Collaborator trait definitions.
//!
//! The engine never touches a port or a clock directly. It talks to two
//! small interfaces supplied by the host:
//!
//! - [`SerialSink`]: raw byte transmit towards the modem
//! - [`Timer`]: one reusable single-shot timer
//!
//! Both are synchronous: the engine runs inside short run-to-completion task
//! bodies and must never wait. Byte reception is the host's job; it feeds
//! each byte to the engine's receive path as it arrives.

use std::time::Duration;

use crate::error::Result;

/// Raw byte transmitter towards the modem.
///
/// # Examples
///
/// ```
/// use smslink_hardware::traits::SerialSink;
/// use smslink_hardware::Result;
///
/// struct Loopback(Vec<u8>);
///
/// impl SerialSink for Loopback {
///     fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
///         self.0.extend_from_slice(bytes);
///         Ok(())
///     }
/// }
///
/// let mut sink = Loopback(Vec::new());
/// sink.write_all(b"AT\r").unwrap();
/// assert_eq!(sink.0, b"AT\r");
/// ```
pub trait SerialSink {
    /// Queue or transmit every byte of `bytes`, in order.
    ///
    /// # Errors
    /// Returns an error if the link cannot accept the bytes. Partial writes
    /// are reported as errors; the engine treats the dialogue as broken.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;
}

impl<T: SerialSink + ?Sized> SerialSink for &mut T {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }
}

impl<T: SerialSink + ?Sized> SerialSink for Box<T> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }
}

/// Single reusable single-shot timer.
///
/// Arming replaces any pending expiry. When the expiry elapses the host
/// calls the engine's timer entry point exactly once.
pub trait Timer {
    /// Schedule an expiry `after` from now, superseding any pending one.
    fn arm(&mut self, after: Duration);

    /// Drop the pending expiry, if any.
    fn cancel(&mut self);
}

impl<T: Timer + ?Sized> Timer for &mut T {
    fn arm(&mut self, after: Duration) {
        (**self).arm(after)
    }

    fn cancel(&mut self) {
        (**self).cancel()
    }
}
