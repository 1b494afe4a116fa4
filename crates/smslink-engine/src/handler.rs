//! Application callbacks and engine counters.

use serde::Serialize;
use smslink_core::Status;

/// Receiver of engine notifications.
///
/// Callbacks run inside the engine's consumer pass and must return quickly.
/// The byte slices passed to [`on_message`](Self::on_message) borrow the
/// engine's staging buffer and are only valid for the duration of the call;
/// copy them to keep them.
pub trait ModemHandler {
    /// Handshake completion, or the outcome of an accepted send.
    fn on_status(&mut self, status: Status);

    /// One incoming text message.
    fn on_message(&mut self, sender: &[u8], payload: &[u8]);
}

impl<H: ModemHandler + ?Sized> ModemHandler for &mut H {
    fn on_status(&mut self, status: Status) {
        (**self).on_status(status)
    }

    fn on_message(&mut self, sender: &[u8], payload: &[u8]) {
        (**self).on_message(sender, payload)
    }
}

impl<H: ModemHandler + ?Sized> ModemHandler for Box<H> {
    fn on_status(&mut self, status: Status) {
        (**self).on_status(status)
    }

    fn on_message(&mut self, sender: &[u8], payload: &[u8]) {
        (**self).on_message(sender, payload)
    }
}

/// Running counters kept by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Times the receive ring filled up and was emptied.
    pub ring_overflows: u64,

    /// Times inbound bytes were discarded because staging was full.
    pub staging_overflows: u64,

    /// Setup commands reissued after a timer expiry.
    pub handshake_retries: u64,

    /// Handshakes that reached `Ready`.
    pub handshakes_completed: u64,

    /// Stale data prompts cancelled with the abort byte.
    pub prompts_aborted: u64,

    pub sends_ok: u64,
    pub sends_failed: u64,

    pub records_delivered: u64,
    pub records_malformed: u64,

    /// Push records set aside while a send was in flight.
    pub records_deferred: u64,

    /// Push records dropped because they arrived during the handshake.
    pub records_discarded: u64,
}
