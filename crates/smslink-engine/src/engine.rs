//! The modem protocol engine.
//!
//! [`ModemEngine`] drives the whole dialogue with the modem: the setup
//! handshake, outbound message submission and collection of pushed incoming
//! messages. It performs no I/O of its own. The host feeds it three kinds of
//! event and it reacts by writing to its [`SerialSink`], arming its [`Timer`]
//! and calling its [`ModemHandler`].
//!
//! # Entry Points
//!
//! - [`on_receive_byte`](ModemEngine::on_receive_byte): producer half, one
//!   call per inbound byte. Only buffers; tells the host when the consumer
//!   should run.
//! - [`run_consumer`](ModemEngine::run_consumer): consumer half, scans the
//!   buffered bytes for the patterns the current state waits for.
//! - [`on_timer_expired`](ModemEngine::on_timer_expired): the armed window
//!   elapsed.
//!
//! Outside the handshake the consumer works on whole lines: `OK`, `ERROR`
//! and the data prompt only count at the start of a line, and a push record
//! that arrives while a send is in flight is set aside and delivered once
//! the send is over.
//!
//! The host must serialise these calls. Running the consumer as soon as the
//! producer asks for it is the expected scheduling, but the consumer always
//! re-derives its work from whatever is buffered, so late or coalesced runs
//! are harmless.
//!
//! # Example
//!
//! ```
//! use smslink_core::{Admission, ModemConfig, Status};
//! use smslink_engine::{ModemEngine, ModemHandler};
//! use smslink_hardware::mock::{ManualTimer, MockSerial};
//!
//! #[derive(Default)]
//! struct Statuses(Vec<Status>);
//!
//! impl ModemHandler for Statuses {
//!     fn on_status(&mut self, status: Status) {
//!         self.0.push(status);
//!     }
//!     fn on_message(&mut self, _sender: &[u8], _payload: &[u8]) {}
//! }
//!
//! let (serial, wire) = MockSerial::new();
//! let (timer, _clock) = ManualTimer::new();
//! let mut engine =
//!     ModemEngine::new(serial, timer, Statuses::default(), ModemConfig::default()).unwrap();
//!
//! engine.start();
//! for _ in 0..3 {
//!     engine.feed(b"OK\r\n");
//! }
//! assert_eq!(wire.take_written(), b"AT\rATE0\rAT+CMGF=1\r");
//! assert_eq!(engine.handler().0, [Status::Ready]);
//!
//! let admission = engine.send_message("+33612345678", "hi").unwrap();
//! assert_eq!(admission, Admission::Accepted);
//! engine.feed(b"> ");
//! engine.feed(b"+CMGS: 7\r\n\r\nOK\r\n");
//! assert_eq!(engine.handler().0, [Status::Ready, Status::Ok]);
//! ```

use smslink_core::constants::{
    CR, DATA_PROMPT, EXTENDED_ERRORS, LF, PUSH_MARKER, RESPONSE_ERROR, RESPONSE_OK,
    RING_CAPACITY, STAGING_CAPACITY,
};
use smslink_core::{
    Admission, Destination, MessageText, ModemConfig, PendingSend, Result, Status,
};
use smslink_hardware::{SerialSink, Timer};
use smslink_protocol::{ByteRing, Command, Comparison, RecordParser, StagingBuffer};
use tracing::{debug, info, trace, warn};

use crate::automaton::{Automaton, ProtocolState};
use crate::handler::{EngineStats, ModemHandler};

/// What the producer half did with one inbound byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Stored; nothing to do yet.
    Buffered,

    /// Dropped as a redundant line terminator.
    Suppressed,

    /// The ring was full. Its content and this byte were discarded.
    Overflowed,

    /// Stored, and it completed a line or the data prompt. The consumer
    /// should run.
    Wake,
}

impl ReceiveOutcome {
    pub fn wakes_consumer(&self) -> bool {
        matches!(self, ReceiveOutcome::Wake)
    }
}

/// Solicited response found at a line start during a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Response {
    Prompt,
    Ok,
    Error,
}

/// A complete line at the front of the ring.
#[derive(Debug, Clone, Copy)]
struct Line {
    /// Bytes up to and including the `\n`.
    len: usize,
    /// Bytes before the terminator.
    content: usize,
}

/// Serial modem protocol engine.
///
/// Owns every buffer it needs with fixed capacity. The only allocation is
/// the automaton's transition history, reserved once at construction.
pub struct ModemEngine<S, T, H> {
    serial: S,
    timer: T,
    handler: H,
    config: ModemConfig,

    ring: ByteRing<RING_CAPACITY>,
    staging: StagingBuffer<STAGING_CAPACITY>,
    automaton: Automaton,

    /// The accepted send awaiting its outcome.
    pending: Option<PendingSend>,

    /// Last byte accepted by the producer since the ring was last emptied
    /// by a reset or an overflow. Consumer passes do not clear it.
    last_received: Option<u8>,

    /// A push record was just set aside, so plain lines that follow belong
    /// to its payload.
    deferring: bool,

    stats: EngineStats,
}

impl<S, T, H> ModemEngine<S, T, H>
where
    S: SerialSink,
    T: Timer,
    H: ModemHandler,
{
    /// Create an engine. Nothing is transmitted until [`start`](Self::start).
    ///
    /// # Errors
    /// Returns `Error::Config` if `config` has a zero window or attempt
    /// limit.
    pub fn new(serial: S, timer: T, handler: H, config: ModemConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            serial,
            timer,
            handler,
            config,
            ring: ByteRing::new(),
            staging: StagingBuffer::new(),
            automaton: Automaton::new(),
            pending: None,
            last_received: None,
            deferring: false,
            stats: EngineStats::default(),
        })
    }

    /// Begin the setup handshake.
    ///
    /// Calling it again later restarts the handshake from the first command.
    pub fn start(&mut self) {
        info!("Starting modem handshake");
        self.restart_handshake();
    }

    /// Producer half: buffer one inbound byte.
    ///
    /// A line terminator is dropped when nothing has been received since
    /// the ring was last emptied, or when the previous byte was `\n`, which
    /// collapses blank lines. Bytes already taken by the consumer still count
    /// as received, so the outcome does not depend on how the stream is
    /// chunked. Asks for the consumer on `\n` and on the space completing
    /// the `"> "` prompt.
    pub fn on_receive_byte(&mut self, byte: u8) -> ReceiveOutcome {
        let previous = self.last_received;

        if (byte == CR || byte == LF) && matches!(previous, None | Some(LF)) {
            return ReceiveOutcome::Suppressed;
        }

        if let Err(err) = self.ring.push(byte) {
            self.stats.ring_overflows += 1;
            self.last_received = None;
            warn!("{}", err);
            return ReceiveOutcome::Overflowed;
        }
        self.last_received = Some(byte);

        let prompt_complete = byte == DATA_PROMPT[1] && previous == Some(DATA_PROMPT[0]);
        if byte == LF || prompt_complete {
            ReceiveOutcome::Wake
        } else {
            ReceiveOutcome::Buffered
        }
    }

    /// Feed a run of bytes and run the consumer if any of them asked for it.
    pub fn feed(&mut self, bytes: &[u8]) {
        let mut wake = false;
        for &byte in bytes {
            wake |= self.on_receive_byte(byte).wakes_consumer();
        }
        if wake {
            self.run_consumer();
        }
    }

    /// Consumer half: act on whatever is buffered.
    ///
    /// Keeps going while the state changes so that bytes following a
    /// completed response are handled in the same pass.
    pub fn run_consumer(&mut self) {
        loop {
            let state = self.automaton.state();
            trace!("Consumer pass in {} with {} bytes", state, self.ring.len());

            match state {
                ProtocolState::Initializing => {
                    self.poll_handshake();
                }
                ProtocolState::Idle => self.scan_unsolicited(),
                ProtocolState::SendingWaitPrompt => self.poll_prompt(),
                ProtocolState::SendingData => {}
                ProtocolState::AwaitingAck => self.poll_ack(),
                ProtocolState::Receiving => self.stage_ring(),
            }

            if self.automaton.state() == state || self.ring.is_empty() {
                break;
            }
        }
    }

    /// The armed window elapsed.
    pub fn on_timer_expired(&mut self) {
        let state = self.automaton.state();

        match state {
            ProtocolState::Initializing => self.retry_setup(),
            ProtocolState::Idle => trace!("Ignoring timer expiry while idle"),
            ProtocolState::SendingWaitPrompt => {
                warn!(
                    "No data prompt within {:?}",
                    self.config.prompt_timeout()
                );
                self.fail(Status::Timeout);
            }
            ProtocolState::SendingData | ProtocolState::AwaitingAck => {
                warn!(
                    "No final response within {:?}",
                    self.config.ack_timeout()
                );
                self.fail(Status::Timeout);
            }
            ProtocolState::Receiving => self.finish_receive(),
        }

        if self.automaton.state() != state && !self.ring.is_empty() {
            self.run_consumer();
        }
    }

    /// Validate and submit a message.
    ///
    /// # Errors
    /// Returns `Error::InvalidDestination` or `Error::InvalidMessage` if the
    /// arguments are rejected. Admission is only decided for valid input.
    pub fn send_message(&mut self, destination: &str, text: &str) -> Result<Admission> {
        let destination = Destination::new(destination)?;
        let text = MessageText::new(text)?;
        Ok(self.submit(PendingSend::new(destination, text)))
    }

    /// Submit an already validated message.
    ///
    /// Returns `Busy` without any side effect unless the engine is idle.
    /// Once `Accepted`, exactly one of `Ok`, `Timeout` or `Error` follows
    /// through [`ModemHandler::on_status`].
    pub fn submit(&mut self, send: PendingSend) -> Admission {
        let state = self.automaton.state();
        if !state.accepts_send() || self.pending.is_some() {
            debug!("Rejecting send to {}: engine is {}", send.destination, state);
            return Admission::Busy;
        }

        info!("Sending message to {}", send.destination);
        self.pending = Some(send);
        self.enter(ProtocolState::SendingWaitPrompt);

        match transmit(&mut self.serial, Command::Submit(&send.destination)) {
            Ok(()) => self.timer.arm(self.config.prompt_timeout()),
            Err(err) => {
                warn!("Submission write failed: {}", err);
                self.fail(Status::Error);
            }
        }

        Admission::Accepted
    }

    pub fn state(&self) -> ProtocolState {
        self.automaton.state()
    }

    /// `true` once the handshake has completed and nothing is in flight.
    pub fn is_ready(&self) -> bool {
        self.automaton.state() == ProtocolState::Idle
    }

    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// The accepted send awaiting its outcome, if any.
    pub fn pending(&self) -> Option<&PendingSend> {
        self.pending.as_ref()
    }

    /// Bytes buffered and not yet consumed.
    pub fn buffered_len(&self) -> usize {
        self.ring.len()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Look for the current setup step's `OK`, or a stale data prompt.
    ///
    /// Unrecognised bytes are skipped one at a time so an `OK` later in the
    /// buffer is still found. Returns `true` if the handshake moved on.
    fn poll_handshake(&mut self) -> bool {
        loop {
            let ok = self.ring.compare_front(RESPONSE_OK);
            let prompt = self.ring.compare_front(DATA_PROMPT);

            if ok == Comparison::Equal {
                self.consume_response(RESPONSE_OK.len());
                self.setup_acknowledged();
                return true;
            }

            if prompt == Comparison::Equal {
                // A previous session left the modem waiting for message text
                warn!("Data prompt during handshake, aborting message entry");
                self.stats.prompts_aborted += 1;
                if let Err(err) = transmit(&mut self.serial, Command::Abort) {
                    warn!("Abort write failed: {}", err);
                }
                self.ring.reset();
                self.issue_setup_command();
                return true;
            }

            if ok == Comparison::Insufficient || prompt == Comparison::Insufficient {
                return false;
            }

            match self.ring.compare_front(PUSH_MARKER) {
                Comparison::Equal => {
                    let Some(len) = self.record_len() else {
                        return false;
                    };
                    warn!("Discarding push record received during the handshake");
                    self.stats.records_discarded += 1;
                    self.discard(len);
                    continue;
                }
                Comparison::Insufficient => return false,
                Comparison::NotEqual => {}
            }

            if self.ring.skip(1).is_err() {
                return false;
            }
        }
    }

    fn setup_acknowledged(&mut self) {
        let step = self.automaton.setup_step();
        if self.automaton.advance_setup() {
            debug!("Setup step {} acknowledged", step);
            self.issue_setup_command();
            return;
        }

        self.timer.cancel();
        self.enter(ProtocolState::Idle);
        self.stats.handshakes_completed += 1;
        info!("Modem ready");
        self.handler.on_status(Status::Ready);
    }

    /// Timer expiry during the handshake: reissue the step, or start over
    /// once the attempt limit is reached.
    fn retry_setup(&mut self) {
        if self.poll_handshake() {
            return;
        }

        let attempts = self.automaton.record_setup_attempt();
        let limit = self.config.max_setup_attempts;

        if attempts >= limit {
            warn!(
                "Setup command {} unanswered after {} attempts, restarting handshake",
                self.automaton.setup_command(),
                attempts
            );
            self.handler.on_status(Status::Timeout);
            self.restart_handshake();
            return;
        }

        self.stats.handshake_retries += 1;
        debug!(
            "Reissuing setup command {} (attempt {}/{})",
            self.automaton.setup_command(),
            attempts + 1,
            limit
        );
        self.issue_setup_command();
    }

    fn issue_setup_command(&mut self) {
        let command = self.automaton.setup_command();
        debug!("Issuing setup command {}", command);

        // A failed write is retried by the next expiry
        if let Err(err) = transmit(&mut self.serial, command) {
            warn!("Setup command write failed: {}", err);
        }
        self.timer.arm(self.config.setup_timeout());
    }

    fn restart_handshake(&mut self) {
        let transition = self.automaton.restart();
        debug!("State transition: {} -> {}", transition.from, transition.to);

        self.pending = None;
        self.last_received = None;
        self.deferring = false;
        self.ring.reset();
        self.staging.reset();
        self.issue_setup_command();
    }

    /// Idle: discard unsolicited lines until a push marker shows up.
    fn scan_unsolicited(&mut self) {
        loop {
            match self.ring.compare_front(PUSH_MARKER) {
                Comparison::Equal => {
                    self.begin_receive();
                    return;
                }
                Comparison::Insufficient => return,
                Comparison::NotEqual => match self.ring.skip_until(LF) {
                    Ok(skipped) => trace!("Discarded {} byte unsolicited line", skipped),
                    Err(_) => return,
                },
            }
        }
    }

    fn begin_receive(&mut self) {
        debug!("Push record started");
        self.enter(ProtocolState::Receiving);
        self.stage_ring();
        self.timer.arm(self.config.settle_delay());
    }

    /// Move buffered bytes into staging. What does not fit is discarded.
    fn stage_ring(&mut self) {
        if let Err(err) = self.staging.refill_from(&mut self.ring) {
            warn!("Staging refill failed: {}", err);
        }

        if !self.ring.is_empty() && self.staging.remaining() == 0 {
            warn!(
                "Staging buffer full, discarding {} bytes",
                self.ring.len()
            );
            self.stats.staging_overflows += 1;
            self.ring.reset();
        }
    }

    /// Settle delay elapsed: parse everything staged and go back to idle.
    fn finish_receive(&mut self) {
        self.stage_ring();
        debug!("Receive window closed");
        self.deliver_staged();
        self.enter(ProtocolState::Idle);
    }

    /// Hand every staged record to the handler and empty staging.
    fn deliver_staged(&mut self) {
        let chunk = self.staging.view();
        let handler = &mut self.handler;
        let summary = RecordParser::parse(&self.staging, chunk, |sender, payload| {
            handler.on_message(sender, payload)
        });

        self.stats.records_delivered += summary.delivered as u64;
        self.stats.records_malformed += summary.malformed as u64;
        debug!(
            "Staged records parsed: {} delivered, {} malformed",
            summary.delivered, summary.malformed
        );

        self.staging.reset();
        self.deferring = false;
    }

    /// Waiting for `"> "`; an `ERROR` ends the send.
    fn poll_prompt(&mut self) {
        while let Some(response) = self.next_response(true) {
            match response {
                Response::Prompt => {
                    self.transmit_payload();
                    return;
                }
                Response::Error => {
                    warn!("Modem rejected the submission");
                    self.fail(Status::Error);
                    return;
                }
                Response::Ok => trace!("Ignoring OK while waiting for the data prompt"),
            }
        }
    }

    /// Walk whole lines until one the send dialogue answers to.
    ///
    /// The data prompt is only looked for when `prompt` is set. Push records
    /// are moved to staging along with the plain lines continuing their
    /// payload. Any other line is dropped. Returns `None` once the ring holds
    /// no complete line.
    fn next_response(&mut self, prompt: bool) -> Option<Response> {
        loop {
            if prompt && self.ring.compare_front(DATA_PROMPT) == Comparison::Equal {
                self.discard(DATA_PROMPT.len());
                self.deferring = false;
                return Some(Response::Prompt);
            }

            if self.ring.compare_front(PUSH_MARKER) == Comparison::Equal {
                let len = self.record_len()?;
                self.defer(len);
                continue;
            }

            let line = self.front_line()?;
            let response = if self.line_is(line, RESPONSE_OK) {
                Some(Response::Ok)
            } else if self.line_is(line, RESPONSE_ERROR) || self.has_extended_error() {
                Some(Response::Error)
            } else {
                None
            };

            if let Some(response) = response {
                self.discard(line.len);
                self.deferring = false;
                return Some(response);
            }

            if line.content == 0 {
                self.discard(line.len);
            } else if self.deferring && self.ring.iter().next() != Some(b'+') {
                trace!("Continuing payload of a deferred push record");
                self.stage_front(line.len);
            } else {
                trace!("Discarded {} byte line during send", line.len);
                self.deferring = false;
                self.discard(line.len);
            }
        }
    }

    /// Set aside a push record of `len` bytes until the send is over.
    fn defer(&mut self, len: usize) {
        debug!("Push record arrived during a send, deferring it");
        self.deferring = self.stage_front(len);
        if self.deferring {
            self.stats.records_deferred += 1;
        }
    }

    /// Move the oldest `len` bytes into staging, or drop them if they do
    /// not fit. Returns `true` if they were staged.
    fn stage_front(&mut self, len: usize) -> bool {
        match self.staging.take_from(&mut self.ring, len) {
            Ok(()) => true,
            Err(err) => {
                warn!("Dropping {} bytes of a deferred push record: {}", len, err);
                self.stats.staging_overflows += 1;
                self.discard(len);
                false
            }
        }
    }

    /// Length of the push record at the front of the ring, through the end
    /// of its first payload line, once both lines are complete.
    fn record_len(&self) -> Option<usize> {
        let header = self.ring.position(LF)?;
        let payload = self.ring.iter().skip(header + 1).position(|byte| byte == LF)?;
        Some(header + 1 + payload + 1)
    }

    fn front_line(&self) -> Option<Line> {
        let end = self.ring.position(LF)?;
        let content = match end.checked_sub(1) {
            Some(last) if self.ring.iter().nth(last) == Some(CR) => last,
            _ => end,
        };
        Some(Line {
            len: end + 1,
            content,
        })
    }

    /// `true` if the front line holds exactly `literal`.
    fn line_is(&self, line: Line, literal: &[u8]) -> bool {
        line.content == literal.len() && self.ring.compare_front(literal) == Comparison::Equal
    }

    fn has_extended_error(&self) -> bool {
        EXTENDED_ERRORS
            .iter()
            .any(|prefix| self.ring.compare_front(prefix) == Comparison::Equal)
    }

    fn transmit_payload(&mut self) {
        self.enter(ProtocolState::SendingData);

        let Some(send) = self.pending else {
            warn!("Data prompt without a pending message");
            self.fail(Status::Error);
            return;
        };

        trace!("Writing {} byte message body", send.text.len());
        if let Err(err) = transmit(&mut self.serial, Command::Payload(&send.text)) {
            warn!("Message body write failed: {}", err);
            self.fail(Status::Error);
            return;
        }

        self.enter(ProtocolState::AwaitingAck);
        self.timer.arm(self.config.ack_timeout());
    }

    /// Waiting for the final `OK` or `ERROR` after the message body.
    fn poll_ack(&mut self) {
        while let Some(response) = self.next_response(false) {
            match response {
                Response::Ok => {
                    self.complete_send();
                    return;
                }
                Response::Error => {
                    warn!("Modem reported an error for the message");
                    self.fail(Status::Error);
                    return;
                }
                Response::Prompt => {}
            }
        }
    }

    fn complete_send(&mut self) {
        self.timer.cancel();
        if let Some(send) = self.pending.take() {
            info!("Message to {} accepted by the modem", send.destination);
        }
        self.stats.sends_ok += 1;
        self.enter(ProtocolState::Idle);

        if !self.staging.is_empty() {
            self.deliver_staged();
        }
        self.handler.on_status(Status::Ok);
    }

    /// Report `status` once and recover through a fresh handshake.
    fn fail(&mut self, status: Status) {
        self.timer.cancel();
        match self.pending.take() {
            Some(send) => {
                self.stats.sends_failed += 1;
                warn!("Send to {} failed: {}", send.destination, status);
            }
            None => warn!("Dialogue failed in {}: {}", self.automaton.state(), status),
        }

        // Records set aside during the send were complete
        if !self.staging.is_empty() {
            self.deliver_staged();
        }
        self.handler.on_status(status);
        self.restart_handshake();
    }

    /// Drop a matched response and the rest of its line, if complete.
    fn consume_response(&mut self, len: usize) {
        self.discard(len);
        if self.ring.skip_until(LF).is_err() {
            trace!("Response terminator not received yet");
        }
    }

    /// Drop `n` bytes the caller has already seen in the ring.
    fn discard(&mut self, n: usize) {
        if let Err(err) = self.ring.skip(n) {
            warn!("Ring shorter than expected: {}", err);
        }
    }

    fn enter(&mut self, state: ProtocolState) {
        match self.automaton.transition_to(state) {
            Ok(transition) => debug!("State transition: {} -> {}", transition.from, transition.to),
            Err(err) => warn!("{}", err),
        }
    }
}

/// Write every non-empty part of `command`.
fn transmit<S: SerialSink>(serial: &mut S, command: Command<'_>) -> Result<()> {
    for part in command.parts() {
        if !part.is_empty() {
            serial.write_all(part)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use smslink_hardware::mock::{ManualTimer, MockSerial};

    #[derive(Default)]
    struct Ignore;

    impl ModemHandler for Ignore {
        fn on_status(&mut self, _status: Status) {}
        fn on_message(&mut self, _sender: &[u8], _payload: &[u8]) {}
    }

    fn engine() -> ModemEngine<MockSerial, ManualTimer, Ignore> {
        let (serial, _) = MockSerial::new();
        let (timer, _) = ManualTimer::new();
        ModemEngine::new(serial, timer, Ignore, ModemConfig::default()).unwrap()
    }

    #[test]
    fn test_leading_terminators_suppressed() {
        let mut engine = engine();
        assert_eq!(engine.on_receive_byte(b'\r'), ReceiveOutcome::Suppressed);
        assert_eq!(engine.on_receive_byte(b'\n'), ReceiveOutcome::Suppressed);
        assert_eq!(engine.buffered_len(), 0);
    }

    #[test]
    fn test_blank_lines_collapse() {
        let mut engine = engine();
        assert_eq!(engine.on_receive_byte(b'X'), ReceiveOutcome::Buffered);
        assert_eq!(engine.on_receive_byte(b'\r'), ReceiveOutcome::Buffered);
        assert_eq!(engine.on_receive_byte(b'\n'), ReceiveOutcome::Wake);
        assert_eq!(engine.on_receive_byte(b'\r'), ReceiveOutcome::Suppressed);
        assert_eq!(engine.on_receive_byte(b'\n'), ReceiveOutcome::Suppressed);
        assert_eq!(engine.buffered_len(), 3);
    }

    #[test]
    fn test_terminator_kept_after_consumer_empties_ring() {
        let mut engine = engine();
        assert_eq!(engine.on_receive_byte(b'X'), ReceiveOutcome::Buffered);
        assert_eq!(engine.on_receive_byte(b'\r'), ReceiveOutcome::Buffered);

        // The handshake scan drops both bytes
        engine.run_consumer();
        assert_eq!(engine.buffered_len(), 0);

        assert_eq!(engine.on_receive_byte(b'\n'), ReceiveOutcome::Wake);
    }

    #[test]
    fn test_overflow_forgets_previous_byte() {
        let mut engine = engine();
        for _ in 0..=RING_CAPACITY {
            engine.on_receive_byte(b'x');
        }
        assert_eq!(engine.on_receive_byte(b'\r'), ReceiveOutcome::Suppressed);
    }

    #[test]
    fn test_prompt_wakes_consumer() {
        let mut engine = engine();
        assert_eq!(engine.on_receive_byte(b'>'), ReceiveOutcome::Buffered);
        assert_eq!(engine.on_receive_byte(b' '), ReceiveOutcome::Wake);

        // A space after anything else does not
        assert_eq!(engine.on_receive_byte(b' '), ReceiveOutcome::Buffered);
    }

    #[test]
    fn test_overflow_counts_and_empties() {
        let mut engine = engine();
        for _ in 0..RING_CAPACITY {
            engine.on_receive_byte(b'x');
        }
        assert_eq!(engine.on_receive_byte(b'x'), ReceiveOutcome::Overflowed);
        assert_eq!(engine.buffered_len(), 0);
        assert_eq!(engine.stats().ring_overflows, 1);
    }

    #[test]
    fn test_zero_window_config_rejected() {
        let (serial, _) = MockSerial::new();
        let (timer, _) = ManualTimer::new();
        let config = ModemConfig {
            prompt_timeout_ms: 0,
            ..ModemConfig::default()
        };

        assert!(ModemEngine::new(serial, timer, Ignore, config).is_err());
    }
}
