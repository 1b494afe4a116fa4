//! Shared harness for engine integration tests.
//!
//! Wraps a [`ModemEngine`] built on the mock serial transmitter and the
//! manually fired timer, so a test plays the modem's side of the dialogue
//! byte for byte and decides exactly when each armed window elapses.

#![allow(dead_code)]

use std::time::Duration;

use smslink_core::{ModemConfig, Status};
use smslink_engine::{ModemEngine, ModemHandler, ProtocolState};
use smslink_hardware::mock::{ManualTimer, ManualTimerHandle, MockSerial, MockSerialHandle};

/// Sender used by most receive scenarios.
pub const SENDER: &str = "+33612345671";

/// Destination used by most send scenarios.
pub const DESTINATION: &str = "+33612345678";

/// One callback observed by the [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Status(Status),
    Message { sender: String, payload: String },
}

/// Handler that keeps every callback in order.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
}

impl Recorder {
    pub fn statuses(&self) -> Vec<Status> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Status(status) => Some(*status),
                Event::Message { .. } => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Message { sender, payload } => Some((sender.clone(), payload.clone())),
                Event::Status(_) => None,
            })
            .collect()
    }
}

impl ModemHandler for Recorder {
    fn on_status(&mut self, status: Status) {
        self.events.push(Event::Status(status));
    }

    fn on_message(&mut self, sender: &[u8], payload: &[u8]) {
        self.events.push(Event::Message {
            sender: String::from_utf8_lossy(sender).into_owned(),
            payload: String::from_utf8_lossy(payload).into_owned(),
        });
    }
}

pub type TestEngine = ModemEngine<MockSerial, ManualTimer, Recorder>;

pub struct Harness {
    pub engine: TestEngine,
    pub wire: MockSerialHandle,
    pub clock: ManualTimerHandle,
}

impl Harness {
    /// Engine with default configuration, not started.
    pub fn new() -> Self {
        Self::with_config(ModemConfig::default())
    }

    pub fn with_config(config: ModemConfig) -> Self {
        let (serial, wire) = MockSerial::new();
        let (timer, clock) = ManualTimer::new();
        let engine = ModemEngine::new(serial, timer, Recorder::default(), config)
            .expect("valid test config");

        Self {
            engine,
            wire,
            clock,
        }
    }

    /// Engine that has issued the first setup command.
    pub fn started() -> Self {
        let mut harness = Self::new();
        harness.engine.start();
        harness
    }

    /// Engine past the handshake, with the wire and events cleared.
    pub fn ready() -> Self {
        let mut harness = Self::started();
        harness.complete_handshake();
        assert_eq!(harness.engine.state(), ProtocolState::Idle);

        harness.wire.take_written();
        harness.engine.handler_mut().events.clear();
        harness
    }

    /// Answer every setup command with `OK`.
    pub fn complete_handshake(&mut self) {
        for _ in 0..3 {
            self.feed(b"\r\nOK\r\n");
        }
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.engine.feed(bytes);
    }

    /// Deliver bytes one at a time, running the consumer whenever asked.
    pub fn feed_bytewise(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if self.engine.on_receive_byte(byte).wakes_consumer() {
                self.engine.run_consumer();
            }
        }
    }

    /// Let the armed window elapse and return its length.
    pub fn expire(&mut self) -> Duration {
        let window = self.clock.fire().expect("a timer should be armed");
        self.engine.on_timer_expired();
        window
    }

    pub fn take_written(&self) -> Vec<u8> {
        self.wire.take_written()
    }

    pub fn statuses(&self) -> Vec<Status> {
        self.engine.handler().statuses()
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.engine.handler().messages()
    }
}

/// A pushed incoming message as the modem frames it.
pub fn push_record(sender: &str, payload: &str) -> Vec<u8> {
    format!("\r\n+CMT: \"{sender}\",\"\",\"24/05/01,10:00:00+08\"\r\n{payload}\r\n").into_bytes()
}

/// Command the engine writes to open a submission to `destination`.
pub fn submission(destination: &str) -> Vec<u8> {
    format!("AT+CMGS=\"{destination}\"\r").into_bytes()
}
