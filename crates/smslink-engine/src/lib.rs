//! Serial modem protocol engine.
//!
//! Drives an AT-command text messaging modem over a raw byte link: runs the
//! setup handshake, submits outgoing messages one at a time and delivers
//! incoming messages the modem pushes unprompted.
//!
//! - [`automaton`]: dialogue states, legal transitions and handshake progress
//! - [`engine`]: the sans-I/O [`ModemEngine`] fed by the host
//! - [`handler`]: application callbacks and counters
//! - [`driver`]: a tokio task hosting the engine over an async link

pub mod automaton;
pub mod driver;
pub mod engine;
pub mod handler;

pub use automaton::{Automaton, ProtocolState, StateTransition};
pub use driver::{DriverError, ModemDriver, ModemEvent, ModemEvents, ModemHandle};
pub use engine::{ModemEngine, ReceiveOutcome};
pub use handler::{EngineStats, ModemHandler};
