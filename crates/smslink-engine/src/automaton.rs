//! Protocol state tracking for the modem dialogue.
//!
//! The [`Automaton`] owns the current [`ProtocolState`], the position inside
//! the setup handshake and a bounded history of recent transitions. It does
//! no I/O; the engine consults it to decide what a matched pattern or a timer
//! expiry means.
//!
//! # States
//!
//! - `Initializing`: running the setup handshake
//! - `Idle`: handshake complete, ready for sends and pushes
//! - `SendingWaitPrompt`: submission written, waiting for `"> "`
//! - `SendingData`: prompt seen, writing the message body
//! - `AwaitingAck`: body written, waiting for `OK` or `ERROR`
//! - `Receiving`: push marker seen, collecting the record
//!
//! # Valid Transitions
//!
//! - Initializing → Idle
//! - Idle → SendingWaitPrompt → SendingData → AwaitingAck → Idle
//! - Idle → Receiving → Idle
//!
//! Any state can be forced back to `Initializing` with
//! [`Automaton::restart`], which is how every failure recovers.
//!
//! # Examples
//!
//! ```
//! use smslink_engine::automaton::{Automaton, ProtocolState};
//!
//! let mut automaton = Automaton::new();
//! assert_eq!(automaton.state(), ProtocolState::Initializing);
//!
//! while automaton.advance_setup() {}
//! automaton.transition_to(ProtocolState::Idle).unwrap();
//!
//! assert!(automaton.transition_to(ProtocolState::AwaitingAck).is_err());
//! assert_eq!(automaton.state(), ProtocolState::Idle);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use smslink_core::{Error, Result};
use smslink_protocol::Command;

/// Maximum number of transitions kept for diagnostics.
///
/// A full send cycle is four transitions, so this covers the last few
/// dialogues plus any recovery in between.
const MAX_HISTORY_SIZE: usize = 32;

/// Phase of the modem dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolState {
    /// Running the setup handshake.
    Initializing,

    /// Ready: no operation in flight.
    Idle,

    /// Submission command written, waiting for the data prompt.
    SendingWaitPrompt,

    /// Prompt seen, message body being written.
    ///
    /// Transient: the engine leaves it in the same consumer pass.
    SendingData,

    /// Body written, waiting for the final response.
    AwaitingAck,

    /// Push marker seen, record bytes being collected.
    Receiving,
}

impl fmt::Display for ProtocolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProtocolState::Initializing => "Initializing",
            ProtocolState::Idle => "Idle",
            ProtocolState::SendingWaitPrompt => "SendingWaitPrompt",
            ProtocolState::SendingData => "SendingData",
            ProtocolState::AwaitingAck => "AwaitingAck",
            ProtocolState::Receiving => "Receiving",
        };
        write!(f, "{}", name)
    }
}

impl ProtocolState {
    /// Check whether moving to `target` is a legal step.
    ///
    /// Returning to `Initializing` is not listed: it goes through
    /// [`Automaton::restart`] from any state.
    ///
    /// # Examples
    ///
    /// ```
    /// use smslink_engine::automaton::ProtocolState;
    ///
    /// assert!(ProtocolState::Idle.can_transition_to(&ProtocolState::Receiving));
    /// assert!(!ProtocolState::Receiving.can_transition_to(&ProtocolState::AwaitingAck));
    /// ```
    pub fn can_transition_to(&self, target: &ProtocolState) -> bool {
        matches!(
            (self, target),
            (ProtocolState::Initializing, ProtocolState::Idle)
                | (
                    ProtocolState::Idle,
                    ProtocolState::SendingWaitPrompt | ProtocolState::Receiving
                )
                | (ProtocolState::SendingWaitPrompt, ProtocolState::SendingData)
                | (ProtocolState::SendingData, ProtocolState::AwaitingAck)
                | (ProtocolState::AwaitingAck, ProtocolState::Idle)
                | (ProtocolState::Receiving, ProtocolState::Idle)
        )
    }

    /// Whether a send request would be admitted in this state.
    pub fn accepts_send(&self) -> bool {
        matches!(self, ProtocolState::Idle)
    }
}

/// Record of one state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state left.
    pub from: ProtocolState,

    /// The state entered.
    pub to: ProtocolState,

    /// When the change happened. Not serialized.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    pub fn new(from: ProtocolState, to: ProtocolState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Time since the transition.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Dialogue state with handshake bookkeeping and transition history.
#[derive(Debug)]
pub struct Automaton {
    state: ProtocolState,
    state_entered_at: Instant,

    /// Index into [`Command::SETUP`] of the step awaiting `OK`.
    setup_step: usize,

    /// Timer expiries seen on the current setup step.
    setup_attempts: u8,

    history: VecDeque<StateTransition>,
}

impl Automaton {
    /// Create an automaton at the first handshake step.
    pub fn new() -> Self {
        Self {
            state: ProtocolState::Initializing,
            state_entered_at: Instant::now(),
            setup_step: 0,
            setup_attempts: 0,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }

    /// Time spent in the current state.
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Index of the setup step awaiting acknowledgement.
    pub fn setup_step(&self) -> usize {
        self.setup_step
    }

    /// The setup command for the current step.
    pub fn setup_command(&self) -> Command<'static> {
        Command::setup(self.setup_step).unwrap_or(Command::Attention)
    }

    /// Move to the next setup step after an `OK`.
    ///
    /// Returns `true` if another command must be issued, `false` once the
    /// last step has been acknowledged. Resets the attempt counter either
    /// way.
    pub fn advance_setup(&mut self) -> bool {
        self.setup_attempts = 0;
        if self.setup_step + 1 < Command::SETUP.len() {
            self.setup_step += 1;
            true
        } else {
            false
        }
    }

    /// Count one timer expiry on the current setup step and return the
    /// total so far.
    pub fn record_setup_attempt(&mut self) -> u8 {
        self.setup_attempts = self.setup_attempts.saturating_add(1);
        self.setup_attempts
    }

    pub fn setup_attempts(&self) -> u8 {
        self.setup_attempts
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Up to `count` of the most recent transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Move to `new_state` if the step is legal.
    ///
    /// # Errors
    /// Returns `Error::InvalidStateTransition` and leaves the state
    /// unchanged if the step is not allowed from the current state.
    pub fn transition_to(&mut self, new_state: ProtocolState) -> Result<StateTransition> {
        if !self.state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.state, new_state);
        self.record(transition.clone());
        Ok(transition)
    }

    /// Force the automaton back to the first handshake step.
    ///
    /// Allowed from every state, including `Initializing` itself.
    pub fn restart(&mut self) -> StateTransition {
        self.setup_step = 0;
        self.setup_attempts = 0;

        let transition = StateTransition::new(self.state, ProtocolState::Initializing);
        self.record(transition.clone());
        transition
    }

    fn record(&mut self, transition: StateTransition) {
        self.state = transition.to;
        self.state_entered_at = transition.timestamp;

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for Automaton {
    fn default() -> Self {
        Self::new()
    }
}
