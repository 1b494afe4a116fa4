//! Outbound command definitions for the modem dialogue.
//!
//! Every byte the engine transmits is one of these commands. A command is
//! encoded as up to three raw parts so the variable fields (destination,
//! message text) are written straight from their inline storage without an
//! intermediate buffer.
//!
//! # Wire Format
//!
//! ```text
//! AT\r                       Attention      (setup step 0)
//! ATE0\r                     EchoOff        (setup step 1)
//! AT+CMGF=1\r                TextMode       (setup step 2)
//! AT+CMGS="<number>"\r       Submit
//! <text>\x1A                 Payload        (after the "> " prompt)
//! \x1B                       Abort          (cancels a stale prompt)
//! ```
//!
//! # Example
//!
//! ```
//! use smslink_core::Destination;
//! use smslink_protocol::Command;
//!
//! let destination = Destination::new("+33612345678").unwrap();
//! let command = Command::Submit(&destination);
//!
//! assert_eq!(command.to_bytes(), b"AT+CMGS=\"+33612345678\"\r");
//! assert_eq!(Command::setup(1), Some(Command::EchoOff));
//! ```

use std::fmt;

use smslink_core::constants::{
    ABORT, CTRL_Z, SEND_COMMAND_PREFIX, SEND_COMMAND_SUFFIX, SETUP_COMMANDS,
};
use smslink_core::{Destination, MessageText};

/// A command written to the modem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// `AT`: checks the modem answers at all.
    Attention,

    /// `ATE0`: disables command echo.
    EchoOff,

    /// `AT+CMGF=1`: selects text message mode.
    TextMode,

    /// `AT+CMGS`: opens a message submission to a destination.
    Submit(&'a Destination),

    /// Message body followed by the Ctrl-Z terminator.
    Payload(&'a MessageText),

    /// Escape byte that cancels a pending message entry.
    Abort,
}

impl Command<'static> {
    /// The handshake sequence, in issue order.
    pub const SETUP: [Command<'static>; 3] =
        [Command::Attention, Command::EchoOff, Command::TextMode];

    /// Setup command at `step`, or `None` past the last step.
    pub fn setup(step: usize) -> Option<Self> {
        Self::SETUP.get(step).copied()
    }
}

impl<'a> Command<'a> {
    /// Raw parts in transmit order. Unused trailing parts are empty.
    pub fn parts(&self) -> [&'a [u8]; 3] {
        const CTRL_Z_BYTES: &[u8] = &[CTRL_Z];
        const ABORT_BYTES: &[u8] = &[ABORT];

        match *self {
            Command::Attention => [SETUP_COMMANDS[0], &[], &[]],
            Command::EchoOff => [SETUP_COMMANDS[1], &[], &[]],
            Command::TextMode => [SETUP_COMMANDS[2], &[], &[]],
            Command::Submit(destination) => [
                SEND_COMMAND_PREFIX,
                destination.as_bytes(),
                SEND_COMMAND_SUFFIX,
            ],
            Command::Payload(text) => [text.as_bytes(), CTRL_Z_BYTES, &[]],
            Command::Abort => [ABORT_BYTES, &[], &[]],
        }
    }

    /// Total encoded length in bytes.
    pub fn encoded_len(&self) -> usize {
        self.parts().iter().map(|part| part.len()).sum()
    }

    /// Encode into a freshly allocated vector.
    ///
    /// The engine writes [`parts`](Self::parts) directly; this is for
    /// logging and tests.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        for part in self.parts() {
            out.extend_from_slice(part);
        }
        out
    }
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Attention => write!(f, "AT"),
            Command::EchoOff => write!(f, "ATE0"),
            Command::TextMode => write!(f, "AT+CMGF=1"),
            Command::Submit(destination) => write!(f, "AT+CMGS=\"{}\"", destination),
            Command::Payload(text) => write!(f, "<{} bytes of text>", text.len()),
            Command::Abort => write!(f, "<ESC>"),
        }
    }
}
