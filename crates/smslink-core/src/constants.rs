//! Wire literals, buffer capacities and timing defaults for the modem link.
//!
//! The modem speaks a line-oriented ASCII dialogue. Solicited responses and
//! unsolicited push notifications share the same byte stream:
//!
//! ```text
//! -> AT\r
//! <- OK\r\n
//! -> AT+CMGS="+33612345678"\r
//! <- >
//! -> hi<SUB>
//! <- +CMGS: 12\r\n\r\nOK\r\n
//! <- +CMT: "+33612345671",,"24/05/10,12:46:06+08"\r\nmessage text\r\n
//! ```
//!
//! # Literals
//!
//! | Constant | Bytes | Meaning |
//! |----------|-------|---------|
//! | [`RESPONSE_OK`] | `OK` | Affirmative response line |
//! | [`RESPONSE_ERROR`] | `ERROR` | Failure line |
//! | [`EXTENDED_ERRORS`] | `+CMS ERROR`, `+CME ERROR` | Prefixes of coded failure lines |
//! | [`DATA_PROMPT`] | `> ` | Modem invites message text entry |
//! | [`PUSH_MARKER`] | `+CMT: "` | Start of an incoming text message record |
//! | [`FIELD_QUOTE`] | `"` | Closes the sender field of a record |
//!
//! Modifying these values breaks compatibility with Hayes-style modems.

// ============================================================================
// Response Literals
// ============================================================================

/// Affirmative response emitted by the modem after a successful command.
pub const RESPONSE_OK: &[u8] = b"OK";

/// Failure response emitted by the modem.
pub const RESPONSE_ERROR: &[u8] = b"ERROR";

/// Prefixes of failure lines carrying an error code, such as
/// `+CMS ERROR: 500`. Once a send is in flight these end it like a plain
/// [`RESPONSE_ERROR`].
pub const EXTENDED_ERRORS: [&[u8]; 2] = [b"+CMS ERROR", b"+CME ERROR"];

/// Data-entry prompt sent by the modem after `AT+CMGS`.
///
/// The prompt is not followed by a line terminator.
pub const DATA_PROMPT: &[u8] = b"> ";

/// Literal prefix of an unsolicited incoming text message notification.
///
/// # Examples
///
/// ```
/// use smslink_core::constants::PUSH_MARKER;
///
/// let line = b"+CMT: \"+33612345671\",,\"24/05/10,12:46:06+08\"";
/// assert!(line.starts_with(PUSH_MARKER));
/// ```
pub const PUSH_MARKER: &[u8] = b"+CMT: \"";

/// Separator closing the quoted sender field of a push record.
pub const FIELD_QUOTE: &[u8] = b"\"";

// ============================================================================
// Control Bytes
// ============================================================================

/// Carriage return.
pub const CR: u8 = b'\r';

/// Line feed. Every complete response line ends with it.
pub const LF: u8 = b'\n';

/// Terminates the message text in text mode (Ctrl-Z, SUB).
pub const CTRL_Z: u8 = 0x1A;

/// Aborts a pending message entry (ESC).
pub const ABORT: u8 = 0x1B;

// ============================================================================
// Commands
// ============================================================================

/// Handshake commands, issued strictly in this order.
///
/// 1. Plain attention command
/// 2. Local echo off
/// 3. Text mode select
pub const SETUP_COMMANDS: [&[u8]; 3] = [b"AT\r", b"ATE0\r", b"AT+CMGF=1\r"];

/// Opening of the send command, followed by the destination number.
pub const SEND_COMMAND_PREFIX: &[u8] = b"AT+CMGS=\"";

/// Closing of the send command.
pub const SEND_COMMAND_SUFFIX: &[u8] = b"\"\r";

// ============================================================================
// Capacities
// ============================================================================

/// Capacity of the receive ring in bytes.
///
/// Large enough for two back-to-back push records of maximum text length
/// when the consumer keeps up with line boundaries.
pub const RING_CAPACITY: usize = 256;

/// Capacity of the staging buffer used to assemble push records.
pub const STAGING_CAPACITY: usize = 512;

/// Maximum number of digits in a destination number.
pub const MAX_DESTINATION_DIGITS: usize = 20;

/// Maximum length of a text-mode message body.
pub const MAX_MESSAGE_LENGTH: usize = 160;

// ============================================================================
// Timing
// ============================================================================

/// Default window for a setup command to be acknowledged (milliseconds).
pub const DEFAULT_SETUP_TIMEOUT_MS: u64 = 1_000;

/// Default window for the data prompt after `AT+CMGS` (milliseconds).
pub const DEFAULT_PROMPT_TIMEOUT_MS: u64 = 5_000;

/// Default window for the network acknowledgement of a sent message
/// (milliseconds). Delivery to the network can take tens of seconds.
pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 60_000;

/// Default settle delay before parsing push records (milliseconds).
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;

/// Default number of unanswered attempts per setup command before the
/// handshake reports a timeout and restarts from the first command.
pub const DEFAULT_MAX_SETUP_ATTEMPTS: u8 = 10;

/// Default serial baud rate for cellular modems.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_commands_are_carriage_return_terminated() {
        for command in SETUP_COMMANDS {
            assert_eq!(command.last(), Some(&CR));
            assert!(command.starts_with(b"AT"));
        }
    }

    #[test]
    fn test_push_marker_ends_with_field_quote() {
        assert!(PUSH_MARKER.ends_with(FIELD_QUOTE));
    }

    #[test]
    fn test_extended_errors_end_with_plain_error() {
        for prefix in EXTENDED_ERRORS {
            assert!(prefix.ends_with(RESPONSE_ERROR));
            assert!(!prefix.starts_with(PUSH_MARKER));
        }
    }

    #[test]
    fn test_control_bytes_are_distinct() {
        assert_ne!(CTRL_Z, ABORT);
        assert!(!DATA_PROMPT.contains(&LF));
    }
}
