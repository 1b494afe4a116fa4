use crate::{
    Result,
    constants::{ABORT, CTRL_Z, MAX_DESTINATION_DIGITS, MAX_MESSAGE_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome reported through the single completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Handshake completed, the engine accepts send requests.
    Ready,

    /// The in-flight message was acknowledged by the modem.
    Ok,

    /// An armed window elapsed without the expected response.
    Timeout,

    /// The modem answered with an explicit failure or the link failed.
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Status::Ready => "ready",
            Status::Ok => "ok",
            Status::Timeout => "timeout",
            Status::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// Synchronous answer to a send request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Admission {
    /// The request became the in-flight operation.
    Accepted,

    /// Another operation is in progress; nothing changed.
    Busy,
}

/// Destination phone number: optional leading `+`, then 1-20 digits.
///
/// Stored inline so a pending operation never allocates.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Destination {
    buf: [u8; MAX_DESTINATION_DIGITS + 1],
    len: u8,
}

impl Destination {
    /// Create a new destination with validation.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    /// Returns `Error::InvalidDestination` if the number is empty, longer than
    /// 20 digits, or contains anything other than digits after an optional `+`.
    ///
    /// # Examples
    ///
    /// ```
    /// use smslink_core::Destination;
    ///
    /// let number = Destination::new("+33612345678").unwrap();
    /// assert_eq!(number.as_str(), "+33612345678");
    ///
    /// assert!(Destination::new("+33 6 12").is_err());
    /// ```
    pub fn new(number: &str) -> Result<Self> {
        let number = number.trim();
        let digits = number.strip_prefix('+').unwrap_or(number);

        if digits.is_empty() || digits.len() > MAX_DESTINATION_DIGITS {
            return Err(Error::InvalidDestination(format!(
                "Number must have 1-{MAX_DESTINATION_DIGITS} digits, got {}",
                digits.len()
            )));
        }

        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidDestination(format!(
                "Number must contain only digits: {number}"
            )));
        }

        let mut buf = [0u8; MAX_DESTINATION_DIGITS + 1];
        buf[..number.len()].copy_from_slice(number.as_bytes());
        Ok(Destination {
            buf,
            len: number.len() as u8,
        })
    }

    /// Raw bytes as written on the wire.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    /// The number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Destination").field(&self.as_str()).finish()
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Destination {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Destination::new(s)
    }
}

/// Text-mode message body (1-160 bytes).
///
/// Only printable ASCII and line breaks are accepted. The terminator
/// (`0x1A`) and abort (`0x1B`) bytes can never appear in the body, so the
/// modem cannot be cut off mid-entry by user text.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MessageText {
    buf: [u8; MAX_MESSAGE_LENGTH],
    len: u8,
}

impl MessageText {
    /// Create a new message body with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidMessage` if the text is empty, longer than
    /// 160 bytes, or contains control bytes other than `\r` and `\n`.
    ///
    /// # Examples
    ///
    /// ```
    /// use smslink_core::MessageText;
    ///
    /// let text = MessageText::new("hi").unwrap();
    /// assert_eq!(text.as_bytes(), b"hi");
    ///
    /// assert!(MessageText::new("").is_err());
    /// assert!(MessageText::new("cut\x1a").is_err());
    /// ```
    pub fn new(text: &str) -> Result<Self> {
        let len = text.len();
        if len == 0 || len > MAX_MESSAGE_LENGTH {
            return Err(Error::InvalidMessage(format!(
                "Text must be 1-{MAX_MESSAGE_LENGTH} bytes, got {len}"
            )));
        }

        if let Some(bad) = text.bytes().find(|&b| !is_text_byte(b)) {
            return Err(Error::InvalidMessage(format!(
                "Unsupported byte 0x{bad:02X} in text"
            )));
        }

        let mut buf = [0u8; MAX_MESSAGE_LENGTH];
        buf[..len].copy_from_slice(text.as_bytes());
        Ok(MessageText {
            buf,
            len: len as u8,
        })
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn is_text_byte(b: u8) -> bool {
    match b {
        CTRL_Z | ABORT => false,
        b'\r' | b'\n' => true,
        _ => b.is_ascii_graphic() || b == b' ',
    }
}

impl fmt::Debug for MessageText {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("MessageText").field(&self.as_str()).finish()
    }
}

impl fmt::Display for MessageText {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MessageText {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MessageText::new(s)
    }
}

/// A send request captured when admission succeeds.
///
/// Owned exclusively by the automaton until the outcome is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSend {
    pub destination: Destination,
    pub text: MessageText,
}

impl PendingSend {
    pub fn new(destination: Destination, text: MessageText) -> Self {
        Self { destination, text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("+33612345678", "+33612345678")]
    #[case("0612345678", "0612345678")]
    #[case("  112 ", "112")]
    #[case("+12345678901234567890", "+12345678901234567890")]
    fn test_destination_valid(#[case] input: &str, #[case] expected: &str) {
        let number: Destination = input.parse().unwrap();
        assert_eq!(number.as_str(), expected);
        assert_eq!(number.as_bytes(), expected.as_bytes());
    }

    #[rstest]
    #[case("")] // empty
    #[case("+")] // sign only
    #[case("+336 1234")] // embedded space
    #[case("33a12")] // letter
    #[case("123456789012345678901")] // 21 digits
    #[case("++33")] // double sign
    fn test_destination_invalid(#[case] input: &str) {
        let result: Result<Destination> = input.parse();
        assert!(matches!(result, Err(Error::InvalidDestination(_))));
    }

    #[rstest]
    #[case("hi")]
    #[case("message 2\nfd")]
    #[case("line one\r\nline two")]
    fn test_message_text_valid(#[case] input: &str) {
        let text = MessageText::new(input).unwrap();
        assert_eq!(text.as_str(), input);
        assert_eq!(text.len(), input.len());
    }

    #[rstest]
    #[case("")]
    #[case("stop\x1a")]
    #[case("esc\x1b")]
    #[case("tab\t")]
    #[case("caf\u{e9}")]
    fn test_message_text_invalid(#[case] input: &str) {
        assert!(matches!(
            MessageText::new(input),
            Err(Error::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_message_text_length_limit() {
        let max = "x".repeat(MAX_MESSAGE_LENGTH);
        assert!(MessageText::new(&max).is_ok());

        let over = "x".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(MessageText::new(&over).is_err());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::Ready.to_string(), "ready");
        assert_eq!(Status::Timeout.to_string(), "timeout");
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&Status::Ok).unwrap();
        assert_eq!(json, "\"ok\"");
        let status: Status = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(status, Status::Error);
    }
}
