//! Runtime configuration for the modem engine.
//!
//! All windows are expressed in milliseconds so the configuration can be
//! stored as plain JSON:
//!
//! ```
//! use smslink_core::ModemConfig;
//!
//! let config = ModemConfig::from_json(r#"{ "prompt_timeout_ms": 2000 }"#).unwrap();
//! assert_eq!(config.prompt_timeout().as_millis(), 2000);
//! // Missing fields keep their defaults
//! assert_eq!(config.max_setup_attempts, 10);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ACK_TIMEOUT_MS, DEFAULT_BAUD_RATE, DEFAULT_MAX_SETUP_ATTEMPTS,
    DEFAULT_PROMPT_TIMEOUT_MS, DEFAULT_SETTLE_DELAY_MS, DEFAULT_SETUP_TIMEOUT_MS,
};
use crate::{Error, Result};

/// Timing and retry policy of the command automaton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    /// Window for each handshake command to be acknowledged.
    pub setup_timeout_ms: u64,

    /// Window for the data prompt after the send command.
    pub prompt_timeout_ms: u64,

    /// Window for the acknowledgement after the message text was written.
    pub ack_timeout_ms: u64,

    /// Delay between the first push marker and parsing the records.
    pub settle_delay_ms: u64,

    /// Unanswered attempts per handshake command before a timeout is reported
    /// and the handshake restarts from the first command.
    pub max_setup_attempts: u8,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            setup_timeout_ms: DEFAULT_SETUP_TIMEOUT_MS,
            prompt_timeout_ms: DEFAULT_PROMPT_TIMEOUT_MS,
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            max_setup_attempts: DEFAULT_MAX_SETUP_ATTEMPTS,
        }
    }
}

impl ModemConfig {
    /// Parse a configuration from JSON and validate it.
    ///
    /// # Errors
    /// Returns `Error::Config` on malformed JSON or invalid values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ModemConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every window and the attempt bound are non-zero.
    ///
    /// # Errors
    /// Returns `Error::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("setup_timeout_ms", self.setup_timeout_ms),
            ("prompt_timeout_ms", self.prompt_timeout_ms),
            ("ack_timeout_ms", self.ack_timeout_ms),
            ("settle_delay_ms", self.settle_delay_ms),
        ];
        if let Some((name, _)) = windows.iter().find(|(_, value)| *value == 0) {
            return Err(Error::Config(format!("{name} must be greater than zero")));
        }
        if self.max_setup_attempts == 0 {
            return Err(Error::Config(
                "max_setup_attempts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn setup_timeout(&self) -> Duration {
        Duration::from_millis(self.setup_timeout_ms)
    }

    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_millis(self.prompt_timeout_ms)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Physical port settings used by the `serialport` adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialSettings {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub path: String,

    /// Line speed.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Read timeout of the blocking port handle.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_read_timeout_ms() -> u64 {
    100
}

impl SerialSettings {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: default_read_timeout_ms(),
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
