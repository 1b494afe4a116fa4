//! Error types for link collaborators.
//!
//! This module defines the errors a serial transmitter or timer backend can
//! report to the engine, such as a closed port or a failed write.

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur while talking to the physical link.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// Port is not open or has been closed.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Device communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }
}

impl From<HardwareError> for smslink_core::Error {
    fn from(err: HardwareError) -> Self {
        match err {
            HardwareError::Io(io) => smslink_core::Error::Io(io),
            other => smslink_core::Error::Io(std::io::Error::other(other.to_string())),
        }
    }
}
