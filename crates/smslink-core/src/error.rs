use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Buffer errors
    #[error("Ring overflow: capacity of {capacity} bytes exceeded, buffer reset")]
    RingOverflow { capacity: usize },

    #[error("Buffer is empty")]
    BufferEmpty,

    #[error("Insufficient data: requested {requested} bytes, {available} available")]
    Insufficient { requested: usize, available: usize },

    #[error("Delimiter not found")]
    NotFound,

    #[error("Staging buffer full: {capacity} bytes")]
    StagingOverflow { capacity: usize },

    // Validation errors
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    #[error("Invalid message text: {0}")]
    InvalidMessage(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    // Automaton errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
