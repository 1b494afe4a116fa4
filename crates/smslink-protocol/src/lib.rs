//! Byte-level building blocks of the modem link.
//!
//! - [`ByteRing`]: fixed-capacity receive queue with front pattern matching
//! - [`StagingBuffer`]: linear scratch buffer with view-based extraction
//! - [`RecordParser`]: pulls incoming text message records out of a chunk
//! - [`Command`]: outbound command encoding

pub mod commands;
pub mod record;
pub mod ring;
pub mod staging;

pub use commands::Command;
pub use record::{ParseSummary, RecordParser};
pub use ring::{ByteRing, Comparison};
pub use staging::{StagingBuffer, View};
