//! Async host for the engine on a tokio runtime.
//!
//! The [`ModemDriver`] runs one [`ModemEngine`] on a single task over any
//! `AsyncRead + AsyncWrite` link: a serial device, a pseudo-terminal or an
//! in-memory pipe in tests. Everything the engine does happens on that task,
//! so the producer and consumer halves never interleave.
//!
//! # Architecture
//!
//! ```text
//!                    ┌──────────────────────────────┐
//!  ModemHandle ─────►│ request channel              │
//!  (cloneable)       │                              │
//!                    │   ModemEngine                │──────► ModemEvents
//!  link (read) ─────►│     on_receive_byte / feed   │        (Status, Message)
//!                    │     on_timer_expired         │
//!  sleep_until ─────►│                              │
//!                    └──────────────┬───────────────┘
//!                                   │ outbound bytes
//!                                   ▼
//!                              link (write)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use smslink_core::{ModemConfig, Status};
//! use smslink_engine::driver::{ModemDriver, ModemEvent};
//!
//! # async fn example(link: tokio::io::DuplexStream) -> Result<(), smslink_engine::driver::DriverError> {
//! let (driver, handle, mut events) = ModemDriver::spawn(link, ModemConfig::default())?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         ModemEvent::Status(Status::Ready) => {
//!             handle.send_message("+33612345678", "hello").await?;
//!         }
//!         ModemEvent::Message { sender, payload } => {
//!             println!("{}: {}", sender, payload);
//!         }
//!         ModemEvent::Status(status) => println!("Status: {}", status),
//!     }
//! }
//!
//! handle.shutdown().await?;
//! driver.join().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use bytes::BytesMut;
use smslink_core::{Admission, ModemConfig, Status};
use smslink_hardware::{SerialSink, Timer};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::automaton::ProtocolState;
use crate::engine::ModemEngine;
use crate::handler::{EngineStats, ModemHandler};

const REQUEST_CHANNEL_CAPACITY: usize = 16;
const EVENT_CHANNEL_CAPACITY: usize = 64;
const READ_CHUNK_SIZE: usize = 64;

/// Errors reported by the driver and its handle.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The driver task is no longer running.
    #[error("Modem driver has stopped")]
    Stopped,

    /// The link reported end of stream.
    #[error("Modem link closed")]
    LinkClosed,

    /// Rejected configuration or message arguments.
    #[error("Engine error: {0}")]
    Engine(#[from] smslink_core::Error),

    /// Link I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The driver task panicked or was aborted.
    #[error("Driver task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Notification from the engine, with owned data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModemEvent {
    /// Handshake completion or the outcome of an accepted send.
    Status(Status),

    /// Incoming text message. Bytes that are not UTF-8 are replaced.
    Message { sender: String, payload: String },
}

/// Receiving end of the driver's notifications.
pub type ModemEvents = mpsc::Receiver<ModemEvent>;

type DriverEngine = ModemEngine<OutboundBuffer, DeadlineTimer, EventForwarder>;

/// Collects engine writes until the task flushes them to the link.
#[derive(Debug, Default)]
struct OutboundBuffer {
    bytes: BytesMut,
}

impl SerialSink for OutboundBuffer {
    fn write_all(&mut self, bytes: &[u8]) -> smslink_hardware::Result<()> {
        self.bytes.extend_from_slice(bytes);
        Ok(())
    }
}

/// The engine's single timer as an optional tokio deadline.
#[derive(Debug, Default)]
struct DeadlineTimer {
    deadline: Option<Instant>,
}

impl Timer for DeadlineTimer {
    fn arm(&mut self, after: Duration) {
        self.deadline = Some(Instant::now() + after);
    }

    fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Forwards engine callbacks to the event channel without waiting.
struct EventForwarder {
    events: mpsc::Sender<ModemEvent>,
}

impl EventForwarder {
    fn forward(&self, event: ModemEvent) {
        if let Err(err) = self.events.try_send(event) {
            warn!("Dropping modem event: {}", err);
        }
    }
}

impl ModemHandler for EventForwarder {
    fn on_status(&mut self, status: Status) {
        self.forward(ModemEvent::Status(status));
    }

    fn on_message(&mut self, sender: &[u8], payload: &[u8]) {
        self.forward(ModemEvent::Message {
            sender: String::from_utf8_lossy(sender).into_owned(),
            payload: String::from_utf8_lossy(payload).into_owned(),
        });
    }
}

enum Request {
    Send {
        destination: String,
        text: String,
        reply: oneshot::Sender<smslink_core::Result<Admission>>,
    },
    Stats {
        reply: oneshot::Sender<EngineStats>,
    },
    State {
        reply: oneshot::Sender<ProtocolState>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle for talking to a running driver.
#[derive(Debug, Clone)]
pub struct ModemHandle {
    requests: mpsc::Sender<Request>,
}

impl ModemHandle {
    /// Submit a message.
    ///
    /// Resolves as soon as admission is decided. The outcome of an accepted
    /// send arrives later as a [`ModemEvent::Status`].
    ///
    /// # Errors
    /// Returns `DriverError::Engine` for invalid arguments and
    /// `DriverError::Stopped` if the driver is gone.
    pub async fn send_message(
        &self,
        destination: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Admission, DriverError> {
        let (reply, response) = oneshot::channel();
        self.request(Request::Send {
            destination: destination.into(),
            text: text.into(),
            reply,
        })
        .await?;

        let admission = response.await.map_err(|_| DriverError::Stopped)??;
        Ok(admission)
    }

    /// Snapshot of the engine counters.
    pub async fn stats(&self) -> Result<EngineStats, DriverError> {
        let (reply, response) = oneshot::channel();
        self.request(Request::Stats { reply }).await?;
        response.await.map_err(|_| DriverError::Stopped)
    }

    /// Current dialogue state.
    pub async fn state(&self) -> Result<ProtocolState, DriverError> {
        let (reply, response) = oneshot::channel();
        self.request(Request::State { reply }).await?;
        response.await.map_err(|_| DriverError::Stopped)
    }

    /// Stop the driver after flushing pending writes.
    ///
    /// Succeeds if the driver has already stopped.
    pub async fn shutdown(&self) -> Result<(), DriverError> {
        let (reply, response) = oneshot::channel();
        if self.request(Request::Shutdown { reply }).await.is_err() {
            return Ok(());
        }
        let _ = response.await;
        Ok(())
    }

    async fn request(&self, request: Request) -> Result<(), DriverError> {
        self.requests
            .send(request)
            .await
            .map_err(|_| DriverError::Stopped)
    }
}

/// Owner of the driver task.
pub struct ModemDriver {
    task: JoinHandle<Result<(), DriverError>>,
}

impl ModemDriver {
    /// Start the engine on a new task over `link`.
    ///
    /// The handshake begins immediately. Must be called from within a tokio
    /// runtime.
    ///
    /// # Errors
    /// Returns `DriverError::Engine` if `config` is invalid.
    pub fn spawn<L>(
        link: L,
        config: ModemConfig,
    ) -> Result<(ModemDriver, ModemHandle, ModemEvents), DriverError>
    where
        L: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (request_tx, request_rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);

        let engine = ModemEngine::new(
            OutboundBuffer::default(),
            DeadlineTimer::default(),
            EventForwarder { events: event_tx },
            config,
        )?;

        let task = tokio::spawn(run(link, engine, request_rx));

        Ok((
            ModemDriver { task },
            ModemHandle {
                requests: request_tx,
            },
            event_rx,
        ))
    }

    /// Wait for the driver task to finish.
    ///
    /// # Errors
    /// Returns the error that stopped the task, such as
    /// `DriverError::LinkClosed`.
    pub async fn join(self) -> Result<(), DriverError> {
        self.task.await?
    }

    /// Stop the task without flushing.
    pub fn abort(&self) {
        self.task.abort();
    }
}

async fn run<L>(
    link: L,
    mut engine: DriverEngine,
    mut requests: mpsc::Receiver<Request>,
) -> Result<(), DriverError>
where
    L: AsyncRead + AsyncWrite,
{
    let (mut reader, mut writer) = tokio::io::split(link);
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    engine.start();
    flush(&mut engine, &mut writer).await?;

    loop {
        let deadline = engine.timer().deadline;

        tokio::select! {
            read = reader.read(&mut chunk) => {
                let n = read?;
                if n == 0 {
                    warn!("Modem link closed");
                    return Err(DriverError::LinkClosed);
                }
                trace!("Read {} bytes from modem", n);
                engine.feed(&chunk[..n]);
            }

            () = expiry(deadline) => {
                engine.timer_mut().cancel();
                engine.on_timer_expired();
            }

            request = requests.recv() => match request {
                Some(Request::Send { destination, text, reply }) => {
                    let _ = reply.send(engine.send_message(&destination, &text));
                }
                Some(Request::Stats { reply }) => {
                    let _ = reply.send(engine.stats());
                }
                Some(Request::State { reply }) => {
                    let _ = reply.send(engine.state());
                }
                Some(Request::Shutdown { reply }) => {
                    info!("Modem driver shutting down");
                    flush(&mut engine, &mut writer).await?;
                    let _ = reply.send(());
                    return Ok(());
                }
                None => {
                    debug!("All modem handles dropped, stopping driver");
                    return Ok(());
                }
            },
        }

        flush(&mut engine, &mut writer).await?;
    }
}

/// Resolves at `deadline`, or never when no timer is armed.
async fn expiry(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn flush<W>(engine: &mut DriverEngine, writer: &mut W) -> Result<(), DriverError>
where
    W: AsyncWrite + Unpin,
{
    let outbound = engine.serial_mut().bytes.split();
    if outbound.is_empty() {
        return Ok(());
    }

    trace!("Writing {} bytes to modem", outbound.len());
    writer.write_all(&outbound).await?;
    writer.flush().await?;
    Ok(())
}
