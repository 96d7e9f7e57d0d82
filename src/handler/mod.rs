//! The serial port handler: open/read-loop/close lifecycle of one port.
//!
//! # Threads
//!
//! Two threads touch a handler: the controlling thread calling `open`,
//! `close`, `write` and `dispose`, and one reader thread per open session.
//! Data and fault subscribers run on the reader thread, one chunk at a time,
//! in the order the bytes were read.
//!
//! ```text
//! open ──> PortOpener::open ──> DTR/RTS ──> spawn reader
//!                                              │ every poll interval
//!                                              ├─ read_available ─> decode ─> data subscribers
//!                                              └─ error ─────────────────────> fault subscribers
//! close ─> running = false ─> unpark ─> wait (bounded) ─> drop port
//! ```

mod builder;
mod events;
mod reader;
mod subscribers;

pub use builder::HandlerBuilder;
pub use events::ReaderEvent;
pub use subscribers::{SubscriptionId, Subscribers};

use crate::config::Config;
use crate::encoding::{TextDecoder, TextEncoding};
use crate::error::{HandlerError, HandlerResult};
use crate::port::{LineConfig, PortError, PortOpener, SerialPortAdapter};
use parking_lot::Mutex;
use reader::Reader;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default delay between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default bound on how long `close` waits for the reader.
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of consecutive failed polls before `DeviceLost`.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 10;

type SharedPort = Arc<Mutex<Box<dyn SerialPortAdapter>>>;

/// Behaviour of the background reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Sleep between polls, whether or not data was found.
    pub poll_interval: Duration,
    /// How long `close` waits for the reader before detaching it.
    /// `None` waits indefinitely.
    pub join_timeout: Option<Duration>,
    /// How received bytes become text.
    pub encoding: TextEncoding,
    /// Consecutive failures that raise [`ReaderEvent::DeviceLost`].
    pub failure_threshold: Option<u32>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            join_timeout: Some(DEFAULT_JOIN_TIMEOUT),
            encoding: TextEncoding::Utf8,
            failure_threshold: Some(DEFAULT_FAILURE_THRESHOLD),
        }
    }
}

impl ReaderOptions {
    fn validate(&self) -> HandlerResult<()> {
        if self.poll_interval.is_zero() {
            return Err(HandlerError::invalid("poll interval must be greater than zero"));
        }
        if self.failure_threshold == Some(0) {
            return Err(HandlerError::invalid(
                "failure threshold must be at least 1 (use none to disable)",
            ));
        }
        Ok(())
    }
}

/// What `close` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// The handler was not open.
    AlreadyClosed,
    /// The reader finished and the port was released.
    Closed,
    /// The reader did not finish in time, or `close` ran on the reader
    /// thread itself. It will exit on its own; the port is released then.
    Detached,
}

/// State shared with the reader thread.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    data: Subscribers<str>,
    faults: Subscribers<ReaderEvent>,
}

/// One open period of the port.
struct Session {
    port: SharedPort,
    running: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    done: mpsc::Receiver<()>,
}

impl Session {
    fn shutdown(self, port_name: &str, join_timeout: Option<Duration>) -> CloseOutcome {
        let Session {
            port,
            running,
            reader,
            done,
        } = self;

        // Stop flag first, or the reader never sees it.
        running.store(false, Ordering::Release);
        reader.thread().unpark();

        let outcome = if reader.thread().id() == thread::current().id() {
            debug!(port = port_name, "close called from the reader thread");
            CloseOutcome::Detached
        } else if wait_for_exit(&done, join_timeout) {
            if reader.join().is_err() {
                warn!(port = port_name, "reader thread panicked");
            }
            CloseOutcome::Closed
        } else {
            warn!(
                port = port_name,
                timeout = ?join_timeout,
                "reader did not stop in time; detaching it"
            );
            CloseOutcome::Detached
        };

        // Last strong reference unless a detached reader still holds one.
        drop(port);
        outcome
    }
}

/// `true` once the reader has dropped its end of the channel.
fn wait_for_exit(done: &mpsc::Receiver<()>, timeout: Option<Duration>) -> bool {
    match timeout {
        Some(limit) => !matches!(done.recv_timeout(limit), Err(RecvTimeoutError::Timeout)),
        None => {
            let _ = done.recv();
            true
        }
    }
}

/// Owns one serial port and the thread that polls it.
///
/// ```no_run
/// use serial_handler::SerialPortHandler;
///
/// let handler = SerialPortHandler::builder("/dev/ttyUSB0").baud_rate(115_200).build()?;
/// handler.subscribe(|text| print!("{text}"));
/// handler.open()?;
/// // ...
/// handler.close();
/// # Ok::<(), serial_handler::HandlerError>(())
/// ```
pub struct SerialPortHandler {
    port_name: String,
    line: LineConfig,
    options: ReaderOptions,
    opener: Arc<dyn PortOpener>,
    session: Mutex<Option<Session>>,
    disposed: AtomicBool,
    shared: Arc<Shared>,
}

impl SerialPortHandler {
    /// Handler for `port_name` with the given line parameters and default
    /// reader options, backed by the OS serial driver.
    pub fn new(port_name: impl Into<String>, line: LineConfig) -> HandlerResult<Self> {
        HandlerBuilder::new(port_name).line_config(line).build()
    }

    pub fn builder(port_name: impl Into<String>) -> HandlerBuilder {
        HandlerBuilder::new(port_name)
    }

    /// Builder primed from the `[serial]` and `[reader]` config sections.
    pub fn builder_from_config(config: &Config) -> HandlerResult<HandlerBuilder> {
        let port_name = config
            .serial
            .require_port()
            .map_err(|e| HandlerError::invalid(e.to_string()))?;
        let line = config
            .serial
            .line_config()
            .map_err(|e| HandlerError::invalid(e.to_string()))?;
        Ok(HandlerBuilder::new(port_name)
            .line_config(line)
            .options(config.reader.options()))
    }

    pub fn from_config(config: &Config) -> HandlerResult<Self> {
        Self::builder_from_config(config)?.build()
    }

    pub(crate) fn assemble(
        port_name: String,
        line: LineConfig,
        options: ReaderOptions,
        opener: Arc<dyn PortOpener>,
    ) -> Self {
        Self {
            port_name,
            line,
            options,
            opener,
            session: Mutex::new(None),
            disposed: AtomicBool::new(false),
            shared: Arc::new(Shared::default()),
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn line_config(&self) -> &LineConfig {
        &self.line
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn is_open(&self) -> bool {
        self.session.lock().is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Open the port and start the reader. Does nothing if already open.
    ///
    /// # Errors
    ///
    /// - `HandlerError::PortUnavailable` if the device is missing, busy, or
    ///   rejects the line parameters; the handler stays closed.
    /// - `HandlerError::Disposed` after [`dispose`](Self::dispose).
    pub fn open(&self) -> HandlerResult<()> {
        let mut session = self.session.lock();
        if self.is_disposed() {
            return Err(HandlerError::Disposed);
        }
        if session.is_some() {
            debug!(port = %self.port_name, "open ignored; already open");
            return Ok(());
        }

        let mut port = self
            .opener
            .open(&self.port_name, &self.line)
            .map_err(|source| {
                warn!(port = %self.port_name, error = %source, "failed to open serial port");
                HandlerError::PortUnavailable {
                    port: self.port_name.clone(),
                    source,
                }
            })?;
        self.assert_control_lines(port.as_mut());

        let port: SharedPort = Arc::new(Mutex::new(port));
        let running = Arc::new(AtomicBool::new(true));
        let (done_tx, done_rx) = mpsc::channel();
        let reader = Reader {
            port_name: self.port_name.clone(),
            port: Arc::clone(&port),
            running: Arc::clone(&running),
            shared: Arc::clone(&self.shared),
            decoder: TextDecoder::new(self.options.encoding),
            poll_interval: self.options.poll_interval,
            failure_threshold: self.options.failure_threshold,
            done: done_tx,
        };

        let handle = thread::Builder::new()
            .name(format!("serial-reader:{}", self.port_name))
            .spawn(move || reader.run())
            .map_err(|e| HandlerError::Io(PortError::Io(e)))?;

        *session = Some(Session {
            port,
            running,
            reader: handle,
            done: done_rx,
        });
        info!(
            port = %self.port_name,
            baud = self.line.baud_rate,
            parity = ?self.line.parity,
            data_bits = ?self.line.data_bits,
            stop_bits = ?self.line.stop_bits,
            handshake = ?self.line.handshake,
            "serial port opened"
        );
        Ok(())
    }

    fn assert_control_lines(&self, port: &mut dyn SerialPortAdapter) {
        if let Err(error) = port.write_data_terminal_ready(self.line.data_terminal_ready) {
            warn!(port = %self.port_name, %error, "could not set DTR");
        }
        if let Err(error) = port.write_request_to_send(self.line.request_to_send) {
            warn!(port = %self.port_name, %error, "could not set RTS");
        }
    }

    /// Stop the reader and release the port. Does nothing if already closed.
    ///
    /// Never fails. Once this returns `Closed`, no subscriber is invoked for
    /// this session. The wait is bounded by
    /// [`ReaderOptions::join_timeout`]; see [`CloseOutcome::Detached`].
    pub fn close(&self) -> CloseOutcome {
        let Some(session) = self.session.lock().take() else {
            return CloseOutcome::AlreadyClosed;
        };
        let outcome = session.shutdown(&self.port_name, self.options.join_timeout);
        info!(port = %self.port_name, ?outcome, "serial port closed");
        outcome
    }

    /// Close the port and retire the handler for good.
    ///
    /// Safe to call repeatedly and without a prior `open`. Subscriptions are
    /// dropped; later `open` and `write` calls return `Disposed`.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.close();
        self.shared.data.clear();
        self.shared.faults.clear();
        debug!(port = %self.port_name, "handler disposed");
    }

    /// Write `data` to the open port once. No retry, no framing.
    pub fn write(&self, data: &[u8]) -> HandlerResult<usize> {
        if self.is_disposed() {
            return Err(HandlerError::Disposed);
        }
        let port = self
            .session
            .lock()
            .as_ref()
            .map(|session| Arc::clone(&session.port))
            .ok_or(HandlerError::NotOpen)?;

        let written = port.lock().write_bytes(data)?;
        debug!(port = %self.port_name, bytes = written, "wrote to serial port");
        Ok(written)
    }

    /// Register a callback for received text. Runs on the reader thread.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.shared.data.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.data.unsubscribe(id)
    }

    /// Register a callback for reader faults. Runs on the reader thread.
    pub fn subscribe_faults<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ReaderEvent) + Send + Sync + 'static,
    {
        self.shared.faults.subscribe(callback)
    }

    pub fn unsubscribe_faults(&self, id: SubscriptionId) -> bool {
        self.shared.faults.unsubscribe(id)
    }

    /// Number of data subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.data.len()
    }
}

impl Drop for SerialPortHandler {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for SerialPortHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortHandler")
            .field("port_name", &self.port_name)
            .field("line", &self.line)
            .field("options", &self.options)
            .field("open", &self.is_open())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
