//! Serial Port Handler Library
//!
//! Opens a host serial port with configurable line parameters, polls it on a
//! dedicated reader thread and hands received text to subscribers until the
//! port is closed.
//!
//! # Modules
//!
//! - `handler`: `SerialPortHandler`, the open/read-loop/close lifecycle
//! - `port`: Port abstraction layer (OS backend and mock device)
//! - `encoding`: Explicit byte-to-text decoding for received chunks
//! - `error`: Handler error type
//! - `config`: Configuration management with TOML support
//! - `logging`: Tracing subscriber setup for binaries
//!
//! # Example
//!
//! ```
//! use serial_handler::port::{MockSerialPort, PollStep};
//! use serial_handler::SerialPortHandler;
//! use std::sync::{mpsc, Arc};
//! use std::time::Duration;
//!
//! let device = MockSerialPort::new("MOCK0");
//! device.script_poll(PollStep::Data(b"hello".to_vec()));
//!
//! let handler = SerialPortHandler::builder("MOCK0")
//!     .poll_interval(Duration::from_millis(5))
//!     .opener(Arc::new(device.clone()))
//!     .build()?;
//!
//! let (tx, rx) = mpsc::channel();
//! handler.subscribe(move |text| {
//!     let _ = tx.send(text.to_string());
//! });
//!
//! handler.open()?;
//! assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "hello");
//! handler.close();
//! assert_eq!(device.open_handles(), 0);
//! # Ok::<(), serial_handler::HandlerError>(())
//! ```

pub mod config;
pub mod encoding;
pub mod error;
pub mod handler;
pub mod logging;
pub mod port;

// Re-export commonly used types for convenience
pub use encoding::{TextDecoder, TextEncoding};
pub use error::{HandlerError, HandlerResult};
pub use handler::{
    CloseOutcome, HandlerBuilder, ReaderEvent, ReaderOptions, SerialPortHandler, SubscriptionId,
};
pub use port::{
    DataBits, Handshake, LineConfig, MockSerialPort, Parity, PortError, PortOpener,
    SerialPortAdapter, StopBits, SyncSerialPort, SystemPortOpener,
};

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
