use super::{ReaderOptions, SerialPortHandler};
use crate::encoding::TextEncoding;
use crate::error::{HandlerError, HandlerResult};
use crate::port::{
    DataBits, Handshake, LineConfig, Parity, PortOpener, StopBits, SystemPortOpener,
};
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`SerialPortHandler`], in the style of `serialport::new`.
///
/// Unset line parameters default to 9600 baud, 8 data bits, no parity, one
/// stop bit, no handshake, with DTR and RTS asserted on open.
///
/// ```
/// use serial_handler::{Parity, SerialPortHandler};
///
/// let handler = SerialPortHandler::builder("/dev/ttyUSB0")
///     .baud_rate(115_200)
///     .parity(Parity::Even)
///     .build()?;
/// assert!(!handler.is_open());
/// # Ok::<(), serial_handler::HandlerError>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct HandlerBuilder {
    port_name: String,
    line: LineConfig,
    options: ReaderOptions,
    opener: Option<Arc<dyn PortOpener>>,
}

impl HandlerBuilder {
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            line: LineConfig::default(),
            options: ReaderOptions::default(),
            opener: None,
        }
    }

    pub fn line_config(mut self, line: LineConfig) -> Self {
        self.line = line;
        self
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.line.baud_rate = baud_rate;
        self
    }

    pub fn parity(mut self, parity: Parity) -> Self {
        self.line.parity = parity;
        self
    }

    pub fn data_bits(mut self, data_bits: DataBits) -> Self {
        self.line.data_bits = data_bits;
        self
    }

    pub fn stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.line.stop_bits = stop_bits;
        self
    }

    pub fn handshake(mut self, handshake: Handshake) -> Self {
        self.line.handshake = handshake;
        self
    }

    pub fn data_terminal_ready(mut self, level: bool) -> Self {
        self.line.data_terminal_ready = level;
        self
    }

    pub fn request_to_send(mut self, level: bool) -> Self {
        self.line.request_to_send = level;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.line.timeout = timeout;
        self
    }

    pub fn options(mut self, options: ReaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.options.encoding = encoding;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    /// `None` waits for the reader indefinitely on close.
    pub fn join_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.options.join_timeout = timeout;
        self
    }

    /// `None` disables the device-lost escalation.
    pub fn failure_threshold(mut self, threshold: Option<u32>) -> Self {
        self.options.failure_threshold = threshold;
        self
    }

    /// Replace the OS backend, e.g. with a [`MockSerialPort`](crate::port::MockSerialPort).
    pub fn opener(mut self, opener: Arc<dyn PortOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    /// Validate the configuration. No I/O happens here.
    pub fn build(self) -> HandlerResult<SerialPortHandler> {
        if self.port_name.trim().is_empty() {
            return Err(HandlerError::invalid("port name must not be empty"));
        }
        if self.line.baud_rate == 0 {
            return Err(HandlerError::invalid("baud rate must be greater than zero"));
        }
        self.options.validate()?;

        let opener = self
            .opener
            .unwrap_or_else(|| Arc::new(SystemPortOpener) as Arc<dyn PortOpener>);
        Ok(SerialPortHandler::assemble(
            self.port_name,
            self.line,
            self.options,
            opener,
        ))
    }
}
