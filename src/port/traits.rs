//! Core traits for serial port abstraction.
//!
//! Defines the `SerialPortAdapter` trait that allows both real serial ports
//! and mock implementations to be used interchangeably, and the `PortOpener`
//! seam the handler uses to acquire one.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Line parameters for a serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineConfig {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Parity checking mode.
    pub parity: Parity,

    /// Number of data bits (5, 6, 7, or 8).
    pub data_bits: DataBits,

    /// Number of stop bits.
    pub stop_bits: StopBits,

    /// Handshake (flow control) mode.
    pub handshake: Handshake,

    /// Assert DTR when the port opens.
    pub data_terminal_ready: bool,

    /// Assert RTS when the port opens.
    pub request_to_send: bool,

    /// Timeout for a single OS read or write call.
    pub timeout: Duration,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            parity: Parity::None,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            handshake: Handshake::None,
            data_terminal_ready: true,
            request_to_send: true,
            timeout: Duration::from_millis(50),
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl TryFrom<u8> for DataBits {
    type Error = PortError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(Self::Five),
            6 => Ok(Self::Six),
            7 => Ok(Self::Seven),
            8 => Ok(Self::Eight),
            other => Err(PortError::config(format!(
                "data bits must be between 5 and 8, got {other}"
            ))),
        }
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

/// Handshake modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Handshake {
    None,
    XonXoff,
    RequestToSend,
    RequestToSendXonXoff,
}

impl TryFrom<Handshake> for serialport::FlowControl {
    type Error = PortError;

    fn try_from(handshake: Handshake) -> Result<Self, Self::Error> {
        match handshake {
            Handshake::None => Ok(serialport::FlowControl::None),
            Handshake::XonXoff => Ok(serialport::FlowControl::Software),
            Handshake::RequestToSend => Ok(serialport::FlowControl::Hardware),
            Handshake::RequestToSendXonXoff => Err(PortError::unsupported(
                "combined RTS/CTS and XON/XOFF handshake",
            )),
        }
    }
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    None,
    Odd,
    Even,
    Mark,
    Space,
}

impl TryFrom<Parity> for serialport::Parity {
    type Error = PortError;

    fn try_from(parity: Parity) -> Result<Self, Self::Error> {
        match parity {
            Parity::None => Ok(serialport::Parity::None),
            Parity::Odd => Ok(serialport::Parity::Odd),
            Parity::Even => Ok(serialport::Parity::Even),
            Parity::Mark => Err(PortError::unsupported("mark parity")),
            Parity::Space => Err(PortError::unsupported("space parity")),
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StopBits {
    One,
    OnePointFive,
    Two,
}

impl TryFrom<StopBits> for serialport::StopBits {
    type Error = PortError;

    fn try_from(bits: StopBits) -> Result<Self, Self::Error> {
        match bits {
            StopBits::One => Ok(serialport::StopBits::One),
            StopBits::Two => Ok(serialport::StopBits::Two),
            StopBits::OnePointFive => Err(PortError::unsupported("1.5 stop bits")),
        }
    }
}

/// Trait for serial port I/O operations.
///
/// This trait abstracts over the OS serial primitive, allowing both real
/// hardware ports and mock implementations for testing. Dropping the adapter
/// releases the underlying OS handle.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Number of received bytes waiting in the OS input buffer.
    fn bytes_to_read(&self) -> Result<usize, PortError>;

    /// Drive the DTR control line.
    fn write_data_terminal_ready(&mut self, level: bool) -> Result<(), PortError>;

    /// Drive the RTS control line.
    fn write_request_to_send(&mut self, level: bool) -> Result<(), PortError>;

    /// Drain everything currently buffered in one chunk.
    ///
    /// Returns an empty vector when nothing is waiting. Bytes that arrive
    /// while draining are left for the next call.
    fn read_available(&mut self) -> Result<Vec<u8>, PortError> {
        let available = self.bytes_to_read()?;
        if available == 0 {
            return Ok(Vec::new());
        }

        let mut buffer = vec![0u8; available];
        let mut filled = 0;
        while filled < available {
            match self.read_bytes(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(PortError::Io(e))
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                    ) =>
                {
                    break
                }
                Err(e) => return Err(e),
            }
        }
        buffer.truncate(filled);
        Ok(buffer)
    }
}

/// Opens a named serial device with the given line parameters.
pub trait PortOpener: Send + Sync + std::fmt::Debug {
    /// Open `port_name`, returning an exclusively owned adapter.
    fn open(
        &self,
        port_name: &str,
        line: &LineConfig,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}
