//! Port-specific error types.
//!
//! Defines error types for serial port operations, separate from handler-level
//! errors so the OS layer can be swapped for a mock without touching callers.

use thiserror::Error;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// The port exists but is held by another process.
    #[error("Serial port is busy: {0}")]
    Busy(String),

    /// The backend cannot express the requested line parameter.
    #[error("Unsupported line setting: {0}")]
    Unsupported(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Port configuration failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Busy error from a port name.
    pub fn busy(port_name: impl Into<String>) -> Self {
        Self::Busy(port_name.into())
    }

    /// Create an Unsupported error describing the rejected setting.
    pub fn unsupported(setting: impl Into<String>) -> Self {
        Self::Unsupported(setting.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Map an error from the `serialport` open call onto our variants.
    pub(crate) fn from_open(port_name: &str, err: serialport::Error) -> Self {
        match err.kind() {
            serialport::ErrorKind::NoDevice => Self::not_found(port_name),
            serialport::ErrorKind::InvalidInput => Self::config(err.to_string()),
            serialport::ErrorKind::Io(std::io::ErrorKind::NotFound) => Self::not_found(port_name),
            serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied)
            | serialport::ErrorKind::Io(std::io::ErrorKind::AddrInUse) => Self::busy(port_name),
            _ => Self::Serial(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortError::not_found("/dev/ttyUSB0");
        assert_eq!(err.to_string(), "Serial port not found: /dev/ttyUSB0");

        let err = PortError::config("Invalid baud rate");
        assert_eq!(err.to_string(), "Configuration error: Invalid baud rate");

        let err = PortError::busy("COM3");
        assert_eq!(err.to_string(), "Serial port is busy: COM3");
    }

    #[test]
    fn test_open_error_mapping() {
        let err = PortError::from_open(
            "/dev/ttyACM9",
            serialport::Error::new(serialport::ErrorKind::NoDevice, "gone"),
        );
        assert!(matches!(err, PortError::NotFound(ref name) if name == "/dev/ttyACM9"));

        let err = PortError::from_open(
            "/dev/ttyACM9",
            serialport::Error::new(serialport::ErrorKind::InvalidInput, "bad baud"),
        );
        assert!(matches!(err, PortError::Config(_)));

        let err = PortError::from_open(
            "/dev/ttyACM9",
            serialport::Error::new(
                serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied),
                "denied",
            ),
        );
        assert!(matches!(err, PortError::Busy(_)));
    }
}
