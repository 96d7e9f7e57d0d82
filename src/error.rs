use crate::port::PortError;
use thiserror::Error;

/// Errors surfaced by [`SerialPortHandler`](crate::SerialPortHandler).
///
/// Read-loop failures never appear here; they are reported on the fault
/// stream as [`ReaderEvent`](crate::ReaderEvent)s.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Construction parameters were rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The device is missing, busy, or refused the line parameters.
    #[error("Serial port '{port}' is unavailable: {source}")]
    PortUnavailable {
        port: String,
        #[source]
        source: PortError,
    },

    /// The operation needs an open port.
    #[error("Operation requires an open serial port, but the port is closed.")]
    NotOpen,

    /// The handler was disposed and cannot be reused.
    #[error("Serial port handler has been disposed")]
    Disposed,

    /// A passthrough I/O call failed.
    #[error("Serial I/O failed: {0}")]
    Io(#[from] PortError),
}

impl HandlerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}

/// A specialized `Result` type for handler operations.
pub type HandlerResult<T> = Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_port_unavailable_keeps_source() {
        let err = HandlerError::PortUnavailable {
            port: "COM7".into(),
            source: PortError::busy("COM7"),
        };
        assert_eq!(
            err.to_string(),
            "Serial port 'COM7' is unavailable: Serial port is busy: COM7"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_io_conversion() {
        let err: HandlerError =
            PortError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "unplugged")).into();
        assert!(matches!(err, HandlerError::Io(_)));
        assert!(err.to_string().contains("unplugged"));
    }
}
