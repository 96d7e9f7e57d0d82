use crate::port::PortError;
use std::fmt;

/// Faults reported by the background reader.
///
/// These never stop the reader; they are delivered to fault subscribers on
/// the reader thread, separately from received data.
#[derive(Debug)]
pub enum ReaderEvent {
    /// A poll failed; the reader retries after the next poll interval.
    TransientReadFailure {
        port: String,
        error: PortError,
        /// Failures in a row, including this one.
        consecutive: u32,
    },
    /// The failure streak reached the configured threshold. Emitted once
    /// per streak; the reader keeps polling.
    DeviceLost { port: String, consecutive: u32 },
}

impl ReaderEvent {
    pub fn port(&self) -> &str {
        match self {
            Self::TransientReadFailure { port, .. } | Self::DeviceLost { port, .. } => port,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        match self {
            Self::TransientReadFailure { consecutive, .. } | Self::DeviceLost { consecutive, .. } => {
                *consecutive
            }
        }
    }

    pub fn is_device_lost(&self) -> bool {
        matches!(self, Self::DeviceLost { .. })
    }
}

impl fmt::Display for ReaderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransientReadFailure {
                port,
                error,
                consecutive,
            } => write!(f, "read from {port} failed ({consecutive} in a row): {error}"),
            Self::DeviceLost { port, consecutive } => {
                write!(f, "{port} considered lost after {consecutive} failed reads")
            }
        }
    }
}
