//! Errors raised while finding, reading and checking `serial-handler.toml`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// `SERIAL_HANDLER_CONFIG` names a file that is not there. The implicit
    /// locations are allowed to be missing; an explicit one is not.
    #[error("SERIAL_HANDLER_CONFIG points at '{}', which does not exist", .0.display())]
    MissingExplicitFile(PathBuf),

    #[error("cannot read '{}': {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' is not a valid serial-handler config: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value parsed but cannot drive a port or reader, e.g. `serial.data_bits = 9`.
    #[error("{section}.{key}: {reason}")]
    InvalidSetting {
        section: &'static str,
        key: &'static str,
        reason: String,
    },

    /// A `SERIAL_HANDLER_*` override that does not parse for its setting.
    #[error("{var}={value:?}: {reason}")]
    BadOverride {
        var: String,
        value: String,
        reason: String,
    },

    /// Nothing names the device to open.
    #[error("no serial port configured; set serial.port or SERIAL_HANDLER_SERIAL_PORT")]
    NoPort,
}

impl ConfigError {
    pub fn invalid(section: &'static str, key: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            section,
            key,
            reason: reason.into(),
        }
    }

    pub fn bad_override(var: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::BadOverride {
            var: var.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
