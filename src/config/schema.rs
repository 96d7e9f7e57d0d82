//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use super::error::{ConfigError, ConfigResult};
use crate::encoding::TextEncoding;
use crate::handler::{
    ReaderOptions, DEFAULT_FAILURE_THRESHOLD, DEFAULT_JOIN_TIMEOUT, DEFAULT_POLL_INTERVAL,
};
use crate::port::{DataBits, Handshake, LineConfig, Parity, StopBits};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port and line parameters
    pub serial: SerialConfig,
    /// Background reader behaviour
    pub reader: ReaderConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Check every section, reporting the first bad value.
    pub fn validate(&self) -> ConfigResult<()> {
        self.serial.line_config()?;
        if self.reader.poll_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "reader",
                "poll_interval_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port name or alias; required to build a handler
    pub port: Option<String>,
    /// Bits per second
    pub baud_rate: u32,
    /// none, odd, even, mark, space
    pub parity: Parity,
    /// 5 to 8
    pub data_bits: u8,
    /// one, one_point_five, two
    pub stop_bits: StopBits,
    /// none, xon_xoff, request_to_send, request_to_send_xon_xoff
    pub handshake: Handshake,
    /// Assert DTR on open
    pub data_terminal_ready: bool,
    /// Assert RTS on open
    pub request_to_send: bool,
    /// Timeout for a single OS read or write, in milliseconds
    pub timeout_ms: u64,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        let line = LineConfig::default();
        Self {
            port: None,
            baud_rate: line.baud_rate,
            parity: line.parity,
            data_bits: 8,
            stop_bits: line.stop_bits,
            handshake: line.handshake,
            data_terminal_ready: line.data_terminal_ready,
            request_to_send: line.request_to_send,
            timeout_ms: millis(line.timeout),
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    /// The configured port with aliases applied.
    pub fn resolved_port(&self) -> Option<String> {
        self.port.as_deref().map(|name| self.resolve_port(name))
    }

    /// Like [`resolved_port`](Self::resolved_port), but a missing or blank
    /// port is an error.
    pub fn require_port(&self) -> ConfigResult<String> {
        self.resolved_port()
            .filter(|name| !name.trim().is_empty())
            .ok_or(ConfigError::NoPort)
    }

    /// Validated line parameters.
    pub fn line_config(&self) -> ConfigResult<LineConfig> {
        if self.baud_rate == 0 {
            return Err(ConfigError::invalid(
                "serial",
                "baud_rate",
                "must be greater than zero",
            ));
        }
        let data_bits = DataBits::try_from(self.data_bits)
            .map_err(|e| ConfigError::invalid("serial", "data_bits", e.to_string()))?;

        Ok(LineConfig {
            baud_rate: self.baud_rate,
            parity: self.parity,
            data_bits,
            stop_bits: self.stop_bits,
            handshake: self.handshake,
            data_terminal_ready: self.data_terminal_ready,
            request_to_send: self.request_to_send,
            timeout: Duration::from_millis(self.timeout_ms),
        })
    }
}

/// Reader configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Delay between polls in milliseconds
    pub poll_interval_ms: u64,
    /// How long close waits for the reader; 0 waits indefinitely
    pub join_timeout_ms: u64,
    /// Consecutive failures before the device is reported lost; 0 disables
    pub failure_threshold: u32,
    /// utf8, latin1, ascii
    pub encoding: TextEncoding,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: millis(DEFAULT_POLL_INTERVAL),
            join_timeout_ms: millis(DEFAULT_JOIN_TIMEOUT),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            encoding: TextEncoding::default(),
        }
    }
}

impl ReaderConfig {
    pub fn options(&self) -> ReaderOptions {
        ReaderOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            join_timeout: (self.join_timeout_ms > 0)
                .then(|| Duration::from_millis(self.join_timeout_ms)),
            encoding: self.encoding,
            failure_threshold: (self.failure_threshold > 0).then_some(self.failure_threshold),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive: "trace", "debug", "info", "warn", "error" or a full
    /// `EnvFilter` string; `RUST_LOG` wins when set
    pub level: String,
    /// Log format: "json", "pretty", "compact"
    pub format: LogFormat,
    /// Colour output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            ansi: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}
