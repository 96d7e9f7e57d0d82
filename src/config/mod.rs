//! Configuration module for serial_handler.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_HANDLER_CONFIG` environment variable (explicit path)
//! 2. `./serial-handler.toml` (current directory)
//! 3. `~/.config/serial-handler/serial-handler.toml` (XDG on Linux/macOS)
//! 4. `%APPDATA%\serial-handler\serial-handler.toml` (Windows)
//! 5. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is: `SERIAL_HANDLER_<SECTION>_<KEY>`
//!
//! Examples:
//! - `SERIAL_HANDLER_SERIAL_PORT=/dev/ttyACM0`
//! - `SERIAL_HANDLER_SERIAL_BAUD_RATE=115200`
//! - `SERIAL_HANDLER_READER_POLL_INTERVAL_MS=50`
//! - `SERIAL_HANDLER_LOGGING_LEVEL=debug`
//!
//! # Example
//!
//! ```rust,no_run
//! use serial_handler::config::ConfigLoader;
//! use serial_handler::SerialPortHandler;
//!
//! let config = ConfigLoader::load()?.into_config();
//! let handler = SerialPortHandler::from_config(&config)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{get_default_config_path, resolve_config_path, ConfigLoader};
pub use schema::{Config, LogFormat, LoggingConfig, ReaderConfig, SerialConfig};
