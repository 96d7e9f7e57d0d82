//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_HANDLER";

/// Config file name
const CONFIG_FILE_NAME: &str = "serial-handler.toml";

/// Directory under the platform config dir
const CONFIG_DIR_NAME: &str = "serial-handler";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_HANDLER_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `SERIAL_HANDLER_CONFIG` environment variable (explicit path, must exist)
    /// 2. `./serial-handler.toml` (current directory)
    /// 3. `~/.config/serial-handler/serial-handler.toml` (XDG on Linux/macOS)
    /// 4. `%APPDATA%\serial-handler\serial-handler.toml` (Windows)
    /// 5. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(explicit);
            if !path.exists() {
                return Err(ConfigError::MissingExplicitFile(path));
            }
            return Self::load_from(path);
        }

        let config_path = resolve_config_path();
        let mut config = match config_path {
            Some(ref path) => load_from_file(path)?,
            None => Config::default(),
        };
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        if apply_env_overrides(&mut config).is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path from the implicit locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|path| path.exists())
}

/// Get the platform-specific config directory.
fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }
}

/// Get the default config file path.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

fn env_var(key: &str) -> Option<(String, String)> {
    let name = format!("{}_{}", ENV_PREFIX, key);
    std::env::var(&name).ok().map(|value| (name, value))
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str, what: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::bad_override(name, value, format!("not a valid {what}")))
}

/// Parse an enum from its config-file spelling, e.g. `latin1` or `xon_xoff`.
fn parse_enum<T: DeserializeOwned>(name: &str, value: &str) -> ConfigResult<T> {
    toml::Value::String(value.trim().to_lowercase())
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::bad_override(name, value, e.message()))
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `SERIAL_HANDLER_<SECTION>_<KEY>`
/// For example:
/// - `SERIAL_HANDLER_SERIAL_PORT=/dev/ttyUSB0`
/// - `SERIAL_HANDLER_SERIAL_BAUD_RATE=115200`
/// - `SERIAL_HANDLER_READER_ENCODING=latin1`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Serial overrides
    if let Some((_, val)) = env_var("SERIAL_PORT") {
        config.serial.port = Some(val);
    }
    if let Some((name, val)) = env_var("SERIAL_BAUD_RATE") {
        config.serial.baud_rate = parse_number(&name, &val, "baud rate")?;
    }
    if let Some((name, val)) = env_var("SERIAL_PARITY") {
        config.serial.parity = parse_enum(&name, &val)?;
    }
    if let Some((name, val)) = env_var("SERIAL_DATA_BITS") {
        config.serial.data_bits = parse_number(&name, &val, "data bits")?;
    }
    if let Some((name, val)) = env_var("SERIAL_STOP_BITS") {
        config.serial.stop_bits = parse_enum(&name, &val)?;
    }
    if let Some((name, val)) = env_var("SERIAL_HANDSHAKE") {
        config.serial.handshake = parse_enum(&name, &val)?;
    }
    if let Some((_, val)) = env_var("SERIAL_DATA_TERMINAL_READY") {
        config.serial.data_terminal_ready = parse_bool(&val);
    }
    if let Some((_, val)) = env_var("SERIAL_REQUEST_TO_SEND") {
        config.serial.request_to_send = parse_bool(&val);
    }

    // Reader overrides
    if let Some((name, val)) = env_var("READER_POLL_INTERVAL_MS") {
        config.reader.poll_interval_ms = parse_number(&name, &val, "interval")?;
    }
    if let Some((name, val)) = env_var("READER_JOIN_TIMEOUT_MS") {
        config.reader.join_timeout_ms = parse_number(&name, &val, "timeout")?;
    }
    if let Some((name, val)) = env_var("READER_FAILURE_THRESHOLD") {
        config.reader.failure_threshold = parse_number(&name, &val, "threshold")?;
    }
    if let Some((name, val)) = env_var("READER_ENCODING") {
        config.reader.encoding = parse_enum(&name, &val)?;
    }

    // Logging overrides
    if let Some((_, val)) = env_var("LOGGING_LEVEL") {
        config.logging.level = val;
    }
    if let Some((name, val)) = env_var("LOGGING_FORMAT") {
        config.logging.format = parse_enum(&name, &val)?;
    }

    Ok(())
}
