//! Shared configuration for the courier message dispatcher.
//!
//! Configuration is resolved from four layers, highest precedence first:
//! command-line flags, `COURIER_*` environment variables, an optional JSON
//! file named by `--config-path`, and the built-in defaults in [`defaults`].
//! The resolved [`Config`] is validated once at load time so the dispatcher
//! can treat every value as trusted.
//!
//! A configuration file may set any subset of the fields:
//!
//! ```json
//! { "socket_dir": "/run/courier", "log_format": "compact" }
//! ```

pub mod defaults;
mod logging;
mod socket;

use std::ffi::OsString;
use std::fs;
use std::io;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_POLL_TIMEOUT_MS, DEFAULT_SOCKET_DIR, DEFAULT_SOCKET_PREFIX,
    default_log_filter_string, default_log_format, default_poll_timeout_ms, default_socket_dir,
    default_socket_prefix,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketLayout, SocketPreparationError};

/// Resolved dispatcher configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding the component endpoints.
    #[serde(default = "default_socket_dir")]
    pub socket_dir: Utf8PathBuf,
    /// Filename prefix applied to every component endpoint.
    #[serde(default = "default_socket_prefix")]
    pub socket_prefix: String,
    /// Upper bound on a single multiplexer wait, in milliseconds.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Output format for structured logs.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_dir: default_socket_dir(),
            socket_prefix: default_socket_prefix(),
            poll_timeout_ms: default_poll_timeout_ms(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list. The first item is
    /// the program name, as with [`std::env::args_os`].
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let parsed = ConfigArgs::try_parse_from(args).map_err(ConfigError::from_clap)?;
        let base = match parsed.config_path.as_deref() {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = parsed.apply_to(base);
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file. Absent fields take their defaults;
    /// unknown fields are rejected. The result is not validated.
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::File {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks invariants the dispatcher relies upon.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_timeout_ms == 0 || self.poll_timeout_ms > u64::from(u16::MAX) {
            return Err(ConfigError::PollTimeout {
                value: self.poll_timeout_ms,
            });
        }
        if self.socket_prefix.is_empty() || self.socket_prefix.contains('/') {
            return Err(ConfigError::SocketPrefix {
                value: self.socket_prefix.clone(),
            });
        }
        Ok(())
    }

    /// Endpoint naming derived from the socket directory and prefix.
    #[must_use]
    pub fn socket_layout(&self) -> SocketLayout {
        SocketLayout::new(self.socket_dir.clone(), self.socket_prefix.clone())
    }

    /// Multiplexer wait as a [`Duration`].
    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Returns the configured log filter.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the configured log format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

/// Command-line surface; every flag falls back to a `COURIER_*` variable,
/// and an absent value leaves the file or default layer in place.
#[derive(Debug, Parser)]
#[command(
    name = "courierd",
    about = "Routes fixed-size message units between flight-software components",
    version
)]
struct ConfigArgs {
    /// JSON file supplying values beneath the environment and flags.
    #[arg(long, env = "COURIER_CONFIG_PATH")]
    config_path: Option<Utf8PathBuf>,
    /// Directory holding the component endpoints [default: /tmp].
    #[arg(long, env = "COURIER_SOCKET_DIR")]
    socket_dir: Option<Utf8PathBuf>,
    /// Filename prefix applied to every component endpoint [default: fifo_socket_].
    #[arg(long, env = "COURIER_SOCKET_PREFIX")]
    socket_prefix: Option<String>,
    /// Upper bound on a single multiplexer wait, in milliseconds [default: 1000].
    #[arg(long, env = "COURIER_POLL_TIMEOUT_MS")]
    poll_timeout_ms: Option<u64>,
    /// `tracing` filter expression, e.g. `courierd::dispatch=debug` [default: info].
    #[arg(long, env = "COURIER_LOG_FILTER")]
    log_filter: Option<String>,
    /// Log output format: `json` or `compact` [default: json].
    #[arg(long, env = "COURIER_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

impl ConfigArgs {
    fn apply_to(self, base: Config) -> Config {
        Config {
            socket_dir: self.socket_dir.unwrap_or(base.socket_dir),
            socket_prefix: self.socket_prefix.unwrap_or(base.socket_prefix),
            poll_timeout_ms: self.poll_timeout_ms.unwrap_or(base.poll_timeout_ms),
            log_filter: self.log_filter.unwrap_or(base.log_filter),
            log_format: self.log_format.unwrap_or(base.log_format),
        }
    }
}

/// Errors surfaced while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command-line or environment input could not be parsed.
    #[error("invalid command line: {message}")]
    Arguments {
        /// Rendered clap diagnostic.
        message: String,
        /// Whether clap only produced help or version output.
        informational: bool,
    },
    /// The poll timeout was zero or too large for the multiplexer.
    #[error("poll timeout must be between 1 and {max} ms, got {value}", max = u16::MAX)]
    PollTimeout { value: u64 },
    /// The socket prefix was empty or contained a path separator.
    #[error("invalid socket prefix '{value}'")]
    SocketPrefix { value: String },
    /// The configuration file could not be read.
    #[error("failed to read configuration file '{path}': {source}")]
    File {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid JSON for [`Config`].
    #[error("invalid configuration file '{path}': {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    fn from_clap(error: clap::Error) -> Self {
        let informational = matches!(
            error.kind(),
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
        );
        Self::Arguments {
            message: error.render().to_string(),
            informational,
        }
    }

    /// Returns `true` when the "error" is a help or version request.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            Self::Arguments {
                informational: true,
                ..
            }
        )
    }
}
