use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Directory holding the component endpoints when none is configured.
pub const DEFAULT_SOCKET_DIR: &str = "/tmp";

/// Filename prefix shared by every component endpoint.
pub const DEFAULT_SOCKET_PREFIX: &str = "fifo_socket_";

/// Finite wait applied to each multiplexer call, in milliseconds.
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 1000;

/// Default log filter expression used by the dispatcher.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default socket directory as an owned path.
pub fn default_socket_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_SOCKET_DIR)
}

/// Owned socket prefix used where allocation is required (e.g. serde).
pub fn default_socket_prefix() -> String {
    DEFAULT_SOCKET_PREFIX.to_owned()
}

/// Default poll timeout, usable as a serde default.
pub const fn default_poll_timeout_ms() -> u64 {
    DEFAULT_POLL_TIMEOUT_MS
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the dispatcher.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}
