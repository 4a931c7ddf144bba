//! Environment-backed server configuration.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_LOG_FILE: &str = "server.log";

#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address (`ARENA_BIND`)
    pub bind_addr: String,

    /// Flat append-only log file served by `GET /logs` (`ARENA_LOG_FILE`)
    pub log_file: PathBuf,

    /// Deadline for a pending human-input request
    /// (`ARENA_INPUT_TIMEOUT_SECS`); unset means wait indefinitely.
    pub input_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("ARENA_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let log_file = std::env::var("ARENA_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_FILE));
        let input_timeout = std::env::var("ARENA_INPUT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);

        Self {
            bind_addr,
            log_file,
            input_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            input_timeout: None,
        }
    }
}
