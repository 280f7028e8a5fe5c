//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. explicit level passed by the caller
//! 2. `U_MRTA_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`

use tracing::Level;
use tracing_subscriber::fmt;

use crate::errors::{AllocationError, Result};

/// Environment variable consulted when no level is given.
pub const LOG_ENV_VAR: &str = "U_MRTA_LOG";

/// Installs a global fmt subscriber writing to stderr.
///
/// Fails with [`AllocationError::Logging`] if a global subscriber is
/// already installed.
pub fn init_logging(level: Option<Level>) -> Result<()> {
    let level = level.unwrap_or_else(|| {
        std::env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(Level::INFO)
    });

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AllocationError::Logging(e.to_string()))
}

/// Parses a level name; unknown names give `None`.
pub fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
