//! Logging setup for the strata binary.
//!
//! Structured logging via the `tracing` crate. Filtering follows the
//! `STRATA_LOG` environment variable (standard `EnvFilter` directives); an
//! explicit level passed by the caller takes precedence.

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter, e.g. `debug` or
/// `strata::transform=trace`.
pub const LOG_ENV: &str = "STRATA_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Initialize the global tracing subscriber. Fails when a subscriber is
/// already installed or the filter directive does not parse.
pub fn init_logging(level: Option<&str>) -> Result<(), String> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).map_err(|e| e.to_string())?,
        None => EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| e.to_string())
}
