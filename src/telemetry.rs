//! Tracing subscriber setup.

use crate::config::LogSettings;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "TASKMATE_LOG";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter '{directive}': {source}")]
    Filter {
        /// The rejected directive.
        directive: String,
        /// Parser error.
        source: tracing_subscriber::filter::ParseError,
    },

    /// A global subscriber was already installed.
    #[error("tracing subscriber already installed: {0}")]
    Install(String),
}

/// Builds the filter: `TASKMATE_LOG` when set, else the configured directive.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the configured directive is
/// invalid.
pub fn build_filter(settings: &LogSettings) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }
    EnvFilter::try_new(&settings.filter).map_err(|source| TelemetryError::Filter {
        directive: settings.filter.clone(),
        source,
    })
}

/// Installs the global `fmt` subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn init_tracing(settings: &LogSettings) -> Result<(), TelemetryError> {
    let filter = build_filter(settings)?;
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|err| TelemetryError::Install(err.to_string()))
}
