//! Logging setup
//!
//! Library code only emits `tracing` events. Applications (and the bundled
//! examples) call [`init_tracing`] once to install a subscriber; `RUST_LOG`
//! takes precedence over the filter passed in.

use tracing_subscriber::EnvFilter;

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Failure to set up logging.
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    #[error("invalid log filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },
}

/// Builds the filter from `RUST_LOG`, falling back to `default_filter`.
pub fn env_filter(default_filter: &str) -> Result<EnvFilter, ObservabilityError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| ObservabilityError::InvalidFilter {
            filter: default_filter.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Installs a global fmt subscriber.
///
/// Returns `Ok(false)` when a global subscriber was already installed, so
/// repeated calls (e.g. from several tests) are harmless.
pub fn init_tracing(default_filter: &str, format: LogFormat) -> Result<bool, ObservabilityError> {
    let filter = env_filter(default_filter)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = match format {
        LogFormat::Text => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };

    Ok(installed)
}
