//! Configuration loader
//!
//! Builds a [`GraphConfig`] from an optional file plus environment
//! overrides.
//!
//! ## Loading Strategy
//! 1. Probe the standard locations for a config file (JSON or TOML)
//! 2. Fall back to built-in defaults when no file exists
//! 3. Apply environment variable overrides on top
//!
//! ## Environment Variables
//! - `GRAPHLINK_API_ROOT`: API scheme and host
//! - `GRAPHLINK_API_VERSION`: API version segment (e.g. `v1.0`)
//! - `GRAPHLINK_RESOURCE`: Resource the access token is requested for
//! - `GRAPHLINK_IDENTITY_ID`: Client id of a user-assigned identity
//! - `GRAPHLINK_DEBUG_TOKEN`: Fixed bearer token for local debugging
//! - `GRAPHLINK_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `GRAPHLINK_RETRY_AFTER_SECS`: Default throttling delay in seconds
//! - `GRAPHLINK_TRANSIENT_RETRY_SECS`: Delay before retrying 502/504
//! - `GRAPHLINK_BATCH_CORRELATION`: `by_id` or `positional`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./graphlink.json` or `./graphlink.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use graphlink_domain::{BatchCorrelation, GraphConfig, GraphLinkError, Result};

const FILE_NAMES: [&str; 4] = ["graphlink.json", "graphlink.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `GraphLinkError::Config` if a config file exists but cannot be
/// parsed, or an environment override has an invalid value.
pub fn load() -> Result<GraphConfig> {
    let base = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, using defaults");
            GraphConfig::default()
        }
    };

    apply_env_overrides(base)
}

/// Load configuration from defaults plus environment variables only
///
/// # Errors
/// Returns `GraphLinkError::Config` if an override has an invalid value.
pub fn load_from_env() -> Result<GraphConfig> {
    let config = apply_env_overrides(GraphConfig::default())?;
    tracing::info!("Configuration loaded from environment variables");
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `GraphLinkError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<GraphConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(GraphLinkError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            GraphLinkError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| GraphLinkError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Overlay `GRAPHLINK_*` environment variables onto `config`
///
/// # Errors
/// Returns `GraphLinkError::Config` for unparsable numbers or an unknown
/// correlation mode.
pub fn apply_env_overrides(mut config: GraphConfig) -> Result<GraphConfig> {
    if let Some(root) = env_opt("GRAPHLINK_API_ROOT") {
        url::Url::parse(&root)
            .map_err(|e| GraphLinkError::Config(format!("Invalid GRAPHLINK_API_ROOT: {}", e)))?;
        config.api_root = root.trim_end_matches('/').to_string();
    }
    if let Some(version) = env_opt("GRAPHLINK_API_VERSION") {
        config.api_version = version;
    }
    if let Some(resource) = env_opt("GRAPHLINK_RESOURCE") {
        config.resource = resource;
    }
    if let Some(identity) = env_opt("GRAPHLINK_IDENTITY_ID") {
        config.identity_id = Some(identity);
    }
    if let Some(token) = env_opt("GRAPHLINK_DEBUG_TOKEN") {
        config.debug_token = Some(token);
    }
    if let Some(secs) = env_secs("GRAPHLINK_TIMEOUT_SECS")? {
        config.timeout_secs = secs;
    }
    if let Some(secs) = env_secs("GRAPHLINK_RETRY_AFTER_SECS")? {
        config.default_retry_after_secs = secs;
    }
    if let Some(secs) = env_secs("GRAPHLINK_TRANSIENT_RETRY_SECS")? {
        config.transient_retry_secs = secs;
    }
    if let Some(mode) = env_opt("GRAPHLINK_BATCH_CORRELATION") {
        config.correlation = mode.parse::<BatchCorrelation>().map_err(|e| {
            GraphLinkError::Config(format!("Invalid GRAPHLINK_BATCH_CORRELATION: {}", e))
        })?;
    }

    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `GraphLinkError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<GraphConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| GraphLinkError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| GraphLinkError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(GraphLinkError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard paths for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(FILE_NAMES.iter().map(|name| cwd.join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(FILE_NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Non-empty environment variable
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_secs(key: &str) -> Result<Option<u64>> {
    env_opt(key)
        .map(|s| {
            s.parse::<u64>()
                .map_err(|e| GraphLinkError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}
