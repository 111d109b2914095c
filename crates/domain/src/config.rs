//! Client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BATCH_PATH, DEFAULT_API_ROOT, DEFAULT_API_VERSION, DEFAULT_RESOURCE,
    DEFAULT_RETRY_AFTER_SECS, DEFAULT_TIMEOUT_SECS, DEFAULT_TRANSIENT_RETRY_SECS,
};
use crate::impl_wire_token_conversions;

/// How batch sub-responses are matched back to their requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchCorrelation {
    /// Order sub-responses by the id of the request they answer.
    #[default]
    ById,
    /// Keep sub-responses in the order the API returned them.
    Positional,
}

impl_wire_token_conversions!(BatchCorrelation {
    ById => "by_id",
    Positional => "positional",
});

/// Settings for a `GraphService` and the transport underneath it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Scheme and host of the API, without a trailing slash.
    pub api_root: String,
    pub api_version: String,
    /// Resource the access token is requested for.
    pub resource: String,
    /// Client id of a user-assigned identity; `None` uses the
    /// system-assigned identity.
    pub identity_id: Option<String>,
    /// Fixed token attached instead of asking the credential provider.
    /// Meant for local debugging only.
    pub debug_token: Option<String>,
    pub timeout_secs: u64,
    /// Delay used when a throttled response carries no usable Retry-After.
    pub default_retry_after_secs: u64,
    /// Delay before retrying a 502/504.
    pub transient_retry_secs: u64,
    pub correlation: BatchCorrelation,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            resource: DEFAULT_RESOURCE.to_string(),
            identity_id: None,
            debug_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
            transient_retry_secs: DEFAULT_TRANSIENT_RETRY_SECS,
            correlation: BatchCorrelation::default(),
        }
    }
}

impl GraphConfig {
    /// `{api_root}/{api_version}`, the prefix for relative resource paths.
    pub fn versioned_root(&self) -> String {
        format!(
            "{}/{}",
            self.api_root.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }

    /// Absolute URL of the batch endpoint.
    pub fn batch_url(&self) -> String {
        format!("{}/{}", self.versioned_root(), BATCH_PATH)
    }

    /// Resolves a request target. Absolute URLs pass through untouched,
    /// anything else is appended to [`Self::versioned_root`].
    pub fn resolve_url(&self, target: &str) -> String {
        if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            format!("{}/{}", self.versioned_root(), target.trim_start_matches('/'))
        }
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Throttle delay used without a usable Retry-After.
    pub fn default_retry_after(&self) -> Duration {
        Duration::from_secs(self.default_retry_after_secs)
    }

    /// Delay before retrying a 502/504.
    pub fn transient_retry_delay(&self) -> Duration {
        Duration::from_secs(self.transient_retry_secs)
    }
}
