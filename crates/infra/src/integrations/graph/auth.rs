//! Bearer credentials for Graph calls
//!
//! Tokens are fetched fresh for every request; nothing here caches.
//!
//! # Usage
//!
//! ```no_run
//! use graphlink_infra::integrations::graph::auth::{
//!     CredentialProvider, ManagedIdentityCredential,
//! };
//!
//! # async fn example() -> graphlink_domain::Result<()> {
//! let credential = ManagedIdentityCredential::from_env()?;
//!
//! // System-assigned identity
//! let token = credential.access_token("https://graph.microsoft.com/", None).await?;
//!
//! // User-assigned identity, selected by client id
//! let token = credential
//!     .access_token("https://graph.microsoft.com/", Some("00000000-0000-0000-0000-000000000000"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use graphlink_domain::{GraphConfig, GraphLinkError, Result};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

const IMDS_TOKEN_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";
const IDENTITY_ENDPOINT_ENV: &str = "IDENTITY_ENDPOINT";
const IDENTITY_HEADER_ENV: &str = "IDENTITY_HEADER";
const IDENTITY_TIMEOUT_SECS: u64 = 10;

/// Supplies bearer tokens for a target resource.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Acquire an access token for `resource`, optionally as the
    /// user-assigned identity `identity_id`.
    async fn access_token(&self, resource: &str, identity_id: Option<&str>) -> Result<String>;
}

/// Provider that always hands out the same token.
#[derive(Clone)]
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    /// Provider handing out `token` for every resource and identity.
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

impl fmt::Debug for StaticTokenCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenCredential").field("token", &"<redacted>").finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenCredential {
    async fn access_token(&self, _resource: &str, _identity_id: Option<&str>) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Where a managed identity token is requested from.
#[derive(Clone)]
pub enum ManagedIdentityEndpoint {
    /// Azure instance metadata service (VMs, AKS, container instances).
    Imds { endpoint: String },
    /// App Service / Functions local identity endpoint.
    AppService { endpoint: String, secret: String },
}

impl fmt::Debug for ManagedIdentityEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imds { endpoint } => f.debug_struct("Imds").field("endpoint", endpoint).finish(),
            Self::AppService { endpoint, .. } => f
                .debug_struct("AppService")
                .field("endpoint", endpoint)
                .field("secret", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Managed identity credential speaking the Azure token protocol.
#[derive(Debug, Clone)]
pub struct ManagedIdentityCredential {
    client: reqwest::Client,
    endpoint: ManagedIdentityEndpoint,
}

impl ManagedIdentityCredential {
    /// Picks the App Service endpoint when `IDENTITY_ENDPOINT` and
    /// `IDENTITY_HEADER` are set, otherwise the instance metadata service.
    pub fn from_env() -> Result<Self> {
        let endpoint = match (
            std::env::var(IDENTITY_ENDPOINT_ENV).ok(),
            std::env::var(IDENTITY_HEADER_ENV).ok(),
        ) {
            (Some(endpoint), Some(secret)) => ManagedIdentityEndpoint::AppService { endpoint, secret },
            _ => ManagedIdentityEndpoint::Imds { endpoint: IMDS_TOKEN_ENDPOINT.to_string() },
        };

        Self::with_endpoint(endpoint)
    }

    /// Credential against an explicit token endpoint.
    ///
    /// # Errors
    /// Returns `GraphLinkError::Config` if the HTTP client cannot be built.
    pub fn with_endpoint(endpoint: ManagedIdentityEndpoint) -> Result<Self> {
        // The metadata endpoints are link-local and must never go via a proxy.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(IDENTITY_TIMEOUT_SECS))
            .no_proxy()
            .build()
            .map_err(|e| GraphLinkError::Config(format!("failed to build identity client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    /// Endpoint tokens are requested from.
    pub fn endpoint(&self) -> &ManagedIdentityEndpoint {
        &self.endpoint
    }

    fn token_url(&self, resource: &str, identity_id: Option<&str>) -> Result<Url> {
        let (endpoint, api_version) = match &self.endpoint {
            ManagedIdentityEndpoint::Imds { endpoint } => (endpoint, IMDS_API_VERSION),
            ManagedIdentityEndpoint::AppService { endpoint, .. } => (endpoint, APP_SERVICE_API_VERSION),
        };

        let mut url = Url::parse(endpoint).map_err(|e| {
            GraphLinkError::Config(format!("invalid identity endpoint '{endpoint}': {e}"))
        })?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api-version", api_version);
            query.append_pair("resource", resource);
            if let Some(id) = identity_id {
                query.append_pair("client_id", id);
            }
        }

        Ok(url)
    }
}

#[async_trait]
impl CredentialProvider for ManagedIdentityCredential {
    #[instrument(skip(self))]
    async fn access_token(&self, resource: &str, identity_id: Option<&str>) -> Result<String> {
        let url = self.token_url(resource, identity_id)?;

        let request = match &self.endpoint {
            ManagedIdentityEndpoint::Imds { .. } => {
                self.client.get(url).header("Metadata", "true")
            }
            ManagedIdentityEndpoint::AppService { secret, .. } => {
                self.client.get(url).header("X-IDENTITY-HEADER", secret)
            }
        };

        debug!("requesting managed identity token");
        let response = request
            .send()
            .await
            .map_err(|e| GraphLinkError::Auth(format!("managed identity request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GraphLinkError::Auth(format!(
                "managed identity token request failed ({status}): {body}"
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            GraphLinkError::Auth(format!("failed to parse managed identity response: {e}"))
        })?;

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GraphLinkError::Auth("managed identity response had no access_token".into()))
    }
}

/// Produces the `Authorization` header for each outbound call.
///
/// A configured debug token short-circuits the credential provider entirely.
#[derive(Clone)]
pub struct BearerAuth {
    credentials: Arc<dyn CredentialProvider>,
    resource: String,
    identity_id: Option<String>,
    debug_token: Option<String>,
}

impl BearerAuth {
    /// Takes resource, identity and debug token from `config`.
    pub fn new(config: &GraphConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            credentials,
            resource: config.resource.clone(),
            identity_id: config.identity_id.clone(),
            debug_token: config.debug_token.clone(),
        }
    }

    /// Token for the next call: the debug token if set, else a fresh one
    /// from the provider.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = &self.debug_token {
            debug!("using debug access token override");
            return Ok(token.clone());
        }

        self.credentials.access_token(&self.resource, self.identity_id.as_deref()).await
    }

    /// Headers attached to one outbound call.
    pub async fn headers(&self) -> Result<Vec<(String, String)>> {
        let token = self.access_token().await?;
        Ok(vec![("Authorization".to_string(), format!("Bearer {token}"))])
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth")
            .field("resource", &self.resource)
            .field("identity_id", &self.identity_id)
            .field("debug_token", &self.debug_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
