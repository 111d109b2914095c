//! Graph service facade
//!
//! Ties one transport, one credential source, the paginator and the
//! batcher together behind a single handle.

use std::sync::Arc;

use graphlink_domain::{Document, DocumentExt, GraphConfig, HttpMethod, Result};
use tracing::instrument;

use super::auth::{BearerAuth, CredentialProvider};
use super::batcher::Batcher;
use super::paginator::Paginator;
use crate::http::HttpClient;

/// Filtered lookup of one group with its owners expanded.
pub fn group_lookup_url(group_id: &str) -> String {
    format!("/groups?$filter=id eq '{group_id}'&$expand=owners&$select=id,displayName,owners")
}

/// Entry point for callers.
///
/// Cheap to clone; clones share the transport and its header store.
#[derive(Clone)]
pub struct GraphService {
    config: Arc<GraphConfig>,
    transport: Arc<HttpClient>,
    auth: Arc<BearerAuth>,
    paginator: Paginator,
    batcher: Batcher,
}

impl GraphService {
    /// Builds a transport from `config` and wires everything to it.
    pub fn new(config: GraphConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let transport = HttpClient::from_config(&config)?;
        Ok(Self::with_transport(config, credentials, transport))
    }

    /// Uses a caller-built transport, e.g. one with a custom sleeper.
    pub fn with_transport(
        config: GraphConfig,
        credentials: Arc<dyn CredentialProvider>,
        transport: HttpClient,
    ) -> Self {
        let config = Arc::new(config);
        let transport = Arc::new(transport);
        let auth = Arc::new(BearerAuth::new(&config, credentials));

        Self {
            paginator: Paginator::new(transport.clone(), auth.clone(), config.clone()),
            batcher: Batcher::new(transport.clone(), auth.clone(), config.clone()),
            config,
            transport,
            auth,
        }
    }

    /// Configuration the service was built with.
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Reads a resource, following pagination to the end.
    pub async fn get(&self, url: &str) -> Result<Vec<Document>> {
        self.paginator.fetch_all(url).await
    }

    /// One non-paginated call.
    #[instrument(skip(self, body))]
    pub async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Document>,
    ) -> Result<Document> {
        let headers = self.auth.headers().await?;
        let url = self.config.resolve_url(url);
        self.transport.send_json(&url, method, &headers, body).await
    }

    /// Runs `urls` through the batch endpoint. See [`Batcher::batch`].
    pub async fn batch<S: AsRef<str>>(
        &self,
        urls: &[S],
        method: HttpMethod,
        common_body: Option<&Document>,
    ) -> Result<Vec<Document>> {
        self.batcher.batch(urls, method, common_body).await
    }

    /// Looks up groups (with owners) by id in as few batches as possible.
    ///
    /// The result has one entry per id, in the same order. An entry is the
    /// first match for its id, or `None` when the lookup came back empty or
    /// without a body.
    pub async fn get_groups<S: AsRef<str>>(&self, group_ids: &[S]) -> Result<Vec<Option<Document>>> {
        let urls: Vec<String> = group_ids.iter().map(|id| group_lookup_url(id.as_ref())).collect();
        let responses = self.batcher.batch_per_request(&urls, HttpMethod::Get, None).await?;

        Ok(responses
            .into_iter()
            .map(|response| response.and_then(|r| r.value_items().and_then(<[Document]>::first).cloned()))
            .collect())
    }
}
