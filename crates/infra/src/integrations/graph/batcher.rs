//! JSON batching
//!
//! Splits a list of request urls into envelopes of at most
//! [`MAX_BATCH_SIZE`], posts each one to `$batch`, and collects the
//! sub-response bodies. Each envelope is fully resolved (including any
//! throttling retries) before the next one is built, so ids restart at "1"
//! per envelope.

use std::sync::Arc;

use graphlink_domain::constants::MAX_BATCH_SIZE;
use graphlink_domain::{
    BatchCorrelation, BatchRequestEnvelope, BatchResponseEnvelope, Document, GraphConfig,
    GraphLinkError, HttpMethod, Result,
};
use tracing::{debug, instrument};

use super::auth::BearerAuth;
use crate::http::HttpClient;

/// Sends request lists through the batch endpoint.
#[derive(Clone)]
pub struct Batcher {
    transport: Arc<HttpClient>,
    auth: Arc<BearerAuth>,
    config: Arc<GraphConfig>,
}

impl Batcher {
    /// Batcher sharing the service's transport, auth and config.
    pub fn new(transport: Arc<HttpClient>, auth: Arc<BearerAuth>, config: Arc<GraphConfig>) -> Self {
        Self { transport, auth, config }
    }

    /// Runs every url as `method` (with `common_body` on each request) and
    /// returns the non-null sub-response bodies, chunk by chunk.
    #[instrument(skip(self, urls, common_body), fields(requests = urls.len()))]
    pub async fn batch<S: AsRef<str>>(
        &self,
        urls: &[S],
        method: HttpMethod,
        common_body: Option<&Document>,
    ) -> Result<Vec<Document>> {
        let mut results = Vec::new();

        for (index, chunk) in urls.chunks(MAX_BATCH_SIZE).enumerate() {
            let mut responses = self.send_chunk(chunk, method, common_body).await?;
            if self.config.correlation == BatchCorrelation::ById {
                responses.sort_by_request_id();
            }

            let bodies = responses.into_bodies();
            debug!(chunk = index + 1, requests = chunk.len(), bodies = bodies.len(), "batch resolved");
            results.extend(bodies);
        }

        Ok(results)
    }

    /// Like [`Self::batch`], but returns exactly one entry per url.
    ///
    /// An entry is `None` when its sub-response is missing or has no body,
    /// so later entries never shift onto the wrong request.
    #[instrument(skip(self, urls, common_body), fields(requests = urls.len()))]
    pub async fn batch_per_request<S: AsRef<str>>(
        &self,
        urls: &[S],
        method: HttpMethod,
        common_body: Option<&Document>,
    ) -> Result<Vec<Option<Document>>> {
        let mut results = Vec::with_capacity(urls.len());

        for chunk in urls.chunks(MAX_BATCH_SIZE) {
            let responses = self.send_chunk(chunk, method, common_body).await?;
            results.extend(responses.into_slots(chunk.len(), self.config.correlation));
        }

        Ok(results)
    }

    /// Posts one envelope of at most [`MAX_BATCH_SIZE`] requests.
    async fn send_chunk<S: AsRef<str>>(
        &self,
        chunk: &[S],
        method: HttpMethod,
        common_body: Option<&Document>,
    ) -> Result<BatchResponseEnvelope> {
        let relative: Vec<String> = chunk.iter().map(|url| self.relative_url(url.as_ref())).collect();
        let envelope = BatchRequestEnvelope::from_urls(&relative, method, common_body)?;
        let body = serde_json::to_string(&envelope).map_err(|e| {
            GraphLinkError::Internal(format!("failed to serialize batch envelope: {e}"))
        })?;

        let headers = self.auth.headers().await?;
        let response = self
            .transport
            .send(&self.config.batch_url(), HttpMethod::Post, &headers, Some(&body), None)
            .await?;

        BatchResponseEnvelope::from_document(&response)
    }

    /// Batch sub-requests address resources relative to the versioned root.
    fn relative_url(&self, url: &str) -> String {
        let root = self.config.versioned_root();
        match url.strip_prefix(root.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') => {
                format!("/{}", rest.trim_start_matches('/'))
            }
            _ => url.to_string(),
        }
    }
}
