use std::sync::Arc;
use std::time::Duration;

use graphlink_domain::constants::{
    DEFAULT_RETRY_AFTER_SECS, DEFAULT_TIMEOUT_SECS, DEFAULT_TRANSIENT_RETRY_SECS,
    JSON_CONTENT_TYPE,
};
use graphlink_domain::{Document, GraphConfig, GraphLinkError, HttpMethod, Result};
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method};
use tracing::{debug, warn};

use super::classify::{classify, Disposition, ReceivedResponse, RetryDelays, RetryReason};
use super::sleeper::{Sleeper, TokioSleeper};
use crate::errors::conversions::http_error;

/// Header name/value pairs supplied with a single call.
pub type RequestHeaders = [(String, String)];

/// HTTP transport with Graph-aware throttling and retry.
///
/// Owns the single long-lived `reqwest::Client` and a default header store
/// shared by every clone. Throttled (429, or a batch envelope hiding 429s)
/// and transient (502/504) responses are retried without limit; every other
/// outcome is returned to the caller.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    default_headers: Arc<Mutex<HeaderMap>>,
    delays: RetryDelays,
    sleeper: Arc<dyn Sleeper>,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Transport configured from the timeout and retry delays of `config`.
    pub fn from_config(config: &GraphConfig) -> Result<Self> {
        Self::builder()
            .timeout(config.timeout())
            .default_retry_after(config.default_retry_after())
            .transient_retry_delay(config.transient_retry_delay())
            .build()
    }

    /// Sends a JSON body (or none) and returns the resulting document.
    pub async fn send_json(
        &self,
        url: &str,
        method: HttpMethod,
        headers: &RequestHeaders,
        body: Option<&Document>,
    ) -> Result<Document> {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| GraphLinkError::InvalidInput(format!("unserializable request body: {e}")))?;

        self.send(url, method, headers, body.as_deref(), None).await
    }

    /// Perform one logical call, retrying throttled and transient responses.
    ///
    /// `content_type` defaults to `application/json` and is only sent along
    /// with a body. GET and DELETE never carry a body.
    ///
    /// # Errors
    /// - `GraphLinkError::Http` for a terminal non-success status, carrying
    ///   the parsed (or raw) response body
    /// - `GraphLinkError::Network` when no response could be obtained
    pub async fn send(
        &self,
        url: &str,
        method: HttpMethod,
        headers: &RequestHeaders,
        body: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<Document> {
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            let merged = self.merge_headers(headers);

            let mut builder = self.client.request(to_reqwest_method(method), url).headers(merged);
            if let Some(body) = body.filter(|_| method.carries_body()) {
                builder = builder
                    .header(CONTENT_TYPE, content_type.unwrap_or(JSON_CONTENT_TYPE))
                    .body(body.to_owned());
            }

            debug!(attempt, %method, url, "sending HTTP request");
            let response = builder.send().await.map_err(|err| {
                debug!(attempt, %method, url, error = %err, "HTTP request failed");
                http_error(err)
            })?;

            let status = response.status().as_u16();
            let response_headers = response.headers().clone();
            let text = response.text().await.map_err(http_error)?;
            debug!(attempt, %method, url, status, "received HTTP response");

            let received = ReceivedResponse { status, headers: response_headers, body: text };
            match classify(&received, &self.delays) {
                Disposition::Complete(document) => return Ok(document),
                Disposition::Fail(err) => return Err(err),
                Disposition::Retry { reason, delay } => {
                    match reason {
                        RetryReason::Throttled => {
                            warn!(attempt, url, ?delay, "request throttled, retrying")
                        }
                        RetryReason::BatchThrottled { throttled } => {
                            warn!(attempt, url, throttled, ?delay, "batch partially throttled, retrying whole batch")
                        }
                        RetryReason::Transient => {
                            warn!(attempt, url, status, ?delay, "transient gateway error, retrying")
                        }
                    }
                    self.sleeper.sleep(delay).await;
                }
            }
        }
    }

    /// Merges per-call headers into the shared store and snapshots it.
    ///
    /// Merge and snapshot happen under one lock so a concurrent sender never
    /// observes a half-updated store. Pairs that are not valid HTTP headers
    /// are skipped.
    fn merge_headers(&self, headers: &RequestHeaders) -> HeaderMap {
        let mut store = self.default_headers.lock();

        for (name, value) in headers {
            let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) else {
                warn!(header = %name, "skipping invalid header name");
                continue;
            };
            let Ok(mut header_value) = HeaderValue::from_str(value) else {
                warn!(header = %name, "skipping header with invalid value");
                continue;
            };
            if header_name == AUTHORIZATION {
                header_value.set_sensitive(true);
            }

            store.remove(&header_name);
            store.insert(header_name, header_value);
        }

        store.clone()
    }

    /// Snapshot of the shared default headers.
    pub fn default_headers(&self) -> HeaderMap {
        self.default_headers.lock().clone()
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    timeout: Duration,
    default_retry_after: Duration,
    transient_retry_delay: Duration,
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
    sleeper: Arc<dyn Sleeper>,
    no_proxy: bool,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_retry_after: Duration::from_secs(DEFAULT_RETRY_AFTER_SECS),
            transient_retry_delay: Duration::from_secs(DEFAULT_TRANSIENT_RETRY_SECS),
            user_agent: None,
            default_headers: None,
            sleeper: Arc::new(TokioSleeper),
            no_proxy: false,
        }
    }
}

impl HttpClientBuilder {
    /// Per-request timeout, covering connect through body read.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Delay used when a throttled response has no usable Retry-After.
    pub fn default_retry_after(mut self, delay: Duration) -> Self {
        self.default_retry_after = delay;
        self
    }

    /// Delay before retrying a 502/504.
    pub fn transient_retry_delay(mut self, delay: Duration) -> Self {
        self.transient_retry_delay = delay;
        self
    }

    /// `User-Agent` sent with every request.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Seed the shared default header store.
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Replace the real-time sleeper, e.g. with a `RecordingSleeper` in tests.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Ignore proxy environment variables.
    pub fn no_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    /// Returns `GraphLinkError::Config` if the underlying client cannot be
    /// constructed.
    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout);

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if self.no_proxy {
            builder = builder.no_proxy();
        }

        let client = builder
            .build()
            .map_err(|err| GraphLinkError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(HttpClient {
            client,
            default_headers: Arc::new(Mutex::new(self.default_headers.unwrap_or_default())),
            delays: RetryDelays {
                default_retry_after: self.default_retry_after,
                transient: self.transient_retry_delay,
            },
            sleeper: self.sleeper,
        })
    }
}
