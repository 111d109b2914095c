use std::sync::Arc;

use graphlink_domain::{BatchCorrelation, GraphConfig};
use graphlink_infra::integrations::graph::{CredentialProvider, GraphService, StaticTokenCredential};
use graphlink_infra::{HttpClient, RecordingSleeper};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const TEST_TOKEN: &str = "test-token";

/// Mock Graph endpoint plus a service pointed at it.
///
/// Retry delays go to a `RecordingSleeper`, so no test waits in real time.
pub struct TestGraph {
    pub server: MockServer,
    pub service: GraphService,
    pub sleeper: RecordingSleeper,
}

impl TestGraph {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn with_correlation(correlation: BatchCorrelation) -> Self {
        Self::start_with(move |config| config.correlation = correlation).await
    }

    pub async fn start_with(configure: impl FnOnce(&mut GraphConfig)) -> Self {
        Self::start_with_credentials(configure, Arc::new(StaticTokenCredential::new(TEST_TOKEN))).await
    }

    pub async fn start_with_credentials(
        configure: impl FnOnce(&mut GraphConfig),
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let server = MockServer::start().await;
        let mut config = GraphConfig { api_root: server.uri(), ..Default::default() };
        configure(&mut config);

        let sleeper = RecordingSleeper::new();
        let transport = HttpClient::builder()
            .sleeper(Arc::new(sleeper.clone()))
            .default_retry_after(config.default_retry_after())
            .transient_retry_delay(config.transient_retry_delay())
            .no_proxy()
            .build()
            .expect("http client should build");

        let service = GraphService::with_transport(config, credentials, transport);
        Self { server, service, sleeper }
    }

    /// Absolute URL of `path` under the versioned root.
    pub fn url(&self, path: &str) -> String {
        format!("{}/v1.0{}", self.server.uri(), path)
    }

    /// Bodies of every request the mock server received, parsed as JSON.
    pub async fn received_json(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| serde_json::from_slice(&request.body).unwrap_or(Value::Null))
            .collect()
    }
}

/// Batch response answering every sub-request with `200` and an echo body.
pub fn echo_batch_response(request: &Value) -> Value {
    let responses: Vec<Value> = request["requests"]
        .as_array()
        .map(|requests| {
            requests
                .iter()
                .map(|r| json!({"id": r["id"], "status": 200, "body": {"url": r["url"]}}))
                .collect()
        })
        .unwrap_or_default();

    json!({ "responses": responses })
}
