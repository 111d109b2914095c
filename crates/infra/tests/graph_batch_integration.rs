//! Integration tests for `$batch` chunking and unpacking
//!
//! **Coverage:**
//! - Chunking into envelopes of at most 20 with per-envelope ids
//! - Whole-envelope retry when sub-responses are throttled
//! - Null bodies are dropped
//! - Id-based vs positional correlation
//! - Group lookup with owners

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use graphlink_domain::{BatchCorrelation, HttpMethod};
use serde_json::{json, Value};
use support::{echo_batch_response, TestGraph};
use wiremock::matchers::{method, path};
use wiremock::{Mock, Request, ResponseTemplate};

fn echo(request: &Request) -> ResponseTemplate {
    let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
    ResponseTemplate::new(200).set_body_json(echo_batch_response(&body))
}

#[tokio::test]
async fn splits_urls_into_envelopes_of_twenty() {
    let graph = TestGraph::start().await;
    Mock::given(method("POST"))
        .and(path("/v1.0/$batch"))
        .respond_with(echo)
        .expect(3)
        .mount(&graph.server)
        .await;

    let urls: Vec<String> = (0..45).map(|i| format!("/users/u{i}")).collect();
    let results = graph.service.batch(&urls, HttpMethod::Get, None).await.unwrap();

    let envelopes = graph.received_json().await;
    let sizes: Vec<usize> =
        envelopes.iter().map(|e| e["requests"].as_array().map_or(0, Vec::len)).collect();
    assert_eq!(sizes, vec![20, 20, 5]);

    for envelope in &envelopes {
        let requests = envelope["requests"].as_array().unwrap();
        for (index, request) in requests.iter().enumerate() {
            assert_eq!(request["id"], (index + 1).to_string());
            assert_eq!(request["method"], "GET");
            assert_eq!(request["headers"]["Content-Type"], "application/json");
            assert!(request.get("body").is_none());
        }
    }

    let echoed: Vec<&str> = results.iter().filter_map(|r| r["url"].as_str()).collect();
    let expected: Vec<&str> = urls.iter().map(String::as_str).collect();
    assert_eq!(echoed, expected);
}

#[tokio::test]
async fn common_body_is_attached_to_every_sub_request() {
    let graph = TestGraph::start().await;
    Mock::given(method("POST"))
        .and(path("/v1.0/$batch"))
        .respond_with(echo)
        .expect(1)
        .mount(&graph.server)
        .await;

    let body = json!({"accountEnabled": false});
    graph
        .service
        .batch(&["/users/a", "/users/b"], HttpMethod::Patch, Some(&body))
        .await
        .unwrap();

    let envelope = &graph.received_json().await[0];
    for request in envelope["requests"].as_array().unwrap() {
        assert_eq!(request["method"], "PATCH");
        assert_eq!(request["body"], body);
    }
}

#[tokio::test]
async fn absolute_urls_are_sent_relative_to_the_root() {
    let graph = TestGraph::start().await;
    Mock::given(method("POST"))
        .respond_with(echo)
        .expect(1)
        .mount(&graph.server)
        .await;

    let urls = [graph.url("/groups/g1"), "/groups/g2".to_string()];
    graph.service.batch(&urls, HttpMethod::Get, None).await.unwrap();

    let envelope = &graph.received_json().await[0];
    assert_eq!(envelope["requests"][0]["url"], "/groups/g1");
    assert_eq!(envelope["requests"][1]["url"], "/groups/g2");
}

#[tokio::test]
async fn throttled_sub_responses_retry_the_whole_envelope() {
    let graph = TestGraph::start().await;
    let counter = AtomicUsize::new(0);
    Mock::given(method("POST"))
        .and(path("/v1.0/$batch"))
        .respond_with(move |request: &Request| -> ResponseTemplate {
            if counter.fetch_add(1, Ordering::SeqCst) > 0 {
                return echo(request);
            }
            ResponseTemplate::new(200).set_body_json(json!({"responses": [
                {"id": "1", "status": 200, "body": {"url": "/users/a"}},
                {"id": "2", "status": 429, "headers": {"Retry-After": "3"}},
                {"id": "3", "status": 200, "body": {"url": "/users/c"}},
                {"id": "4", "status": 429, "headers": {"Retry-After": "7"}},
                {"id": "5", "status": 200, "body": {"url": "/users/e"}}
            ]}))
        })
        .expect(2)
        .mount(&graph.server)
        .await;

    let urls = ["/users/a", "/users/b", "/users/c", "/users/d", "/users/e"];
    let results = graph.service.batch(&urls, HttpMethod::Get, None).await.unwrap();

    assert_eq!(graph.sleeper.delays(), vec![Duration::from_secs(7)]);
    assert_eq!(results.len(), 5);

    let envelopes = graph.received_json().await;
    assert_eq!(envelopes[0], envelopes[1]);
}

#[tokio::test]
async fn throttled_batch_is_retried_per_envelope() {
    let graph = TestGraph::start().await;
    let counter = AtomicUsize::new(0);
    Mock::given(method("POST"))
        .respond_with(move |request: &Request| -> ResponseTemplate {
            // Second envelope is throttled once.
            if counter.fetch_add(1, Ordering::SeqCst) == 1 {
                return ResponseTemplate::new(429).insert_header("Retry-After", "2");
            }
            echo(request)
        })
        .expect(3)
        .mount(&graph.server)
        .await;

    let urls: Vec<String> = (0..25).map(|i| format!("/users/u{i}")).collect();
    let results = graph.service.batch(&urls, HttpMethod::Get, None).await.unwrap();

    assert_eq!(results.len(), 25);
    assert_eq!(graph.sleeper.delays(), vec![Duration::from_secs(2)]);

    let sizes: Vec<usize> = graph
        .received_json()
        .await
        .iter()
        .map(|e| e["requests"].as_array().map_or(0, Vec::len))
        .collect();
    assert_eq!(sizes, vec![20, 5, 5]);
}

#[tokio::test]
async fn null_and_missing_bodies_are_skipped() {
    let graph = TestGraph::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responses": [
            {"id": "1", "status": 200, "body": {"id": "a"}},
            {"id": "2", "status": 204, "body": null},
            {"id": "3", "status": 204},
            {"id": "4", "status": 404, "body": {"error": {"code": "Request_ResourceNotFound"}}}
        ]})))
        .expect(1)
        .mount(&graph.server)
        .await;

    let urls = ["/users/a", "/users/b", "/users/c", "/users/d"];
    let results = graph.service.batch(&urls, HttpMethod::Delete, None).await.unwrap();

    assert_eq!(
        results,
        vec![json!({"id": "a"}), json!({"error": {"code": "Request_ResourceNotFound"}})]
    );
}

fn reversed_responses() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"responses": [
        {"id": "3", "status": 200, "body": {"id": "c"}},
        {"id": "2", "status": 200, "body": {"id": "b"}},
        {"id": "1", "status": 200, "body": {"id": "a"}}
    ]}))
}

#[tokio::test]
async fn results_follow_request_order_by_id() {
    let graph = TestGraph::with_correlation(BatchCorrelation::ById).await;
    Mock::given(method("POST")).respond_with(reversed_responses()).mount(&graph.server).await;

    let results =
        graph.service.batch(&["/users/a", "/users/b", "/users/c"], HttpMethod::Get, None).await.unwrap();

    assert_eq!(results, vec![json!({"id": "a"}), json!({"id": "b"}), json!({"id": "c"})]);
}

#[tokio::test]
async fn positional_correlation_keeps_response_order() {
    let graph = TestGraph::with_correlation(BatchCorrelation::Positional).await;
    Mock::given(method("POST")).respond_with(reversed_responses()).mount(&graph.server).await;

    let results =
        graph.service.batch(&["/users/a", "/users/b", "/users/c"], HttpMethod::Get, None).await.unwrap();

    assert_eq!(results, vec![json!({"id": "c"}), json!({"id": "b"}), json!({"id": "a"})]);
}

#[tokio::test]
async fn empty_url_list_sends_nothing() {
    let graph = TestGraph::start().await;
    Mock::given(method("POST")).respond_with(echo).expect(0).mount(&graph.server).await;

    let urls: [&str; 0] = [];
    let results = graph.service.batch(&urls, HttpMethod::Get, None).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn bad_gateway_on_batch_is_retried() {
    let graph = TestGraph::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&graph.server)
        .await;
    Mock::given(method("POST")).respond_with(echo).expect(1).mount(&graph.server).await;

    let results = graph.service.batch(&["/users/a"], HttpMethod::Get, None).await.unwrap();

    assert_eq!(results, vec![json!({"url": "/users/a"})]);
    assert_eq!(graph.sleeper.delays(), vec![Duration::from_secs(5)]);
}

#[tokio::test]
async fn get_groups_returns_first_match_or_none() {
    let graph = TestGraph::start().await;
    Mock::given(method("POST"))
        .and(path("/v1.0/$batch"))
        .respond_with(|request: &Request| -> ResponseTemplate {
            let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
            let responses: Vec<Value> = body["requests"]
                .as_array()
                .into_iter()
                .flatten()
                .map(|r| {
                    let url = r["url"].as_str().unwrap_or_default();
                    let value = if url.contains("'g1'") {
                        json!([{"id": "g1", "displayName": "Ops", "owners": [{"id": "u1"}]}])
                    } else {
                        json!([])
                    };
                    json!({"id": r["id"], "status": 200, "body": {"value": value}})
                })
                .collect();
            ResponseTemplate::new(200).set_body_json(json!({ "responses": responses }))
        })
        .expect(1)
        .mount(&graph.server)
        .await;

    let groups = graph.service.get_groups(&["g1", "missing"]).await.unwrap();

    assert_eq!(groups.len(), 2);
    let ops = groups[0].as_ref().unwrap();
    assert_eq!(ops["displayName"], "Ops");
    assert_eq!(ops["owners"][0]["id"], "u1");
    assert!(groups[1].is_none());

    let envelope = &graph.received_json().await[0];
    assert_eq!(
        envelope["requests"][0]["url"],
        "/groups?$filter=id eq 'g1'&$expand=owners&$select=id,displayName,owners"
    );
}

#[tokio::test]
async fn sub_responses_without_status_still_yield_their_bodies() {
    let graph = TestGraph::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responses": [
            {"id": "1", "status": 200, "body": {"id": "a"}},
            {"id": "2", "body": {"id": "b"}},
            {"id": 3, "status": 200, "body": {"id": "c"}}
        ]})))
        .expect(1)
        .mount(&graph.server)
        .await;

    let results =
        graph.service.batch(&["/users/a", "/users/b", "/users/c"], HttpMethod::Get, None).await.unwrap();

    assert_eq!(results, vec![json!({"id": "a"}), json!({"id": "b"}), json!({"id": "c"})]);
}

#[tokio::test]
async fn zero_retry_after_in_batch_waits_default_delay() {
    let graph = TestGraph::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responses": [
            {"id": "1", "status": 429, "headers": {"Retry-After": "0"}}
        ]})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&graph.server)
        .await;
    Mock::given(method("POST")).respond_with(echo).expect(1).mount(&graph.server).await;

    let results = graph.service.batch(&["/users/a"], HttpMethod::Get, None).await.unwrap();

    assert_eq!(results, vec![json!({"url": "/users/a"})]);
    assert_eq!(graph.sleeper.delays(), vec![Duration::from_secs(5)]);
}

#[tokio::test]
async fn get_groups_keeps_each_result_on_its_own_id() {
    let graph = TestGraph::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"responses": [
            {"id": "3", "status": 200, "body": {"value": [{"id": "g3"}]}},
            {"id": "1", "status": 200, "body": null},
            {"id": "2", "status": 200, "body": {"value": [{"id": "g2"}]}}
        ]})))
        .expect(1)
        .mount(&graph.server)
        .await;

    let groups = graph.service.get_groups(&["g1", "g2", "g3"]).await.unwrap();

    assert_eq!(groups, vec![None, Some(json!({"id": "g2"})), Some(json!({"id": "g3"}))]);
}
