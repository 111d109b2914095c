//! Response classification
//!
//! Decides, from one fully-read response, whether the transport returns a
//! document, fails, or sleeps and reissues the identical request.

use std::time::Duration;

use graphlink_domain::batch::{batch_retry_after, throttled_responses};
use graphlink_domain::constants::JSON_CONTENT_TYPE;
use graphlink_domain::document::parse_or_raw;
use graphlink_domain::{Document, GraphLinkError};
use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use serde_json::{json, Map, Value};

/// Delays applied when a retryable response does not say how long to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDelays {
    pub default_retry_after: Duration,
    pub transient: Duration,
}

/// Why a request is being reissued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// Top-level 429.
    Throttled,
    /// 200 batch envelope with at least one 429 sub-response.
    BatchThrottled { throttled: usize },
    /// 502 or 504.
    Transient,
}

/// What the transport does with a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    Retry { reason: RetryReason, delay: Duration },
    Complete(Document),
    Fail(GraphLinkError),
}

/// A response whose body has already been read.
#[derive(Debug, Clone)]
pub struct ReceivedResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl ReceivedResponse {
    fn is_json(&self) -> bool {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case(JSON_CONTENT_TYPE))
    }

    fn retry_after(&self) -> Option<Duration> {
        self.headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Stand-in document for bodiless success responses.
    fn placeholder(&self) -> Document {
        let headers: Map<String, Value> = self
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_string(), Value::String(v.into())))
            })
            .collect();

        json!({
            "status": self.status,
            "reason": reqwest::StatusCode::from_u16(self.status)
                .ok()
                .and_then(|status| status.canonical_reason()),
            "headers": headers,
        })
    }
}

/// Decides what the transport does with `response`.
pub fn classify(response: &ReceivedResponse, delays: &RetryDelays) -> Disposition {
    match response.status {
        429 => Disposition::Retry {
            reason: RetryReason::Throttled,
            delay: response.retry_after().unwrap_or(delays.default_retry_after),
        },
        502 | 504 => Disposition::Retry { reason: RetryReason::Transient, delay: delays.transient },
        202 | 204 => Disposition::Complete(response.placeholder()),
        200 if response.is_json() => {
            let document = parse_or_raw(&response.body);
            let throttled = throttled_responses(&document).len();
            if throttled == 0 {
                return Disposition::Complete(document);
            }

            let delay = batch_retry_after(&document)
                .map(Duration::from_secs)
                .unwrap_or(delays.default_retry_after);
            Disposition::Retry { reason: RetryReason::BatchThrottled { throttled }, delay }
        }
        status if (200..300).contains(&status) => Disposition::Complete(parse_or_raw(&response.body)),
        status => Disposition::Fail(GraphLinkError::Http { status, body: parse_or_raw(&response.body) }),
    }
}
