//! Batch envelopes
//!
//! A batch groups up to [`MAX_BATCH_SIZE`] logical requests into a single
//! `POST /$batch`. The response is an aggregate `200` whose `responses`
//! array carries one status per sub-request, so throttling has to be
//! detected by looking inside the envelope.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::constants::{
    JSON_CONTENT_TYPE, MAX_BATCH_SIZE, RESPONSES_FIELD, RETRY_AFTER_HEADER,
};
use crate::config::BatchCorrelation;
use crate::document::{Document, DocumentExt};
use crate::errors::{GraphLinkError, Result};
use crate::method::HttpMethod;

/// One sub-request inside a batch envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub id: String,
    pub method: HttpMethod,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Document>,
    pub headers: BTreeMap<String, String>,
}

impl BatchRequest {
    /// Sub-request without a body and with a JSON content type.
    pub fn new(id: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string());

        Self { id: id.into(), method, url: url.into(), body: None, headers }
    }

    /// Attaches `body` (or clears it with `None`).
    pub fn with_body(mut self, body: Option<Document>) -> Self {
        self.body = body;
        self
    }
}

/// `{"requests": [...]}` sent to the batch endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchRequestEnvelope {
    pub requests: Vec<BatchRequest>,
}

impl BatchRequestEnvelope {
    /// Builds one envelope with ids `"1".."k"` in url order.
    ///
    /// # Errors
    /// Returns `GraphLinkError::InvalidInput` if more than
    /// [`MAX_BATCH_SIZE`] urls are supplied.
    pub fn from_urls<S: AsRef<str>>(
        urls: &[S],
        method: HttpMethod,
        common_body: Option<&Document>,
    ) -> Result<Self> {
        if urls.len() > MAX_BATCH_SIZE {
            return Err(GraphLinkError::InvalidInput(format!(
                "batch envelope holds at most {MAX_BATCH_SIZE} requests, got {}",
                urls.len()
            )));
        }

        let requests = urls
            .iter()
            .enumerate()
            .map(|(index, url)| {
                BatchRequest::new((index + 1).to_string(), method, url.as_ref())
                    .with_body(common_body.cloned())
            })
            .collect();

        Ok(Self { requests })
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// One element of a batch response's `responses` array.
///
/// Only `body` matters for result extraction, so the other fields are read
/// leniently: a missing or oddly-typed `id`, `status` or `headers` never
/// rejects the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<u16>,
    #[serde(default, deserialize_with = "lenient_headers")]
    pub headers: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub body: Option<Document>,
}

impl BatchResponse {
    /// Position of the originating request, parsed from the 1-based id.
    pub fn request_index(&self) -> Option<usize> {
        self.id.trim().parse::<usize>().ok()
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(id) => id,
        Value::Number(id) => id.to_string(),
        _ => String::new(),
    })
}

fn lenient_status<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u16>, D::Error> {
    Ok(integer_of(&Value::deserialize(deserializer)?).and_then(|status| u16::try_from(status).ok()))
}

fn lenient_headers<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<BTreeMap<String, Value>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(headers) => Some(headers.into_iter().collect()),
        _ => None,
    })
}

/// `{"responses": [...]}` returned by the batch endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResponseEnvelope {
    pub responses: Vec<BatchResponse>,
}

impl BatchResponseEnvelope {
    /// Interprets a transport document as a batch response.
    ///
    /// Elements of `responses` that are not objects are skipped.
    ///
    /// # Errors
    /// Returns `GraphLinkError::InvalidInput` when the document has no
    /// `responses` array.
    pub fn from_document(document: &Document) -> Result<Self> {
        let elements = document.field(RESPONSES_FIELD).and_then(Value::as_array).ok_or_else(|| {
            GraphLinkError::InvalidInput("malformed batch response: no responses array".into())
        })?;

        let responses = elements
            .iter()
            .filter(|element| element.is_object())
            .filter_map(|element| BatchResponse::deserialize(element).ok())
            .collect();

        Ok(Self { responses })
    }

    /// Orders sub-responses by the id of the request they answer.
    ///
    /// Responses with a non-numeric id keep their relative order after the
    /// numbered ones.
    pub fn sort_by_request_id(&mut self) {
        self.responses.sort_by_key(|response| response.request_index().unwrap_or(usize::MAX));
    }

    /// Bodies of every sub-response that carried a non-null body.
    pub fn into_bodies(self) -> Vec<Document> {
        self.responses
            .into_iter()
            .filter_map(|response| response.body.filter(|body| !body.is_null()))
            .collect()
    }

    /// One slot per request of an envelope of `len` requests.
    ///
    /// `ById` places each body at the position its id names; `Positional`
    /// uses the order the responses arrived in. Slots whose response is
    /// missing, has a null body or names an unknown id stay `None`.
    pub fn into_slots(self, len: usize, correlation: BatchCorrelation) -> Vec<Option<Document>> {
        let mut slots = vec![None; len];

        for (position, response) in self.responses.into_iter().enumerate() {
            let index = match correlation {
                BatchCorrelation::ById => response.request_index().and_then(|id| id.checked_sub(1)),
                BatchCorrelation::Positional => Some(position),
            };
            let body = response.body.filter(|body| !body.is_null());

            if let (Some(slot), Some(body)) = (index.and_then(|i| slots.get_mut(i)), body) {
                *slot = Some(body);
            }
        }

        slots
    }
}

/// Sub-responses of a batch envelope that were throttled.
///
/// A document without a `responses` array, or whose entries do not look like
/// sub-responses, yields nothing: shape mismatches mean "not throttled".
pub fn throttled_responses(document: &Document) -> Vec<&Value> {
    document
        .field(RESPONSES_FIELD)
        .and_then(Value::as_array)
        .map(|responses| {
            responses.iter().filter(|response| status_of(response) == Some(429)).collect()
        })
        .unwrap_or_default()
}

/// Largest `Retry-After` (seconds) across all throttled sub-responses.
///
/// Returns `None` when no throttled sub-response carries a positive value.
pub fn batch_retry_after(document: &Document) -> Option<u64> {
    throttled_responses(document)
        .into_iter()
        .filter_map(retry_after_of)
        .filter(|secs| *secs > 0)
        .max()
}

fn status_of(response: &Value) -> Option<u64> {
    integer_of(response.field("status")?)
}

/// Integer carried either as a JSON number or as a numeric string.
fn integer_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn retry_after_of(response: &Value) -> Option<u64> {
    let headers = response.field("headers")?.as_object()?;
    let (_, value) =
        headers.iter().find(|(name, _)| name.eq_ignore_ascii_case(RETRY_AFTER_HEADER))?;

    integer_of(value)
}
