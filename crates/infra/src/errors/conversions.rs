//! Conversions from external infrastructure errors into domain errors.

use graphlink_domain::GraphLinkError;
use reqwest::Error as HttpError;
use serde_json::Value;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub GraphLinkError);

impl From<InfraError> for GraphLinkError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<GraphLinkError> for InfraError {
    fn from(value: GraphLinkError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoGraphLinkError {
    fn into_graphlink(self) -> GraphLinkError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → GraphLinkError */
/* -------------------------------------------------------------------------- */

impl IntoGraphLinkError for HttpError {
    fn into_graphlink(self) -> GraphLinkError {
        if self.is_builder() {
            return GraphLinkError::InvalidInput(format!("invalid HTTP request: {self}"));
        }

        if self.is_timeout() {
            return GraphLinkError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return GraphLinkError::Network(format!("HTTP connection failure: {self}"));
        }

        if let Some(status) = self.status() {
            return GraphLinkError::Http {
                status: status.as_u16(),
                body: Value::String(status.canonical_reason().unwrap_or("unknown status").into()),
            };
        }

        if self.is_body() || self.is_decode() {
            return GraphLinkError::Network(format!("failed to read HTTP response body: {self}"));
        }

        GraphLinkError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_graphlink())
    }
}

/// Shorthand used at `?` sites that start from a `reqwest::Error`.
pub(crate) fn http_error(err: HttpError) -> GraphLinkError {
    InfraError::from(err).into()
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
