//! Error types used throughout graphlink

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::Document;

/// Main error type for graphlink
///
/// Throttling and transient gateway failures never show up here; the
/// transport resolves them by retrying. What callers observe is either a
/// complete result or the first response that could not be retried.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum GraphLinkError {
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Terminal non-success response. `body` is the parsed JSON payload, or
    /// a JSON string holding the raw text when the payload was not JSON.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: Document },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GraphLinkError {
    /// Status code of a terminal HTTP failure, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for graphlink operations
pub type Result<T> = std::result::Result<T, GraphLinkError>;
