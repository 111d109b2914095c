//! HTTP verbs accepted by the transport and inside batch envelopes

use serde::{Deserialize, Serialize};

use crate::impl_wire_token_conversions;

/// Verb of a single logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl_wire_token_conversions!(HttpMethod {
    Get => "GET",
    Post => "POST",
    Put => "PUT",
    Patch => "PATCH",
    Delete => "DELETE",
});

impl HttpMethod {
    /// Whether a request body is sent with this verb.
    pub const fn carries_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}
