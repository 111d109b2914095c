//! Structured documents
//!
//! Every request body, response body and batch envelope is an untyped JSON
//! tree. Lookups go through [`DocumentExt`] so that a missing field is an
//! explicit `None` rather than a panic or a silently-null index.

use serde_json::Value;

use crate::constants::{NEXT_LINK_FIELD, VALUE_FIELD};

/// Generic JSON-like tree used for all API payloads.
pub type Document = Value;

/// Safe traversal over a [`Document`].
pub trait DocumentExt {
    /// Looks up an object field. JSON `null` counts as absent.
    fn field(&self, name: &str) -> Option<&Value>;

    /// Elements of the top-level `value` array of a collection response.
    ///
    /// Returns `None` for singular resources, including ones whose `value`
    /// field is a scalar (primitive property reads).
    fn value_items(&self) -> Option<&[Value]>;

    /// The `@odata.nextLink` page cursor, if another page exists.
    fn next_link(&self) -> Option<&str>;
}

impl DocumentExt for Value {
    fn field(&self, name: &str) -> Option<&Value> {
        self.as_object()?.get(name).filter(|value| !value.is_null())
    }

    fn value_items(&self) -> Option<&[Value]> {
        self.field(VALUE_FIELD)?.as_array().map(Vec::as_slice)
    }

    fn next_link(&self) -> Option<&str> {
        self.field(NEXT_LINK_FIELD)?.as_str().filter(|link| !link.is_empty())
    }
}

/// Parses a response payload, falling back to a JSON string holding the raw
/// text when it is not valid JSON.
pub fn parse_or_raw(text: &str) -> Document {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}
