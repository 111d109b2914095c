//! Protocol constants
//!
//! Centralized location for the endpoints, field names and limits imposed
//! by the remote Graph API.

// Endpoints
pub const DEFAULT_API_ROOT: &str = "https://graph.microsoft.com";
pub const DEFAULT_API_VERSION: &str = "v1.0";
pub const DEFAULT_RESOURCE: &str = "https://graph.microsoft.com/";
pub const BATCH_PATH: &str = "$batch";

// Response fields
pub const VALUE_FIELD: &str = "value";
pub const NEXT_LINK_FIELD: &str = "@odata.nextLink";
pub const RESPONSES_FIELD: &str = "responses";
pub const RETRY_AFTER_HEADER: &str = "Retry-After";

// Batching
pub const MAX_BATCH_SIZE: usize = 20;
pub const JSON_CONTENT_TYPE: &str = "application/json";

// Retry behaviour
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 5;
pub const DEFAULT_TRANSIENT_RETRY_SECS: u64 = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
