//! Graph API integration
//!
//! - [`auth`]: credential providers and per-call bearer headers
//! - [`paginator`]: `@odata.nextLink` traversal
//! - [`batcher`]: `$batch` chunking and unpacking
//! - [`service`]: the [`GraphService`] facade over all of the above

pub mod auth;
pub mod batcher;
pub mod paginator;
pub mod service;

pub use auth::{
    BearerAuth, CredentialProvider, ManagedIdentityCredential, ManagedIdentityEndpoint,
    StaticTokenCredential,
};
pub use batcher::Batcher;
pub use paginator::Paginator;
pub use service::{group_lookup_url, GraphService};
