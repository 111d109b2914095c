//! # graphlink Infrastructure
//!
//! I/O side of graphlink.
//!
//! This crate contains:
//! - The throttle-aware HTTP transport
//! - Managed identity and static credential providers
//! - Pagination and batching over the Graph API
//! - Configuration loading and logging setup
//!
//! ## Architecture
//! - Builds on the pure types in `graphlink-domain`
//! - Contains all "impure" code (network, environment, filesystem)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use graphlink_domain::HttpMethod;
//! use graphlink_infra::config;
//! use graphlink_infra::integrations::graph::{GraphService, ManagedIdentityCredential};
//!
//! # async fn example() -> graphlink_domain::Result<()> {
//! let service = GraphService::new(config::load()?, Arc::new(ManagedIdentityCredential::from_env()?))?;
//!
//! let users = service.get("/users?$select=id,displayName").await?;
//! let groups = service.get_groups(&["group-a", "group-b"]).await?;
//! let disabled = service
//!     .batch(&["/users/a", "/users/b"], HttpMethod::Patch, Some(&serde_json::json!({"accountEnabled": false})))
//!     .await?;
//! # let _ = (users, groups, disabled);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod observability;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, RecordingSleeper, Sleeper, TokioSleeper};
pub use integrations::graph::{
    CredentialProvider, GraphService, ManagedIdentityCredential, StaticTokenCredential,
};
