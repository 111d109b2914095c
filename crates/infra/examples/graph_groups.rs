//! Example: Listing users and resolving groups with their owners
//!
//! Authenticates with the managed identity of the host (or with
//! `GRAPHLINK_DEBUG_TOKEN` when set), reads every user page by page, then
//! looks up the groups given on the command line in batches.
//!
//! # Usage
//!
//! ```bash
//! GRAPHLINK_DEBUG_TOKEN=<token> cargo run --example graph_groups -- <group-id>...
//! ```

use std::sync::Arc;

use graphlink_infra::config;
use graphlink_infra::integrations::graph::{
    CredentialProvider, GraphService, ManagedIdentityCredential, StaticTokenCredential,
};
use graphlink_infra::observability::{init_tracing, LogFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("graphlink_infra=info", LogFormat::Text)?;

    let config = config::load()?;

    // The debug token short-circuits the provider, so any provider will do.
    let credentials: Arc<dyn CredentialProvider> = if config.debug_token.is_some() {
        Arc::new(StaticTokenCredential::new(""))
    } else {
        Arc::new(ManagedIdentityCredential::from_env()?)
    };

    let service = GraphService::new(config, credentials)?;

    let users = service.get("/users?$select=id,displayName").await?;
    println!("{} users", users.len());

    let group_ids: Vec<String> = std::env::args().skip(1).collect();
    for (id, group) in group_ids.iter().zip(service.get_groups(&group_ids).await?) {
        match group {
            Some(group) => {
                let owners = group["owners"].as_array().map_or(0, Vec::len);
                println!("{id}: {} ({owners} owners)", group["displayName"]);
            }
            None => println!("{id}: not found"),
        }
    }

    Ok(())
}
