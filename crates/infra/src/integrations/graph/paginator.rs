//! Cursor-following reads
//!
//! A collection response carries a `value` array and, when more data
//! exists, an `@odata.nextLink` URL. [`Paginator::fetch_all`] walks the
//! chain eagerly and hands back every element; a singular resource comes
//! back as a one-element result.

use std::sync::Arc;

use graphlink_domain::constants::VALUE_FIELD;
use graphlink_domain::{Document, DocumentExt, GraphConfig, HttpMethod, Result};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::auth::BearerAuth;
use crate::http::HttpClient;

enum Page {
    Singular(Document),
    Collection { items: Vec<Document>, next_link: Option<String> },
}

impl Page {
    fn from_document(document: Document) -> Self {
        if document.value_items().is_none() {
            return Self::Singular(document);
        }

        let next_link = document.next_link().map(str::to_owned);
        let items = match document {
            Value::Object(mut fields) => match fields.remove(VALUE_FIELD) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        Self::Collection { items, next_link }
    }
}

/// Drives repeated GETs along a next-page cursor chain.
#[derive(Clone)]
pub struct Paginator {
    transport: Arc<HttpClient>,
    auth: Arc<BearerAuth>,
    config: Arc<GraphConfig>,
}

impl Paginator {
    /// Paginator sharing the service's transport, auth and config.
    pub fn new(transport: Arc<HttpClient>, auth: Arc<BearerAuth>, config: Arc<GraphConfig>) -> Self {
        Self { transport, auth, config }
    }

    /// Fetches `url` and every page after it.
    ///
    /// Relative paths are resolved against the configured API root; next
    /// links are followed as given. Any failure aborts the whole traversal.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self, url: &str) -> Result<Vec<Document>> {
        let mut url = self.config.resolve_url(url);
        let mut accumulated = Vec::new();
        let mut pages = 0usize;

        loop {
            let headers = self.auth.headers().await?;
            let document = self.transport.send(&url, HttpMethod::Get, &headers, None, None).await?;
            pages += 1;

            match Page::from_document(document) {
                Page::Singular(document) if pages == 1 => return Ok(vec![document]),
                Page::Singular(_) => {
                    warn!(pages, url = %url, "page without a value array ended pagination");
                    return Ok(accumulated);
                }
                Page::Collection { items, next_link } => {
                    debug!(pages, items = items.len(), "fetched page");
                    accumulated.extend(items);

                    match next_link {
                        Some(next) => url = self.config.resolve_url(&next),
                        None => return Ok(accumulated),
                    }
                }
            }
        }
    }
}
