//! # graphlink Domain
//!
//! Transport-agnostic types for talking to a paged, batchable Graph API.
//!
//! This crate contains:
//! - The error type and Result alias shared by every graphlink crate
//! - The structured document model and safe traversal helpers
//! - Batch request/response envelopes and throttle inspection
//! - Client configuration
//!
//! ## Architecture
//! - No dependencies on other graphlink crates
//! - No I/O; everything here is pure data

pub mod batch;
pub mod config;
pub mod constants;
pub mod document;
pub mod errors;
pub mod macros;
pub mod method;

// Re-export commonly used items
pub use batch::{BatchRequest, BatchRequestEnvelope, BatchResponse, BatchResponseEnvelope};
pub use config::{BatchCorrelation, GraphConfig};
pub use document::{Document, DocumentExt};
pub use errors::*;
pub use method::HttpMethod;
