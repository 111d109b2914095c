//! HTTP transport
//!
//! [`HttpClient`] performs one logical call per `send`, looking inside batch
//! envelopes for hidden throttling and retrying until it gets an answer it
//! can hand back.

pub mod classify;
pub mod client;
pub mod sleeper;

pub use classify::{Disposition, RetryDelays, RetryReason};
pub use client::{HttpClient, HttpClientBuilder, RequestHeaders};
pub use sleeper::{RecordingSleeper, Sleeper, TokioSleeper};
