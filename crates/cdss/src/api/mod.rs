//! LLM call plumbing: retry with backoff and correlation ids.
//!
//! - [`retry`]: exponential backoff for transient
//!   [`ExternalCallError`](crate::error::ExternalCallError)s. Never retries
//!   client errors.
//! - [`tracing`]: `trace_id` generation for per-call log spans and session
//!   ids for the web surface.

pub mod retry;
pub mod tracing;

pub use retry::{RetryConfig, retry_call};
pub use tracing::{generate_session_id, generate_trace_id};
