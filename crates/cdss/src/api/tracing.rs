//! Correlation ids.
//!
//! Every LLM call runs inside a span carrying a `trace_id`, so the retry
//! warnings and timing lines for one consultation can be grepped together.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    // Counter disambiguates calls within the same clock tick.
    let count = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{ts:x}-{count:04x}")
}

/// Generate a unique trace id for one LLM call.
pub fn generate_trace_id() -> String {
    format!("tr-{}", unique_suffix())
}

/// Generate an id for an interactive session.
///
/// The suffix is a random v4 UUID. The web surface treats the id as the
/// only handle on a session's history.
pub fn generate_session_id() -> String {
    format!("ss-{}", uuid::Uuid::new_v4().simple())
}
