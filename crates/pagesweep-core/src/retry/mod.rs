//! Retry budget and failure classification.
//!
//! Retries are driven purely by a per-file attempt budget persisted in the
//! index, never by elapsed time. Authorization failures are classified apart
//! from ordinary failures: they mean the session is stale, not that the file is
//! unavailable, so they never consume budget.

mod classify;
mod policy;

pub use classify::{classify_fetch_error, classify_http_status, ErrorKind};
pub use policy::{RetryDecision, RetryPolicy};
