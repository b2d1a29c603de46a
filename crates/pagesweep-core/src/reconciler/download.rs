//! One download attempt: fetch, then `<dest>.part` + rename.

use anyhow::{Context, Result};
use std::path::Path;

use crate::retry::{classify_fetch_error, classify_http_status, ErrorKind};
use crate::session::Fetcher;
use crate::storage;

/// Result of a single attempt. Local disk failures are returned as `Err` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// File is complete at its destination.
    Fetched { bytes: u64 },
    /// Charged against the budget; the string is stored as `last_error`.
    Failed(String),
    /// Session rejected; not charged.
    AuthExpired(String),
}

/// Fetch `url` and atomically place the body at `dest`.
///
/// A stale `<dest>.part` from an interrupted attempt is discarded first. The
/// destination is only ever replaced by a complete file.
pub async fn attempt_download<F: Fetcher + ?Sized>(
    fetcher: &F,
    url: &str,
    referer: &str,
    dest: &Path,
) -> Result<Attempt> {
    let part = storage::part_path(dest);
    storage::discard_stale(&part)?;

    let resp = match fetcher.fetch(url, referer).await {
        Ok(r) => r,
        Err(e) => {
            return Ok(match classify_fetch_error(&e) {
                ErrorKind::AuthExpired => Attempt::AuthExpired(e.to_string()),
                ErrorKind::Transient => Attempt::Failed(e.to_string()),
            })
        }
    };

    match classify_http_status(resp.status) {
        None => {
            let body = resp.body;
            let bytes = body.len() as u64;
            let final_path = dest.to_path_buf();
            tokio::task::spawn_blocking(move || storage::write_via(&part, &final_path, &body))
                .await
                .context("write task join")??;
            Ok(Attempt::Fetched { bytes })
        }
        Some(ErrorKind::AuthExpired) => Ok(Attempt::AuthExpired(format!("HTTP {}", resp.status))),
        Some(ErrorKind::Transient) => Ok(Attempt::Failed(format!("HTTP {}", resp.status))),
    }
}
