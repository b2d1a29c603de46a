//! Interactive session provider: the operator completes the site's human
//! verification in a browser and pastes the resulting `Cookie` header.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;

use super::{CurlSession, SessionProvider};
use crate::collection::Collection;
use crate::config::SweepConfig;

pub struct PromptSessionProvider {
    cookie_file: Option<std::path::PathBuf>,
    user_agent: Option<String>,
    timeout: Duration,
    acquired: u32,
}

impl PromptSessionProvider {
    pub fn new(cfg: &SweepConfig) -> Self {
        Self {
            cookie_file: cfg.session.cookie_file.clone(),
            user_agent: cfg.session.user_agent.clone(),
            timeout: cfg.download.fetch_timeout(),
            acquired: 0,
        }
    }
}

/// Accepts either a bare cookie string or a full `Cookie: ...` header line.
/// Returns None for blank input.
pub fn normalize_cookie(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let value = match trimmed.split_once(':') {
        Some((name, rest)) if name.trim().eq_ignore_ascii_case("cookie") => rest.trim(),
        _ => trimmed,
    };
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn read_cookie_file(path: &Path) -> Result<Option<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read cookie file: {}", path.display()))?;
    Ok(normalize_cookie(&raw))
}

fn prompt_for_cookie(collection: u32, first_page: &str) -> Result<Option<String>> {
    let mut out = std::io::stdout().lock();
    writeln!(out)?;
    writeln!(out, "=== AUTH REQUIRED (collection {collection}) ===")?;
    writeln!(out, "Open {first_page} in a browser and complete any robot check.")?;
    writeln!(out, "Wait until the file list is visible, then copy the request's Cookie header.")?;
    write!(out, "Paste Cookie header (empty line to continue without one): ")?;
    out.flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read cookie from stdin")?;
    Ok(normalize_cookie(&line))
}

#[async_trait]
impl SessionProvider for PromptSessionProvider {
    type Session = CurlSession;

    async fn acquire(&mut self, collection: &Collection) -> Result<CurlSession> {
        self.acquired += 1;

        let from_file = match (&self.cookie_file, self.acquired) {
            (Some(path), 1) => read_cookie_file(path)?,
            _ => None,
        };
        let cookie = match from_file {
            Some(c) => {
                tracing::info!(collection = collection.id, "using cookie file for new session");
                Some(c)
            }
            None => {
                let id = collection.id;
                let first_page = collection.page_url(1);
                tokio::task::spawn_blocking(move || prompt_for_cookie(id, &first_page))
                    .await
                    .context("prompt task join")??
            }
        };

        tracing::info!(
            collection = collection.id,
            with_cookie = cookie.is_some(),
            "new session"
        );
        Ok(CurlSession::new(cookie, self.user_agent.clone(), self.timeout))
    }
}
