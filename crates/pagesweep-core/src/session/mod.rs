//! Collaborator seams: listing pages, fetching files, and obtaining an
//! authenticated session.
//!
//! The scanner, reconciler and orchestrator only see these traits, so the whole
//! engine runs against fakes in tests. [`CurlSession`] and
//! [`PromptSessionProvider`] are the concrete implementations used by the CLI.

mod http;
mod links;
mod prompt;

pub use http::CurlSession;
pub use links::extract_hrefs;
pub use prompt::{normalize_cookie, PromptSessionProvider};

use async_trait::async_trait;

use crate::collection::Collection;

/// Error reported by a Lister or Fetcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The remote rejected the session (e.g. HTTP 401).
    #[error("session rejected (HTTP {0})")]
    AuthExpired(u16),
    /// Non-success HTTP status.
    #[error("HTTP {0}")]
    Status(u16),
    /// Timeout, connection failure, or other transport-level problem.
    #[error("{0}")]
    Transport(String),
}

impl From<curl::Error> for FetchError {
    fn from(e: curl::Error) -> Self {
        FetchError::Transport(e.to_string())
    }
}

/// Raw response of a file fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Turns a listing-page URL into the raw href strings found on it.
#[async_trait]
pub trait Lister: Send + Sync {
    async fn list(&self, page_url: &str) -> Result<Vec<String>, FetchError>;
}

/// Authenticated GET of a file URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, referer: &str) -> Result<FetchResponse, FetchError>;
}

/// Produces an authenticated session. Called once per collection and again
/// after every authorization failure; may block on a human step.
#[async_trait]
pub trait SessionProvider: Send {
    type Session: Lister + Fetcher;

    async fn acquire(&mut self, collection: &Collection) -> anyhow::Result<Self::Session>;
}
