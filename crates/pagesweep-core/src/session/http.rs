//! Blocking libcurl GETs wrapped for the async collaborator traits.

use async_trait::async_trait;
use std::time::Duration;

use super::links::extract_hrefs;
use super::{FetchError, FetchResponse, Fetcher, Lister};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: u32 = 10;

/// Session state carried by every request: cookie, user agent and timeout.
#[derive(Debug, Clone)]
pub struct CurlSession {
    cookie: Option<String>,
    user_agent: Option<String>,
    timeout: Duration,
}

impl CurlSession {
    pub fn new(cookie: Option<String>, user_agent: Option<String>, timeout: Duration) -> Self {
        Self {
            cookie,
            user_agent,
            timeout,
        }
    }

    pub fn has_cookie(&self) -> bool {
        self.cookie.is_some()
    }

    /// Runs a GET on the blocking pool.
    async fn get(&self, url: &str, headers: Vec<String>) -> Result<FetchResponse, FetchError> {
        let session = self.clone();
        let url = url.to_string();
        tokio::task::spawn_blocking(move || session.get_blocking(&url, &headers))
            .await
            .map_err(|e| FetchError::Transport(format!("request task join: {e}")))?
    }

    fn get_blocking(&self, url: &str, headers: &[String]) -> Result<FetchResponse, FetchError> {
        let mut body: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(MAX_REDIRECTS)?;
        easy.accept_encoding("")?;
        easy.connect_timeout(CONNECT_TIMEOUT)?;
        easy.timeout(self.timeout)?;
        if let Some(ua) = &self.user_agent {
            easy.useragent(ua)?;
        }
        if let Some(cookie) = &self.cookie {
            easy.cookie(cookie)?;
        }

        let mut list = curl::easy::List::new();
        for h in headers {
            list.append(h)?;
        }
        if !headers.is_empty() {
            easy.http_headers(list)?;
        }

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        let status = u16::try_from(code)
            .map_err(|_| FetchError::Transport(format!("invalid response code {code}")))?;
        tracing::debug!(url, status, bytes = body.len(), "GET complete");
        Ok(FetchResponse { status, body })
    }
}

#[async_trait]
impl Lister for CurlSession {
    async fn list(&self, page_url: &str) -> Result<Vec<String>, FetchError> {
        let resp = self
            .get(page_url, vec!["Accept: text/html,application/xhtml+xml,*/*".to_string()])
            .await?;
        match resp.status {
            401 => return Err(FetchError::AuthExpired(401)),
            s if !resp.is_success() => return Err(FetchError::Status(s)),
            _ => {}
        }
        tokio::task::spawn_blocking(move || extract_hrefs(&String::from_utf8_lossy(&resp.body)))
            .await
            .map_err(|e| FetchError::Transport(format!("link extraction join: {e}")))
    }
}

#[async_trait]
impl Fetcher for CurlSession {
    async fn fetch(&self, url: &str, referer: &str) -> Result<FetchResponse, FetchError> {
        self.get(
            url,
            vec![
                format!("Referer: {referer}"),
                "Accept: application/pdf,*/*".to_string(),
            ],
        )
        .await
    }
}
