//! In-memory remote inventory implementing the collaborator traits.
//!
//! One `FakeSite` backs every session handed out by its `FakeProvider`, so
//! tests can script listing pages, file bodies, failures and session expiry,
//! then inspect what was requested.

use async_trait::async_trait;
use pagesweep_core::collection::Collection;
use pagesweep_core::session::{FetchError, FetchResponse, Fetcher, Lister, SessionProvider};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::file_name;

#[derive(Default)]
struct SiteState {
    pages: BTreeMap<u32, Vec<String>>,
    bodies: HashMap<String, Vec<u8>>,
    failing: HashMap<String, u16>,
    expire_listing: HashSet<u32>,
    expire_fetch: HashMap<String, u32>,
    broken_listing: HashSet<u32>,
    listed: Vec<u32>,
    fetched: Vec<String>,
}

#[derive(Clone, Default)]
pub struct FakeSite {
    state: Arc<Mutex<SiteState>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listing page `page` links to files `ids` (plus some unrelated links).
    pub fn page(&self, page: u32, ids: &[u32]) -> &Self {
        let mut hrefs: Vec<String> = ids.iter().map(|id| format!("/files/{}", file_name(*id))).collect();
        hrefs.push("/about".into());
        hrefs.push("/files/cover-letter.pdf".into());
        self.state.lock().unwrap().pages.insert(page, hrefs);
        self
    }

    pub fn body(&self, id: u32, body: &[u8]) -> &Self {
        self.state
            .lock()
            .unwrap()
            .bodies
            .insert(file_name(id), body.to_vec());
        self
    }

    /// File `id` always answers with `status`.
    pub fn failing(&self, id: u32, status: u16) -> &Self {
        self.state.lock().unwrap().failing.insert(file_name(id), status);
        self
    }

    /// The next listing of `page` is rejected with HTTP 401.
    pub fn expire_listing_at(&self, page: u32) -> &Self {
        self.state.lock().unwrap().expire_listing.insert(page);
        self
    }

    /// The next fetch of file `id` is rejected with HTTP 401. Stacks when repeated.
    pub fn expire_fetch_of(&self, id: u32) -> &Self {
        *self
            .state
            .lock()
            .unwrap()
            .expire_fetch
            .entry(file_name(id))
            .or_insert(0) += 1;
        self
    }

    /// Listing `page` fails with a transport error every time.
    pub fn break_listing_at(&self, page: u32) -> &Self {
        self.state.lock().unwrap().broken_listing.insert(page);
        self
    }

    pub fn listed_pages(&self) -> Vec<u32> {
        self.state.lock().unwrap().listed.clone()
    }

    pub fn fetch_count(&self, id: u32) -> usize {
        let name = file_name(id);
        self.state
            .lock()
            .unwrap()
            .fetched
            .iter()
            .filter(|f| **f == name)
            .count()
    }

    pub fn total_fetches(&self) -> usize {
        self.state.lock().unwrap().fetched.len()
    }

    pub fn provider(&self) -> FakeProvider {
        FakeProvider {
            site: self.clone(),
            acquired: Vec::new(),
        }
    }
}

pub struct FakeSession {
    site: FakeSite,
}

#[async_trait]
impl Lister for FakeSession {
    async fn list(&self, page_url: &str) -> Result<Vec<String>, FetchError> {
        let page: u32 = page_url
            .rsplit('=')
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| FetchError::Transport(format!("bad page url {page_url}")))?;
        let mut st = self.site.state.lock().unwrap();
        st.listed.push(page);
        if st.broken_listing.contains(&page) {
            return Err(FetchError::Transport("connection reset by peer".into()));
        }
        if st.expire_listing.remove(&page) {
            return Err(FetchError::AuthExpired(401));
        }
        Ok(st.pages.get(&page).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl Fetcher for FakeSession {
    async fn fetch(&self, url: &str, _referer: &str) -> Result<FetchResponse, FetchError> {
        let name = url.rsplit('/').next().unwrap_or_default().to_string();
        let mut st = self.site.state.lock().unwrap();
        st.fetched.push(name.clone());
        let expired = match st.expire_fetch.get_mut(&name) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        };
        let (status, body) = if expired {
            (401, b"login".to_vec())
        } else if let Some(status) = st.failing.get(&name) {
            (*status, b"<html>error</html>".to_vec())
        } else if let Some(body) = st.bodies.get(&name) {
            (200, body.clone())
        } else {
            (404, b"not found".to_vec())
        };
        Ok(FetchResponse { status, body })
    }
}

/// Hands out sessions on `site` and records which collection asked.
pub struct FakeProvider {
    site: FakeSite,
    pub acquired: Vec<u32>,
}

#[async_trait]
impl SessionProvider for FakeProvider {
    type Session = FakeSession;

    async fn acquire(&mut self, collection: &Collection) -> anyhow::Result<FakeSession> {
        self.acquired.push(collection.id);
        Ok(FakeSession {
            site: self.site.clone(),
        })
    }
}
