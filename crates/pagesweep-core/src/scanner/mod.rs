//! Page scanner: walks listing pages in increasing order and folds every
//! tracked file reference into the index.
//!
//! The index and the resume marker are persisted around every page, so an
//! interruption loses at most the page in flight. The marker is written as the
//! page number *before* the page is listed (an interrupt resumes on that same
//! page) and as the next page once the page is recorded.
//!
//! Scanning stops once `no_new_page_threshold` consecutive pages contribute no
//! new files. The inventory keeps growing, so there is no fixed last page;
//! `hard_page_cap` only guards against a lister that never runs dry.

use anyhow::{Context, Result};

use crate::collection::Collection;
use crate::config::ScanConfig;
use crate::index::{Index, IndexStore};
use crate::resume::ResumeTracker;
use crate::retry::{classify_fetch_error, ErrorKind};
use crate::session::Lister;

/// Why a scan pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStop {
    /// `streak` consecutive pages without new files, ending at `page`.
    Exhausted { page: u32, streak: u32 },
    /// The next page would exceed the hard page cap.
    HardCap { page: u32 },
    /// The lister rejected the session while listing `page`; renew and call `scan` again.
    AuthExpired { page: u32 },
}

/// Totals for one collection's scan (across session renewals).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    pub stop: ScanStop,
    pub start_page: u32,
    pub pages_scanned: u32,
    pub new_files: usize,
}

pub struct PageScanner<'a> {
    collection: &'a Collection,
    cfg: &'a ScanConfig,
    store: &'a IndexStore,
    resume: ResumeTracker,
    streak: u32,
    start_page: Option<u32>,
    pages_scanned: u32,
    new_files: usize,
}

impl<'a> PageScanner<'a> {
    pub fn new(collection: &'a Collection, cfg: &'a ScanConfig, store: &'a IndexStore) -> Self {
        Self {
            collection,
            cfg,
            store,
            resume: ResumeTracker::new(&collection.state_path),
            streak: 0,
            start_page: None,
            pages_scanned: 0,
            new_files: 0,
        }
    }

    /// First page to scan: the further along of the resume marker and the
    /// index's last scanned page, never below 1.
    pub fn start_page(&self, index: &Index) -> u32 {
        let marker = self.resume.load().unwrap_or(0);
        marker.max(index.meta.last_scan_page).max(1)
    }

    /// Current streak of pages without new files.
    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn report(&self, stop: ScanStop) -> ScanReport {
        ScanReport {
            stop,
            start_page: self.start_page.unwrap_or(1),
            pages_scanned: self.pages_scanned,
            new_files: self.new_files,
        }
    }

    /// Scan from the resume position until a stop condition. Lister transport
    /// failures and persistence failures are fatal (`Err`); an authorization
    /// failure is returned as [`ScanStop::AuthExpired`] with the streak kept,
    /// so calling `scan` again after renewal continues where it left off.
    pub async fn scan<L: Lister + ?Sized>(
        &mut self,
        lister: &L,
        index: &mut Index,
    ) -> Result<ScanStop> {
        let id = self.collection.id;
        let threshold = self.cfg.no_new_page_threshold;
        let mut page = self.start_page(index);
        self.start_page.get_or_insert(page);
        tracing::info!(collection = id, page, streak = self.streak, "scan start");

        loop {
            if page > self.cfg.hard_page_cap {
                tracing::warn!(
                    collection = id,
                    page,
                    cap = self.cfg.hard_page_cap,
                    "hard page cap reached; stopping scan"
                );
                return Ok(ScanStop::HardCap { page });
            }

            self.resume.save(page)?;
            let page_url = self.collection.page_url(page);
            tracing::info!(collection = id, page, "scanning page");

            let hrefs = match lister.list(&page_url).await {
                Ok(h) => h,
                Err(e) => match classify_fetch_error(&e) {
                    ErrorKind::AuthExpired => {
                        tracing::warn!(collection = id, page, "listing rejected: {e}");
                        return Ok(ScanStop::AuthExpired { page });
                    }
                    ErrorKind::Transient => {
                        return Err(anyhow::Error::new(e))
                            .with_context(|| format!("collection {id}: list page {page}"));
                    }
                },
            };

            let mut found = 0usize;
            let mut new_this_page = 0usize;
            for cand in hrefs.iter().filter_map(|h| self.collection.candidate(h)) {
                found += 1;
                if index.upsert(&cand.filename, &cand.url, page) {
                    new_this_page += 1;
                }
            }
            self.pages_scanned += 1;
            self.new_files += new_this_page;

            if new_this_page == 0 {
                self.streak += 1;
                tracing::info!(
                    collection = id,
                    page,
                    found,
                    "no new files (streak {}/{})",
                    self.streak,
                    threshold
                );
            } else {
                self.streak = 0;
                tracing::info!(collection = id, page, found, new = new_this_page, "new files discovered");
            }

            index.record_scan(page);
            self.store.save(index)?;

            let done = self.streak >= threshold;
            self.resume.save(if done { page } else { page.saturating_add(1) })?;
            if done {
                tracing::info!(
                    collection = id,
                    page,
                    "stopping scan: no new files for {threshold} consecutive pages"
                );
                return Ok(ScanStop::Exhausted {
                    page,
                    streak: self.streak,
                });
            }

            page = match page.checked_add(1) {
                Some(next) => next,
                None => return Ok(ScanStop::HardCap { page }),
            };
            let delay = self.cfg.page_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}
