//! Download reconciler: brings the local output directory in line with the
//! index without unnecessary network activity.
//!
//! Per tracked record, in ascending identifier order:
//! - local file present and marked downloaded: nothing to do;
//! - local file present but not marked: mark it (an existing file always wins over a refetch);
//! - local file absent and budget spent: skip until an operator reset;
//! - otherwise: download via `<dest>.part` and rename.
//!
//! A record marked downloaded whose file has disappeared loses that mark before
//! any decision is made.
//!
//! The attempt counter is incremented and persisted before every fetch, so a
//! crash mid-download still counts. Authorization failures are charged to
//! `auth_retries` instead of the budget and end the pass so the caller can renew
//! the session; the next `run` continues from that same file, so files already
//! visited in this invocation are not fetched again.

mod download;

pub use download::{attempt_download, Attempt};

use anyhow::Result;

use crate::collection::Collection;
use crate::config::DownloadConfig;
use crate::index::{FileRecord, Index, IndexStore};
use crate::retry::{RetryDecision, RetryPolicy};
use crate::session::Fetcher;

/// What to do with one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    UpToDate,
    /// Local file exists but the index does not know; record it without fetching.
    MarkPresent,
    /// Budget spent; skip.
    Exhausted,
    /// Fetch; `attempt` is the 1-based budgeted attempt number.
    Download { attempt: u32 },
}

pub fn decide(rec: &FileRecord, local_exists: bool, policy: &RetryPolicy) -> Action {
    match (local_exists, rec.downloaded) {
        (true, true) => Action::UpToDate,
        (true, false) => Action::MarkPresent,
        (false, _) => match policy.decide(rec) {
            RetryDecision::Exhausted => Action::Exhausted,
            RetryDecision::Attempt { number } => Action::Download { attempt: number },
        },
    }
}

/// Why a reconciliation pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileStop {
    /// Every record was visited.
    Finished,
    /// `filename` was rejected for session reasons; renew and run again.
    AuthExpired { filename: String },
}

/// Counters for one collection. `up_to_date` and `exhausted` describe the latest pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub downloaded: usize,
    pub marked_present: usize,
    pub failed: usize,
    pub exhausted: usize,
    pub up_to_date: usize,
    pub auth_failures: usize,
}

pub struct DownloadReconciler<'a> {
    collection: &'a Collection,
    cfg: &'a DownloadConfig,
    store: &'a IndexStore,
    policy: RetryPolicy,
    summary: ReconcileSummary,
    /// File rejected for session reasons; the next pass starts there.
    resume_at: Option<String>,
}

impl<'a> DownloadReconciler<'a> {
    pub fn new(collection: &'a Collection, cfg: &'a DownloadConfig, store: &'a IndexStore) -> Self {
        Self {
            collection,
            cfg,
            store,
            policy: RetryPolicy::from_config(cfg),
            summary: ReconcileSummary::default(),
            resume_at: None,
        }
    }

    pub fn summary(&self) -> ReconcileSummary {
        self.summary
    }

    /// Tracked filenames in processing order (numeric identifier, then name).
    pub fn ordered_files(&self, index: &Index) -> Vec<String> {
        let filter = &self.collection.filter;
        let mut names: Vec<&String> = index
            .files
            .keys()
            .filter(|n| filter.is_tracked(n))
            .collect();
        names.sort_by(|a, b| filter.sort_key(a).cmp(&filter.sort_key(b)));
        names.into_iter().cloned().collect()
    }

    /// One pass over the index. Per-file failures are recorded and skipped;
    /// `Err` means a fatal problem (persistence or local disk).
    pub async fn run<F: Fetcher + ?Sized>(
        &mut self,
        fetcher: &F,
        index: &mut Index,
    ) -> Result<ReconcileStop> {
        let id = self.collection.id;
        let max = self.policy.max_attempts;
        let names = self.ordered_files(index);
        let start = match self.resume_at.take() {
            Some(file) => {
                let filter = &self.collection.filter;
                let key = filter.sort_key(&file);
                names
                    .iter()
                    .position(|n| filter.sort_key(n) >= key)
                    .unwrap_or(names.len())
            }
            None => {
                self.summary.up_to_date = 0;
                self.summary.exhausted = 0;
                0
            }
        };

        for name in names.into_iter().skip(start) {
            let dest = self.collection.file_path(&name);
            let local_exists = dest.is_file();
            let Some(marked) = index.get(&name).map(|r| r.downloaded) else {
                continue;
            };
            if marked && !local_exists {
                tracing::warn!(collection = id, file = %name, "marked downloaded but missing locally");
                if let Some(rec) = index.get_mut(&name) {
                    rec.downloaded = false;
                    rec.downloaded_at = None;
                }
                self.store.save(index)?;
            }
            let Some(rec) = index.get(&name) else {
                continue;
            };
            match decide(rec, local_exists, &self.policy) {
                Action::UpToDate => self.summary.up_to_date += 1,
                Action::MarkPresent => {
                    let bytes = std::fs::metadata(&dest).ok().map(|m| m.len());
                    if let Some(rec) = index.get_mut(&name) {
                        rec.mark_downloaded(bytes);
                    }
                    self.store.save(index)?;
                    self.summary.marked_present += 1;
                    tracing::info!(collection = id, file = %name, "already on disk; marked downloaded");
                }
                Action::Exhausted => {
                    self.summary.exhausted += 1;
                    tracing::debug!(collection = id, file = %name, "retry budget spent; skipping");
                }
                Action::Download { attempt } => {
                    let (url, referer) = {
                        let Some(rec) = index.get_mut(&name) else {
                            continue;
                        };
                        rec.attempts += 1;
                        (rec.url.clone(), self.collection.referer_for(rec.page))
                    };
                    self.store.save(index)?;
                    tracing::info!(collection = id, file = %name, "download (attempt {attempt}/{max})");

                    let outcome = match attempt_download(fetcher, &url, &referer, &dest).await {
                        Ok(o) => o,
                        Err(e) => {
                            if let Some(rec) = index.get_mut(&name) {
                                rec.last_error = Some(format!("{e:#}"));
                            }
                            return Err(e);
                        }
                    };

                    match outcome {
                        Attempt::Fetched { bytes } => {
                            if let Some(rec) = index.get_mut(&name) {
                                rec.mark_downloaded(Some(bytes));
                            }
                            self.store.save(index)?;
                            self.summary.downloaded += 1;
                            tracing::info!(
                                collection = id,
                                file = %name,
                                bytes,
                                "done ({} this run)",
                                self.summary.downloaded
                            );
                            self.pause().await;
                        }
                        Attempt::Failed(err) => {
                            tracing::warn!(collection = id, file = %name, "download failed: {err}");
                            if let Some(rec) = index.get_mut(&name) {
                                rec.last_error = Some(err);
                            }
                            self.store.save(index)?;
                            self.summary.failed += 1;
                            self.pause().await;
                        }
                        Attempt::AuthExpired(err) => {
                            tracing::warn!(collection = id, file = %name, "session rejected: {err}");
                            if let Some(rec) = index.get_mut(&name) {
                                rec.auth_retries += 1;
                                rec.last_error = Some(err);
                            }
                            self.store.save(index)?;
                            self.summary.auth_failures += 1;
                            self.resume_at = Some(name.clone());
                            return Ok(ReconcileStop::AuthExpired { filename: name });
                        }
                    }
                }
            }
        }

        Ok(ReconcileStop::Finished)
    }

    async fn pause(&self) {
        let delay = self.cfg.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
