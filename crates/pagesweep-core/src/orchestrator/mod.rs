//! Run orchestrator: processes collections one after another, scanning before
//! downloading, renewing the session whenever the scanner or reconciler
//! reports an authorization failure.
//!
//! A fatal error in one collection is logged and recorded after a best-effort
//! save of that collection's index; the next collection still runs.

use anyhow::{Context, Result};
use std::fmt;
use std::str::FromStr;

use crate::collection::Collection;
use crate::config::SweepConfig;
use crate::index::{Index, IndexStore};
use crate::reconciler::{DownloadReconciler, ReconcileStop, ReconcileSummary};
use crate::scanner::{PageScanner, ScanReport, ScanStop};
use crate::session::SessionProvider;

/// Which phases to run for each collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Scan,
    Download,
    /// Scan, then download.
    Sync,
}

impl RunMode {
    pub fn scans(self) -> bool {
        matches!(self, RunMode::Scan | RunMode::Sync)
    }

    pub fn downloads(self) -> bool {
        matches!(self, RunMode::Download | RunMode::Sync)
    }
}

impl FromStr for RunMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "scan" => Ok(RunMode::Scan),
            "2" | "download" => Ok(RunMode::Download),
            "3" | "sync" | "both" => Ok(RunMode::Sync),
            other => anyhow::bail!("unknown mode: {other:?} (expected scan, download or sync)"),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunMode::Scan => "scan",
            RunMode::Download => "download",
            RunMode::Sync => "sync",
        })
    }
}

/// What happened to one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionReport {
    pub collection: u32,
    pub scan: Option<ScanReport>,
    pub download: Option<ReconcileSummary>,
    /// Sessions acquired (1 + renewals).
    pub sessions: u32,
}

#[derive(Debug)]
pub struct CollectionOutcome {
    pub collection: u32,
    pub result: Result<CollectionReport>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<CollectionOutcome>,
}

impl RunReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

pub struct Orchestrator<'a, P: SessionProvider> {
    cfg: &'a SweepConfig,
    provider: P,
}

impl<'a, P: SessionProvider> Orchestrator<'a, P> {
    pub fn new(cfg: &'a SweepConfig, provider: P) -> Self {
        Self { cfg, provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Process `collections` strictly in order.
    pub async fn run(&mut self, collections: &[Collection], mode: RunMode) -> RunReport {
        let mut report = RunReport::default();
        for c in collections {
            tracing::info!(collection = c.id, %mode, "collection start");
            let result = self.run_collection(c, mode).await;
            match &result {
                Ok(r) => tracing::info!(
                    collection = c.id,
                    sessions = r.sessions,
                    "collection done"
                ),
                Err(e) => tracing::error!(collection = c.id, "collection failed: {e:#}"),
            }
            report.outcomes.push(CollectionOutcome {
                collection: c.id,
                result,
            });
        }
        report
    }

    async fn run_collection(&mut self, c: &Collection, mode: RunMode) -> Result<CollectionReport> {
        std::fs::create_dir_all(&c.out_dir)
            .with_context(|| format!("create output dir: {}", c.out_dir.display()))?;
        let store = IndexStore::new(&c.index_path, c.id);
        let mut index = store.load()?;
        tracing::info!(
            collection = c.id,
            files = index.len(),
            last_scan_page = index.meta.last_scan_page,
            "index loaded"
        );

        let mut report = CollectionReport {
            collection: c.id,
            scan: None,
            download: None,
            sessions: 0,
        };
        match self.process(c, mode, &store, &mut index, &mut report).await {
            Ok(()) => {
                store.save(&index)?;
                Ok(report)
            }
            Err(e) => {
                if let Err(save_err) = store.save(&index) {
                    tracing::error!(collection = c.id, "final index save failed: {save_err:#}");
                }
                Err(e)
            }
        }
    }

    async fn process(
        &mut self,
        c: &Collection,
        mode: RunMode,
        store: &IndexStore,
        index: &mut Index,
        report: &mut CollectionReport,
    ) -> Result<()> {
        let cfg = self.cfg;
        let mut session = self.acquire(c, report).await?;

        if mode.scans() {
            let mut scanner = PageScanner::new(c, &cfg.scan, store);
            let stop = loop {
                match scanner.scan(&session, index).await? {
                    ScanStop::AuthExpired { page } => {
                        tracing::info!(collection = c.id, page, "renewing session for scan");
                        drop(session);
                        session = self.acquire(c, report).await?;
                    }
                    stop => break stop,
                }
            };
            let scan = scanner.report(stop);
            tracing::info!(
                collection = c.id,
                pages = scan.pages_scanned,
                new_files = scan.new_files,
                total = index.len(),
                "scan complete"
            );
            report.scan = Some(scan);
        }

        if mode.downloads() {
            let mut reconciler = DownloadReconciler::new(c, &cfg.download, store);
            loop {
                match reconciler.run(&session, index).await? {
                    ReconcileStop::Finished => break,
                    ReconcileStop::AuthExpired { filename } => {
                        tracing::info!(collection = c.id, file = %filename, "renewing session for downloads");
                        drop(session);
                        session = self.acquire(c, report).await?;
                    }
                }
            }
            let s = reconciler.summary();
            tracing::info!(
                collection = c.id,
                downloaded = s.downloaded,
                marked_present = s.marked_present,
                failed = s.failed,
                exhausted = s.exhausted,
                "downloads complete"
            );
            report.download = Some(s);
        }

        Ok(())
    }

    async fn acquire(&mut self, c: &Collection, report: &mut CollectionReport) -> Result<P::Session> {
        let session = self
            .provider
            .acquire(c)
            .await
            .with_context(|| format!("collection {}: acquire session", c.id))?;
        report.sessions += 1;
        Ok(session)
    }
}
