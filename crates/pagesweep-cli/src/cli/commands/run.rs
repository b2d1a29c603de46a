//! `pagesweep run`: scan and/or download the selected collections.

use anyhow::Result;
use pagesweep_core::config::SweepConfig;
use pagesweep_core::orchestrator::{Orchestrator, RunMode, RunReport};
use pagesweep_core::scanner::ScanStop;
use pagesweep_core::session::PromptSessionProvider;

use super::prompt::{ask_collections, ask_mode};
use super::{collections_for, join_ids, selected_ids};

pub async fn run_sweep(
    cfg: &SweepConfig,
    selection: Option<&str>,
    mode: Option<RunMode>,
) -> Result<()> {
    let ids = match selection {
        Some(raw) => selected_ids(cfg, Some(raw))?,
        None => ask_collections(&cfg.collection_ids())?,
    };
    let mode = match mode {
        Some(m) => m,
        None => ask_mode()?,
    };
    let collections = collections_for(cfg, &ids)?;

    println!("Running collections {} in {} mode", join_ids(&ids), mode);
    tracing::info!(collections = %join_ids(&ids), %mode, "run start");

    let mut orch = Orchestrator::new(cfg, PromptSessionProvider::new(cfg));
    let report = orch.run(&collections, mode).await;
    print_summary(&report);

    match report.failures() {
        0 => Ok(()),
        n => anyhow::bail!("{n} of {} collections failed; see the log for details", report.outcomes.len()),
    }
}

fn print_summary(report: &RunReport) {
    println!();
    println!(
        "{:<5} {:<10} {:<8} {:<10} {:<8} {:<8} {}",
        "ID", "LAST_PAGE", "NEW", "FETCHED", "MARKED", "FAILED", "RESULT"
    );
    for o in &report.outcomes {
        match &o.result {
            Ok(r) => {
                let (last_page, new) = r
                    .scan
                    .map(|s| (last_page(&s.stop).to_string(), s.new_files.to_string()))
                    .unwrap_or_else(|| ("-".into(), "-".into()));
                let (fetched, marked, failed) = r
                    .download
                    .map(|d| {
                        (
                            d.downloaded.to_string(),
                            d.marked_present.to_string(),
                            d.failed.to_string(),
                        )
                    })
                    .unwrap_or_else(|| ("-".into(), "-".into(), "-".into()));
                println!(
                    "{:<5} {:<10} {:<8} {:<10} {:<8} {:<8} ok",
                    o.collection, last_page, new, fetched, marked, failed
                );
            }
            Err(e) => println!("{:<5} error: {:#}", o.collection, e),
        }
    }
}

fn last_page(stop: &ScanStop) -> u32 {
    match *stop {
        ScanStop::Exhausted { page, .. } | ScanStop::HardCap { page } | ScanStop::AuthExpired { page } => page,
    }
}
