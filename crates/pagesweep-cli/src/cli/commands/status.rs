//! `pagesweep status`: index counts and scan position per collection.

use anyhow::Result;
use pagesweep_core::config::SweepConfig;
use pagesweep_core::index::IndexStore;
use pagesweep_core::resume::ResumeTracker;

use super::{collections_for, selected_ids};

pub fn run_status(cfg: &SweepConfig, selection: Option<&str>) -> Result<()> {
    let ids = selected_ids(cfg, selection)?;
    println!(
        "{:<5} {:<8} {:<10} {:<8} {:<10} {:<10} {:<7} {}",
        "ID", "FILES", "DOWNLOADED", "PENDING", "EXHAUSTED", "LAST_PAGE", "RESUME", "DIR"
    );
    for c in collections_for(cfg, &ids)? {
        let index = match IndexStore::new(&c.index_path, c.id).load() {
            Ok(i) => i,
            Err(e) => {
                println!("{:<5} error: {}", c.id, e);
                continue;
            }
        };
        let stats = index.stats(&c.filter, cfg.download.max_attempts);
        let resume = ResumeTracker::new(&c.state_path)
            .load()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<5} {:<8} {:<10} {:<8} {:<10} {:<10} {:<7} {}",
            c.id,
            stats.tracked,
            stats.downloaded,
            stats.pending,
            stats.exhausted,
            index.meta.last_scan_page,
            resume,
            c.out_dir.display()
        );
    }
    Ok(())
}
