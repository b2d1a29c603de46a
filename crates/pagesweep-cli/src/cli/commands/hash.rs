//! `pagesweep hash`: record SHA-256 of downloaded files that have no hash yet.

use anyhow::{Context, Result};
use pagesweep_core::config::SweepConfig;
use pagesweep_core::index::IndexStore;
use pagesweep_core::integrity;

use super::{collections_for, selected_ids};

pub async fn run_hash(cfg: &SweepConfig, selection: Option<&str>) -> Result<()> {
    let ids = selected_ids(cfg, selection)?;
    for c in collections_for(cfg, &ids)? {
        let report = tokio::task::spawn_blocking(move || -> Result<_> {
            let store = IndexStore::new(&c.index_path, c.id);
            let mut index = store.load()?;
            integrity::backfill_hashes(&c, &store, &mut index)
                .with_context(|| format!("collection {}: hash backfill", c.id))
                .map(|r| (c.id, r))
        })
        .await
        .context("hash task join")??;
        let (id, r) = report;
        println!(
            "collection {}: hashed {}, already hashed {}, missing locally {}",
            id, r.hashed, r.already_hashed, r.missing_local
        );
    }
    Ok(())
}
