//! `pagesweep reset`: give exhausted and failed files a fresh attempt budget.

use anyhow::Result;
use pagesweep_core::config::SweepConfig;
use pagesweep_core::index::IndexStore;

use super::{collections_for, selected_ids};

pub fn run_reset(cfg: &SweepConfig, selection: Option<&str>) -> Result<()> {
    let ids = selected_ids(cfg, selection)?;
    for c in collections_for(cfg, &ids)? {
        let store = IndexStore::new(&c.index_path, c.id);
        let mut index = store.load()?;
        let n = index.reset_failures();
        if n > 0 {
            store.save(&index)?;
        }
        tracing::info!(collection = c.id, reset = n, "attempt history cleared");
        println!("collection {}: reset {} file(s)", c.id, n);
    }
    Ok(())
}
