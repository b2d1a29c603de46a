//! CLI command handlers, one file per command.

mod hash;
mod prompt;
mod reset;
mod run;
mod status;

pub use hash::run_hash;
pub use reset::run_reset;
pub use run::run_sweep;
pub use status::run_status;

use anyhow::{Context, Result};
use pagesweep_core::collection::{parse_selection, Collection};
use pagesweep_core::config::SweepConfig;

/// Ids named by `raw`, or every configured id when `raw` is None.
pub(crate) fn selected_ids(cfg: &SweepConfig, raw: Option<&str>) -> Result<Vec<u32>> {
    let available = cfg.collection_ids();
    let ids = match raw {
        Some(raw) => parse_selection(raw, &available),
        None => available.clone(),
    };
    if ids.is_empty() {
        anyhow::bail!(
            "no valid collections selected (configured: {})",
            join_ids(&available)
        );
    }
    Ok(ids)
}

/// Resolve configured collections against the working directory.
pub(crate) fn collections_for(cfg: &SweepConfig, ids: &[u32]) -> Result<Vec<Collection>> {
    let root = std::env::current_dir().context("resolve working directory")?;
    ids.iter()
        .map(|id| {
            let c = cfg
                .collection(*id)
                .with_context(|| format!("collection {id} is not configured"))?;
            Collection::from_config(c, &root)
        })
        .collect()
}

pub(crate) fn join_ids(ids: &[u32]) -> String {
    ids.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
}
