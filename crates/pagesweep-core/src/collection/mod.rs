//! Runtime view of one configured collection: resolved paths, listing URLs,
//! and the link filter used by the scanner and reconciler.

mod filter;
mod select;

pub use filter::{Candidate, LinkFilter};
pub use select::parse_selection;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use url::Url;

use crate::config::CollectionConfig;

const PAGE_PLACEHOLDER: &str = "{page}";

/// A collection with every path resolved against the working directory.
#[derive(Debug, Clone)]
pub struct Collection {
    pub id: u32,
    listing_url: String,
    base_url: Url,
    pub out_dir: PathBuf,
    pub index_path: PathBuf,
    pub state_path: PathBuf,
    pub filter: LinkFilter,
}

impl Collection {
    pub fn from_config(cfg: &CollectionConfig, root: &Path) -> Result<Self> {
        if !cfg.listing_url.contains(PAGE_PLACEHOLDER) {
            anyhow::bail!(
                "collection {}: listing_url must contain {}",
                cfg.id,
                PAGE_PLACEHOLDER
            );
        }
        let base_url = Url::parse(&cfg.base_url)
            .with_context(|| format!("collection {}: invalid base_url", cfg.id))?;
        let out_dir = root.join(&cfg.out_dir);
        Ok(Self {
            id: cfg.id,
            listing_url: cfg.listing_url.clone(),
            base_url,
            index_path: out_dir.join(&cfg.index_file),
            out_dir,
            state_path: root.join(&cfg.state_file),
            filter: LinkFilter::new(&cfg.file_segment, &cfg.extension, &cfg.file_prefix)?,
        })
    }

    /// Listing page URL for `page`.
    pub fn page_url(&self, page: u32) -> String {
        self.listing_url.replace(PAGE_PLACEHOLDER, &page.to_string())
    }

    /// Referer sent when fetching a file discovered on `page` (page 1 when unknown).
    pub fn referer_for(&self, page: u32) -> String {
        self.page_url(page.max(1))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a raw listing href into a tracked-file candidate.
    pub fn candidate(&self, href: &str) -> Option<Candidate> {
        self.filter.candidate(&self.base_url, href)
    }

    /// Local destination for a tracked filename.
    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.out_dir.join(filename)
    }
}
