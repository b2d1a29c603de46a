//! Resume marker: the next listing page to scan for a collection, kept in a
//! small text file independent of the index so that losing either one does not
//! lose the scan position.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::storage;

#[derive(Debug, Clone)]
pub struct ResumeTracker {
    path: PathBuf,
}

impl ResumeTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the marker. Missing, unreadable, non-numeric or zero contents mean "no marker".
    pub fn load(&self) -> Option<u32> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "cannot read resume marker: {e}");
                return None;
            }
        };
        match raw.trim().parse::<u32>() {
            Ok(page) if page >= 1 => Some(page),
            _ => {
                tracing::warn!(path = %self.path.display(), contents = raw.trim(), "ignoring invalid resume marker");
                None
            }
        }
    }

    /// Persist `page` as the next page to scan.
    pub fn save(&self, page: u32) -> Result<()> {
        storage::write_atomic(&self.path, page.to_string().as_bytes())
            .with_context(|| format!("save resume marker: {}", self.path.display()))
    }
}
