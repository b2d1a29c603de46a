//! Load/save of the index document with quarantine of unreadable files.

use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};

use super::migrate::{self, MigrateError};
use super::types::{now, Index, SCHEMA_VERSION};
use crate::storage;

/// Index load failures the caller cannot recover from by starting fresh.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("read index {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "index {} has schema version {found}; this build supports up to {supported}",
        .path.display(),
        supported = SCHEMA_VERSION
    )]
    UnsupportedVersion { path: PathBuf, found: u64 },
}

/// Where a corrupt index is moved: `<path>.corrupt-<timestamp>`.
pub fn quarantine_path(path: &Path) -> PathBuf {
    let suffix = format!(".corrupt-{}", now().format("%Y%m%dT%H%M%S"));
    storage::sibling_path(path, suffix)
}

/// Index document location for one collection.
#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
    collection: u32,
}

impl IndexStore {
    pub fn new(path: impl Into<PathBuf>, collection: u32) -> Self {
        Self {
            path: path.into(),
            collection,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the index. A missing file yields an empty index; malformed content
    /// is quarantined and an empty index is returned in its place.
    pub fn load(&self) -> Result<Index, IndexError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(collection = self.collection, path = %self.path.display(), "no index yet; starting empty");
                return Ok(Index::new(self.collection));
            }
            Err(source) => {
                return Err(IndexError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let doc: serde_json::Value = match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(e) => return Ok(self.quarantine(&e.to_string())),
        };
        let doc = match migrate::migrate(doc, self.collection, now()) {
            Ok(v) => v,
            Err(MigrateError::Unsupported(found)) => {
                return Err(IndexError::UnsupportedVersion {
                    path: self.path.clone(),
                    found,
                })
            }
            Err(MigrateError::Malformed(reason)) => return Ok(self.quarantine(&reason)),
        };
        let index: Index = match serde_json::from_value(doc) {
            Ok(i) => i,
            Err(e) => return Ok(self.quarantine(&e.to_string())),
        };

        if index.meta.collection != self.collection {
            tracing::warn!(
                collection = self.collection,
                found = index.meta.collection,
                path = %self.path.display(),
                "index belongs to a different collection id"
            );
        }
        tracing::debug!(collection = self.collection, files = index.len(), "index loaded");
        Ok(index)
    }

    /// Atomically replace the index document (`<path>.tmp` then rename).
    pub fn save(&self, index: &Index) -> Result<()> {
        let json = serde_json::to_vec_pretty(index).context("serialize index")?;
        storage::write_atomic(&self.path, &json)
            .with_context(|| format!("save index: {}", self.path.display()))
    }

    fn quarantine(&self, reason: &str) -> Index {
        let bad = quarantine_path(&self.path);
        match std::fs::rename(&self.path, &bad) {
            Ok(()) => tracing::warn!(
                collection = self.collection,
                moved_to = %bad.display(),
                "index unreadable ({reason}); quarantined and starting fresh"
            ),
            Err(e) => tracing::warn!(
                collection = self.collection,
                path = %self.path.display(),
                "index unreadable ({reason}) and could not be moved aside ({e}); starting fresh"
            ),
        }
        Index::new(self.collection)
    }
}
