//! File lifecycle on disk.
//!
//! Every durable artifact (downloaded file, index document, resume marker) is
//! written to a sibling temp path, synced, and renamed over its final name so a
//! reader never observes a partial write. At most one orphaned temp file can
//! exist per destination after an interrupt; it is discarded before the next
//! write to that destination.

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix for in-flight downloads.
pub const PART_SUFFIX: &str = ".part";

/// Suffix for in-flight state documents (index, resume marker).
pub const TMP_SUFFIX: &str = ".tmp";

/// Appends `suffix` to the final path (e.g. `EFTA01.pdf` → `EFTA01.pdf.part`).
pub fn sibling_path(final_path: &Path, suffix: impl AsRef<OsStr>) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(suffix);
    PathBuf::from(o)
}

/// Path for an in-flight download of `final_path`.
pub fn part_path(final_path: &Path) -> PathBuf {
    sibling_path(final_path, PART_SUFFIX)
}

/// Removes a leftover temp file from an interrupted write. Returns true if one was removed.
pub fn discard_stale(temp_path: &Path) -> Result<bool> {
    match std::fs::remove_file(temp_path) {
        Ok(()) => {
            tracing::debug!(path = %temp_path.display(), "discarded stale temp file");
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("remove stale temp file: {}", temp_path.display())),
    }
}

/// Writes `data` to `temp_path`, syncs it, then renames it over `final_path`.
/// Both paths must be on the same filesystem.
pub fn write_via(temp_path: &Path, final_path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = final_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
    }
    {
        let mut f = File::create(temp_path)
            .with_context(|| format!("create temp file: {}", temp_path.display()))?;
        f.write_all(data)
            .with_context(|| format!("write temp file: {}", temp_path.display()))?;
        f.sync_all()
            .with_context(|| format!("sync temp file: {}", temp_path.display()))?;
    }
    std::fs::rename(temp_path, final_path).with_context(|| {
        format!(
            "failed to rename {} to {}",
            temp_path.display(),
            final_path.display()
        )
    })?;
    Ok(())
}

/// Atomically replaces a small state document using a `.tmp` sibling.
pub fn write_atomic(final_path: &Path, data: &[u8]) -> Result<()> {
    write_via(&sibling_path(final_path, TMP_SUFFIX), final_path, data)
}
