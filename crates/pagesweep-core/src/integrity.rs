//! Operator-triggered content hashes.
//!
//! Downloads never hash; `backfill_hashes` fills the `hash` field of
//! downloaded records from the files on disk. Nothing is verified against it.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::collection::Collection;
use crate::index::{Index, IndexStore};

const CHUNK: usize = 64 * 1024;

/// Lowercase hex SHA-256 of the file at `path`, read in fixed-size chunks.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashReport {
    pub hashed: usize,
    pub already_hashed: usize,
    /// Marked downloaded but absent on disk.
    pub missing_local: usize,
}

/// Record hashes for downloaded records that have none. The index is saved
/// after each newly hashed file.
pub fn backfill_hashes(c: &Collection, store: &IndexStore, index: &mut Index) -> Result<HashReport> {
    let mut report = HashReport::default();
    let names: Vec<String> = index
        .files
        .iter()
        .filter(|(name, rec)| rec.downloaded && c.filter.is_tracked(name))
        .map(|(name, _)| name.clone())
        .collect();

    for name in names {
        let path = c.file_path(&name);
        let Some(rec) = index.get_mut(&name) else {
            continue;
        };
        if rec.hash.is_some() {
            report.already_hashed += 1;
            continue;
        }
        if !path.is_file() {
            tracing::warn!(collection = c.id, file = %name, "marked downloaded but missing locally");
            report.missing_local += 1;
            continue;
        }
        let digest = sha256_file(&path)?;
        tracing::debug!(collection = c.id, file = %name, sha256 = %digest, "hashed");
        rec.hash = Some(digest);
        store.save(index)?;
        report.hashed += 1;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectionConfig;

    #[test]
    fn sha256_of_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty");
        std::fs::write(&empty, b"").unwrap();
        assert_eq!(
            sha256_file(&empty).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        let hello = dir.path().join("hello");
        std::fs::write(&hello, b"hello\n").unwrap();
        assert_eq!(
            sha256_file(&hello).unwrap(),
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
    }

    #[test]
    fn backfill_only_touches_downloaded_without_hash() {
        let dir = tempfile::tempdir().unwrap();
        let c = Collection::from_config(&CollectionConfig::disclosure_dataset(4), dir.path()).unwrap();
        std::fs::create_dir_all(&c.out_dir).unwrap();
        let store = IndexStore::new(&c.index_path, c.id);
        let mut index = Index::new(c.id);
        for n in 1..=4 {
            index.upsert(&format!("EFTA0000000{n}.pdf"), "u", 1);
        }
        std::fs::write(c.file_path("EFTA00000001.pdf"), b"hello\n").unwrap();
        index.get_mut("EFTA00000001.pdf").unwrap().mark_downloaded(Some(6));
        index.get_mut("EFTA00000002.pdf").unwrap().mark_downloaded(Some(1));
        {
            let r = index.get_mut("EFTA00000003.pdf").unwrap();
            r.mark_downloaded(Some(1));
            r.hash = Some("abc".into());
        }

        let report = backfill_hashes(&c, &store, &mut index).unwrap();
        assert_eq!(
            report,
            HashReport {
                hashed: 1,
                already_hashed: 1,
                missing_local: 1,
            }
        );
        assert_eq!(
            index.get("EFTA00000001.pdf").unwrap().hash.as_deref(),
            Some("5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03")
        );
        assert!(index.get("EFTA00000004.pdf").unwrap().hash.is_none());
        assert_eq!(store.load().unwrap(), index);
    }
}
