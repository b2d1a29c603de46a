//! Index document types.

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::collection::LinkFilter;

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u32 = 3;

/// Local wall-clock time truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// Collection-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub collection: u32,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub last_scan_at: Option<NaiveDateTime>,
    /// Last listing page fully processed (0 = never scanned).
    #[serde(default)]
    pub last_scan_page: u32,
    pub schema_version: u32,
}

/// Tracked metadata for one remote file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub url: String,
    pub first_seen: NaiveDateTime,
    pub last_seen: NaiveDateTime,
    /// Listing page the file was last seen on.
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub downloaded: bool,
    #[serde(default)]
    pub downloaded_at: Option<NaiveDateTime>,
    /// Content hash, recorded only by the operator-triggered backfill.
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub bytes: Option<u64>,
    /// Network attempts, incremented before each fetch.
    #[serde(default)]
    pub attempts: u32,
    /// Attempts that ended in an authorization failure; these do not count against the budget.
    #[serde(default)]
    pub auth_retries: u32,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl FileRecord {
    pub fn new(url: &str, page: u32, seen_at: NaiveDateTime) -> Self {
        Self {
            url: url.to_string(),
            first_seen: seen_at,
            last_seen: seen_at,
            page,
            downloaded: false,
            downloaded_at: None,
            hash: None,
            bytes: None,
            attempts: 0,
            auth_retries: 0,
            last_error: None,
        }
    }

    /// Attempts charged against the retry budget.
    pub fn budget_used(&self) -> u32 {
        self.attempts.saturating_sub(self.auth_retries)
    }

    pub fn is_exhausted(&self, max_attempts: u32) -> bool {
        !self.downloaded && self.budget_used() >= max_attempts
    }

    pub fn mark_downloaded(&mut self, bytes: Option<u64>) {
        self.downloaded = true;
        self.downloaded_at = Some(now());
        self.bytes = bytes;
        self.last_error = None;
    }

    /// Operator reset: clears the attempt history of a file that is not downloaded.
    /// Returns true if anything changed.
    pub fn reset_failures(&mut self) -> bool {
        if self.downloaded || (self.attempts == 0 && self.last_error.is_none()) {
            return false;
        }
        self.attempts = 0;
        self.auth_retries = 0;
        self.last_error = None;
        true
    }
}

/// Summary counts for `status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Records whose filename follows the collection's convention.
    pub tracked: usize,
    pub downloaded: usize,
    /// Not downloaded, budget left.
    pub pending: usize,
    /// Not downloaded, budget spent.
    pub exhausted: usize,
    /// Records ignored by the naming filter.
    pub ignored: usize,
}

/// Per-collection index document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub meta: IndexMeta,
    #[serde(default)]
    pub files: BTreeMap<String, FileRecord>,
}

impl Index {
    pub fn new(collection: u32) -> Self {
        Self {
            meta: IndexMeta {
                collection,
                created_at: now(),
                last_scan_at: None,
                last_scan_page: 0,
                schema_version: SCHEMA_VERSION,
            },
            files: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, filename: &str) -> Option<&FileRecord> {
        self.files.get(filename)
    }

    pub fn get_mut(&mut self, filename: &str) -> Option<&mut FileRecord> {
        self.files.get_mut(filename)
    }

    /// Insert or refresh a listing observation. Returns true if the file was never seen before.
    ///
    /// Existing records keep their download status, attempts and error fields;
    /// only URL, last-seen and page are refreshed, so rescanning is idempotent.
    pub fn upsert(&mut self, filename: &str, url: &str, page: u32) -> bool {
        let seen_at = now();
        match self.files.get_mut(filename) {
            Some(rec) => {
                rec.url = url.to_string();
                rec.last_seen = seen_at;
                rec.page = page;
                false
            }
            None => {
                self.files
                    .insert(filename.to_string(), FileRecord::new(url, page, seen_at));
                true
            }
        }
    }

    /// Record that `page` was fully processed.
    pub fn record_scan(&mut self, page: u32) {
        self.meta.last_scan_at = Some(now());
        self.meta.last_scan_page = page;
    }

    /// Clear attempt history for every record that is not downloaded. Returns how many changed.
    pub fn reset_failures(&mut self) -> usize {
        self.files
            .values_mut()
            .map(FileRecord::reset_failures)
            .filter(|changed| *changed)
            .count()
    }

    pub fn stats(&self, filter: &LinkFilter, max_attempts: u32) -> IndexStats {
        let mut stats = IndexStats::default();
        for (name, rec) in &self.files {
            if !filter.is_tracked(name) {
                stats.ignored += 1;
                continue;
            }
            stats.tracked += 1;
            if rec.downloaded {
                stats.downloaded += 1;
            } else if rec.is_exhausted(max_attempts) {
                stats.exhausted += 1;
            } else {
                stats.pending += 1;
            }
        }
        stats
    }
}
