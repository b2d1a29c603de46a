//! Per-collection file index: the durable record of every file ever listed.
//!
//! The index is a single JSON document (`meta` + `files`) rewritten via
//! temp-file-plus-rename after every mutation that matters for resume. Older
//! document shapes are migrated in memory on load; unreadable documents are
//! quarantined beside their path and replaced by an empty index.

mod migrate;
mod store;
mod types;

pub use store::{quarantine_path, IndexError, IndexStore};
pub use types::{now, FileRecord, Index, IndexMeta, IndexStats, SCHEMA_VERSION};
