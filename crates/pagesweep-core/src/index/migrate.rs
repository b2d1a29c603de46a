//! In-memory migration of older index document shapes to the current schema.
//!
//! Version 2 is the legacy shape: `meta.dataset`, `meta.version`,
//! `files.*.sha256`, with keys possibly missing. Documents without any version
//! field are read as version 2.

use chrono::NaiveDateTime;
use serde_json::{Map, Value};

use super::types::SCHEMA_VERSION;

const LEGACY_VERSION: u64 = 2;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum MigrateError {
    /// Written by a newer release; must not be touched.
    Unsupported(u64),
    /// Structurally unusable; caller quarantines it.
    Malformed(String),
}

/// Declared schema version of a raw document.
pub(crate) fn document_version(doc: &Value) -> Result<u64, MigrateError> {
    let Some(meta) = doc.get("meta") else {
        return Ok(LEGACY_VERSION);
    };
    match meta.get("schema_version").or_else(|| meta.get("version")) {
        None | Some(Value::Null) => Ok(LEGACY_VERSION),
        Some(v) => v
            .as_u64()
            .ok_or_else(|| MigrateError::Malformed(format!("non-integer schema version: {v}"))),
    }
}

/// Bring `doc` up to [`SCHEMA_VERSION`]. `collection` fills a missing collection id.
pub(crate) fn migrate(
    mut doc: Value,
    collection: u32,
    now: NaiveDateTime,
) -> Result<Value, MigrateError> {
    if !doc.is_object() {
        return Err(MigrateError::Malformed("document is not an object".into()));
    }
    let version = document_version(&doc)?;
    if version > u64::from(SCHEMA_VERSION) {
        return Err(MigrateError::Unsupported(version));
    }
    if version <= LEGACY_VERSION {
        doc = legacy_to_v3(doc, collection, now)?;
    }
    Ok(doc)
}

fn legacy_to_v3(doc: Value, collection: u32, now: NaiveDateTime) -> Result<Value, MigrateError> {
    let Value::Object(mut root) = doc else {
        return Err(MigrateError::Malformed("document is not an object".into()));
    };
    let stamp = Value::String(now.format(TIMESTAMP_FORMAT).to_string());

    let mut meta = match root.remove("meta") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(m)) => m,
        Some(_) => return Err(MigrateError::Malformed("meta is not an object".into())),
    };
    let legacy_id = meta.remove("dataset");
    if !meta.contains_key("collection") {
        let id = legacy_id
            .filter(Value::is_u64)
            .unwrap_or_else(|| Value::from(collection));
        meta.insert("collection".into(), id);
    }
    meta.remove("version");
    meta.insert("schema_version".into(), Value::from(SCHEMA_VERSION));
    default_key(&mut meta, "created_at", stamp.clone());
    default_key(&mut meta, "last_scan_at", Value::Null);
    if !meta.get("last_scan_page").is_some_and(Value::is_u64) {
        meta.insert("last_scan_page".into(), Value::from(0u32));
    }

    let mut files = match root.remove("files") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(m)) => m,
        Some(_) => return Err(MigrateError::Malformed("files is not an object".into())),
    };
    for (name, entry) in files.iter_mut() {
        let Value::Object(rec) = entry else {
            return Err(MigrateError::Malformed(format!("record {name} is not an object")));
        };
        if let Some(sha) = rec.remove("sha256") {
            default_key(rec, "hash", sha);
        }
        default_key(rec, "first_seen", stamp.clone());
        default_key(rec, "last_seen", stamp.clone());
        if !rec.get("page").is_some_and(Value::is_u64) {
            rec.insert("page".into(), Value::from(0u32));
        }
        if !rec.get("attempts").is_some_and(Value::is_u64) {
            rec.insert("attempts".into(), Value::from(0u32));
        }
    }

    root.insert("meta".into(), Value::Object(meta));
    root.insert("files".into(), Value::Object(files));
    Ok(Value::Object(root))
}

fn default_key(map: &mut Map<String, Value>, key: &str, value: Value) {
    if map.get(key).map_or(true, Value::is_null) {
        map.insert(key.to_string(), value);
    }
}
