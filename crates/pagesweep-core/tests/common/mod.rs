//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod fake_site;
pub mod site_server;

use pagesweep_core::config::{CollectionConfig, SweepConfig};

pub fn file_name(id: u32) -> String {
    format!("EFTA{id:08}.pdf")
}

/// Collection `id` served from `base` (e.g. "https://archive.test/").
pub fn collection_config(id: u32, base: &str) -> CollectionConfig {
    let base = base.trim_end_matches('/');
    CollectionConfig {
        id,
        listing_url: format!("{base}/list{id}?page={{page}}"),
        base_url: base.to_string(),
        out_dir: format!("data{id}").into(),
        index_file: format!("index_data{id}.json"),
        state_file: format!("resume_data{id}.txt").into(),
        file_segment: "/files/".into(),
        extension: "pdf".into(),
        file_prefix: "EFTA".into(),
    }
}

/// Config with every pause disabled.
pub fn sweep_config(collections: Vec<CollectionConfig>) -> SweepConfig {
    let mut cfg = SweepConfig {
        collections,
        ..SweepConfig::default()
    };
    cfg.scan.page_delay_secs = 0.0;
    cfg.download.delay_secs = 0.0;
    cfg.download.fetch_timeout_secs = 10;
    cfg
}
