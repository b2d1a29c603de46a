//! Link filter: which listing hrefs name a tracked file.

use anyhow::{Context, Result};
use regex::Regex;
use url::Url;

/// A file reference extracted from a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub filename: String,
    pub url: String,
}

/// Accepts hrefs whose resolved path contains the collection's file segment and
/// ends with its extension, and whose filename is `<prefix><digits>.<ext>`.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    segment: String,
    suffix: String,
    name_pattern: Regex,
}

impl LinkFilter {
    pub fn new(file_segment: &str, extension: &str, file_prefix: &str) -> Result<Self> {
        let extension = extension.trim_start_matches('.');
        let pattern = format!(
            r"(?i)^{}0*(\d+)\.{}$",
            regex::escape(file_prefix),
            regex::escape(extension)
        );
        let name_pattern =
            Regex::new(&pattern).with_context(|| format!("invalid filename pattern: {pattern}"))?;
        Ok(Self {
            segment: file_segment.to_ascii_lowercase(),
            suffix: format!(".{}", extension.to_ascii_lowercase()),
            name_pattern,
        })
    }

    /// True if the URL path matches the collection's path/suffix convention.
    pub fn accepts_url(&self, url: &Url) -> bool {
        let path = url.path().to_ascii_lowercase();
        path.contains(&self.segment) && path.ends_with(&self.suffix)
    }

    /// Numeric identifier of a tracked filename, or None if the name does not follow the convention.
    pub fn file_number(&self, filename: &str) -> Option<u64> {
        let caps = self.name_pattern.captures(filename)?;
        caps.get(1)?.as_str().parse().ok()
    }

    pub fn is_tracked(&self, filename: &str) -> bool {
        self.file_number(filename).is_some()
    }

    /// Ordering key: numeric identifier first, lexical fallback for anything else.
    pub fn sort_key<'a>(&self, filename: &'a str) -> (u64, &'a str) {
        (self.file_number(filename).unwrap_or(u64::MAX), filename)
    }

    /// Resolve `href` against `base` and keep it only if it names a tracked file.
    pub fn candidate(&self, base: &Url, href: &str) -> Option<Candidate> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        let url = base.join(href).ok()?;
        if !self.accepts_url(&url) {
            return None;
        }
        let filename = url.path_segments()?.filter(|s| !s.is_empty()).last()?.to_string();
        if !self.is_tracked(&filename) {
            return None;
        }
        Some(Candidate {
            filename,
            url: url.to_string(),
        })
    }
}
