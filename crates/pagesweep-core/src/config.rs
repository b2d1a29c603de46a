use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Page scanning parameters (`[scan]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Stop after this many consecutive pages contribute no new files.
    pub no_new_page_threshold: u32,
    /// Safety valve: never scan past this page number.
    pub hard_page_cap: u32,
    /// Pause between consecutive listing pages, in seconds.
    pub page_delay_secs: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            no_new_page_threshold: 6,
            hard_page_cap: 200_000,
            page_delay_secs: 1.5,
        }
    }
}

impl ScanConfig {
    pub fn page_delay(&self) -> Duration {
        secs_to_duration(self.page_delay_secs)
    }
}

/// Download parameters (`[download]` in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Maximum number of attempts per file across all runs (including the first).
    pub max_attempts: u32,
    /// Pause after each download attempt, in seconds.
    pub delay_secs: f64,
    /// Upper bound for a single fetch (listing page or file), in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 0.75,
            fetch_timeout_secs: 180,
        }
    }
}

impl DownloadConfig {
    pub fn delay(&self) -> Duration {
        secs_to_duration(self.delay_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Session parameters (`[session]` in config.toml).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// File holding a `Cookie` header value, used for the first session of a run.
    pub cookie_file: Option<PathBuf>,
    /// User-Agent sent with every request (library default when unset).
    pub user_agent: Option<String>,
}

/// One paginated inventory (`[[collections]]` in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Numeric identifier used for selection on the command line.
    pub id: u32,
    /// Listing page URL; `{page}` is replaced by the page number.
    pub listing_url: String,
    /// Site root used to resolve relative hrefs found on listing pages.
    pub base_url: String,
    /// Output directory for downloaded files (relative paths resolve against the working dir).
    pub out_dir: PathBuf,
    /// Index document filename, stored inside `out_dir`.
    pub index_file: String,
    /// Resume marker path (relative paths resolve against the working dir).
    pub state_file: PathBuf,
    /// Path segment a file URL must contain.
    #[serde(default = "default_file_segment")]
    pub file_segment: String,
    /// Extension a file URL must end with (without the dot).
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Filename prefix preceding the numeric identifier.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_file_segment() -> String {
    "/epstein/files/".to_string()
}

fn default_extension() -> String {
    "pdf".to_string()
}

fn default_file_prefix() -> String {
    "EFTA".to_string()
}

const DEFAULT_SITE: &str = "https://www.justice.gov";

impl CollectionConfig {
    /// Collection layout used by the public disclosure site for data set `n`.
    pub fn disclosure_dataset(n: u32) -> Self {
        Self {
            id: n,
            listing_url: format!(
                "{DEFAULT_SITE}/epstein/doj-disclosures/data-set-{n}-files?page={{page}}"
            ),
            base_url: DEFAULT_SITE.to_string(),
            out_dir: PathBuf::from(format!("data{n}")),
            index_file: format!("index_data{n}.json"),
            state_file: PathBuf::from(format!("resume_data{n}.txt")),
            file_segment: default_file_segment(),
            extension: default_extension(),
            file_prefix: default_file_prefix(),
        }
    }
}

/// Global configuration loaded from `~/.config/pagesweep/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            download: DownloadConfig::default(),
            session: SessionConfig::default(),
            collections: (1..=11).map(CollectionConfig::disclosure_dataset).collect(),
        }
    }
}

impl SweepConfig {
    pub fn collection(&self, id: u32) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.id == id)
    }

    /// Rejects settings the scanner cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.scan.no_new_page_threshold == 0 {
            anyhow::bail!("scan.no_new_page_threshold must be at least 1");
        }
        if self.scan.hard_page_cap == 0 || self.scan.hard_page_cap == u32::MAX {
            anyhow::bail!(
                "scan.hard_page_cap must be between 1 and {}",
                u32::MAX - 1
            );
        }
        Ok(())
    }

    /// Configured collection ids in ascending order.
    pub fn collection_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.collections.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pagesweep")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from the default location, creating a default file if none exists.
pub fn load_or_init() -> Result<SweepConfig> {
    load_or_init_at(&config_path()?)
}

/// Load configuration from `path`, creating a default file there if none exists.
pub fn load_or_init_at(path: &Path) -> Result<SweepConfig> {
    if !path.exists() {
        let default_cfg = SweepConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: SweepConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}
