use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub woko: WokoConfig,
    #[serde(default)]
    pub wgzimmer: WgZimmerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifyConfig {
    #[serde(default = "default_ntfy_server")]
    pub server: String,
    #[serde(default = "default_ntfy_topic")]
    pub topic: String,
    #[serde(default = "default_notify_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            server: default_ntfy_server(),
            topic: default_ntfy_topic(),
            timeout_secs: default_notify_timeout_secs(),
        }
    }
}

fn default_ntfy_server() -> String {
    "https://ntfy.sh".to_string()
}
fn default_ntfy_topic() -> String {
    "room_finder".to_string()
}
fn default_notify_timeout_secs() -> u64 {
    10
}

/// Intervals, in seconds unless noted
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    #[serde(default = "default_woko_interval")]
    pub woko_interval_secs: u64,
    #[serde(default = "default_wgzimmer_interval")]
    pub wgzimmer_interval_secs: u64,
    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

impl ScheduleConfig {
    pub fn woko_interval(&self) -> Duration {
        Duration::from_secs(self.woko_interval_secs)
    }

    pub fn wgzimmer_interval(&self) -> Duration {
        Duration::from_secs(self.wgzimmer_interval_secs)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            woko_interval_secs: default_woko_interval(),
            wgzimmer_interval_secs: default_wgzimmer_interval(),
            heartbeat_secs: default_heartbeat(),
            tick_millis: default_tick_millis(),
        }
    }
}

fn default_woko_interval() -> u64 {
    300
}
fn default_wgzimmer_interval() -> u64 {
    1800
}
fn default_heartbeat() -> u64 {
    3600
}
fn default_tick_millis() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("/app/data/listings.db")
}

/// Rolling log file written next to the console output
#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_true")]
    pub to_file: bool,
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
    /// Rotated files kept on disk, current one included
    #[serde(default = "default_log_max_files")]
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            to_file: true,
            dir: default_log_dir(),
            file_prefix: default_log_file_prefix(),
            max_files: default_log_max_files(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/app/data/logs")
}
fn default_log_file_prefix() -> String {
    "room-finder.log".to_string()
}
fn default_log_max_files() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    #[serde(default = "default_true")]
    pub ignore_sublets: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            ignore_sublets: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct WokoConfig {
    #[serde(default = "default_woko_base_url")]
    pub base_url: String,
    /// Listing pages to scrape, one per region
    #[serde(default = "default_woko_pages")]
    pub pages: Vec<String>,
    #[serde(default = "default_woko_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WokoConfig {
    fn default() -> Self {
        Self {
            base_url: default_woko_base_url(),
            pages: default_woko_pages(),
            timeout_secs: default_woko_timeout_secs(),
        }
    }
}

fn default_woko_base_url() -> String {
    "https://www.woko.ch".to_string()
}
fn default_woko_pages() -> Vec<String> {
    vec!["https://www.woko.ch/en/zimmer-in-zuerich".to_string()]
}
fn default_woko_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct WgZimmerConfig {
    #[serde(default = "default_wgzimmer_base_url")]
    pub base_url: String,
    #[serde(default = "default_wgzimmer_search_url")]
    pub search_url: String,
    /// City names as shown on the site, or a "<Group> (ALL)" shorthand
    #[serde(default = "default_cities")]
    pub cities: Vec<String>,
    #[serde(default = "default_price_min")]
    pub price_min: u32,
    #[serde(default = "default_price_max")]
    pub price_max: u32,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,
    #[serde(default = "default_consent_timeout")]
    pub consent_timeout_secs: u64,
    #[serde(default = "default_results_timeout")]
    pub results_timeout_secs: u64,
    /// Where to dump the page HTML and a screenshot when a region yields nothing
    #[serde(default)]
    pub debug_dir: Option<PathBuf>,
}

impl Default for WgZimmerConfig {
    fn default() -> Self {
        Self {
            base_url: default_wgzimmer_base_url(),
            search_url: default_wgzimmer_search_url(),
            cities: default_cities(),
            price_min: default_price_min(),
            price_max: default_price_max(),
            headless: true,
            navigation_timeout_secs: default_navigation_timeout(),
            consent_timeout_secs: default_consent_timeout(),
            results_timeout_secs: default_results_timeout(),
            debug_dir: None,
        }
    }
}

fn default_wgzimmer_base_url() -> String {
    "https://www.wgzimmer.ch".to_string()
}
fn default_wgzimmer_search_url() -> String {
    "https://www.wgzimmer.ch/wgzimmer/search/mate.html".to_string()
}
fn default_cities() -> Vec<String> {
    vec!["Zurich (ALL)".to_string()]
}
fn default_price_min() -> u32 {
    200
}
fn default_price_max() -> u32 {
    750
}
fn default_navigation_timeout() -> u64 {
    60
}
fn default_consent_timeout() -> u64 {
    10
}
fn default_results_timeout() -> u64 {
    20
}

impl Config {
    /// Load the TOML config at `path`, falling back to defaults when the file is absent.
    ///
    /// Runs before logging is set up, so callers report which case applied.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.wgzimmer.price_min > self.wgzimmer.price_max {
            anyhow::bail!(
                "wgzimmer.price_min ({}) is above wgzimmer.price_max ({})",
                self.wgzimmer.price_min,
                self.wgzimmer.price_max
            );
        }
        if self.schedule.tick_millis == 0 {
            anyhow::bail!("schedule.tick_millis must be positive");
        }
        if self.log.to_file && self.log.max_files == 0 {
            anyhow::bail!("log.max_files must be positive");
        }
        Ok(())
    }
}
