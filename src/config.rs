use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::state::ListingKind;

/// Overrides the config file path.
pub const CONFIG_PATH_ENV: &str = "CATALOG_CONFIG";
/// Overrides `api.base_url`.
pub const API_BASE_ENV: &str = "CATALOG_API_BASE";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub refresh: Refresh,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_categories_path")]
    pub categories_path: String,
    #[serde(default = "default_auctions_path")]
    pub auctions_path: String,
    #[serde(default = "default_tenders_path")]
    pub tenders_path: String,
    #[serde(default = "default_direct_sales_path")]
    pub direct_sales_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Ask the listing endpoints for the selected category only.
    #[serde(default)]
    pub scope_listing_fetches: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Refresh {
    #[serde(default = "default_countdown_tick_ms")]
    pub countdown_tick_ms: u64,
    /// 0 disables polling.
    #[serde(default = "default_listing_poll_secs")]
    pub listing_poll_secs: u64,
}

fn default_categories_path() -> String {
    "/categories/tree".to_string()
}

fn default_auctions_path() -> String {
    "/auctions".to_string()
}

fn default_tenders_path() -> String {
    "/tenders".to_string()
}

fn default_direct_sales_path() -> String {
    "/direct-sales".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_countdown_tick_ms() -> u64 {
    1000
}

fn default_listing_poll_secs() -> u64 {
    30
}

impl Default for General {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for Refresh {
    fn default() -> Self {
        Self {
            countdown_tick_ms: default_countdown_tick_ms(),
            listing_poll_secs: default_listing_poll_secs(),
        }
    }
}

impl ApiConfig {
    pub fn listings_path(&self, kind: ListingKind) -> &str {
        match kind {
            ListingKind::Auction => &self.auctions_path,
            ListingKind::Tender => &self.tenders_path,
            ListingKind::DirectSale => &self.direct_sales_path,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Refresh {
    pub fn countdown_period(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms.max(1))
    }

    pub fn listing_poll(&self) -> Option<Duration> {
        (self.listing_poll_secs > 0).then(|| Duration::from_secs(self.listing_poll_secs))
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        if let Ok(base) = std::env::var(API_BASE_ENV) {
            config.api.base_url = base;
        }
        Ok(config)
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        if config.api.base_url.trim().is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }
        Ok(config)
    }
}
