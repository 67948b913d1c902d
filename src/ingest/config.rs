// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::lead::LeadType;

pub const ENV_PATH: &str = "HARVEST_CONFIG_PATH";

/// One RSS feed the harvest reads from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
    #[serde(rename = "type", default = "default_feed_type")]
    pub kind: LeadType,
}

impl FeedConfig {
    pub fn new(name: &str, url: &str, kind: LeadType) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            kind,
        }
    }
}

fn default_feed_type() -> LeadType {
    LeadType::Story
}
fn default_items_per_feed() -> usize {
    2
}
fn default_trends_limit() -> usize {
    3
}
fn default_trends_region() -> String {
    "US".to_string()
}
fn default_trends_category() -> String {
    "e".to_string()
}
fn default_trends_url() -> String {
    "https://trends.google.com/trends/api/dailytrends".to_string()
}
fn default_social_delay_ms() -> u64 {
    800
}
fn default_adapter_timeout_secs() -> u64 {
    8
}
fn default_true() -> bool {
    true
}

fn default_authority_sources() -> Vec<String> {
    vec!["TMZ".to_string(), "Google News (Entertainment)".to_string()]
}

fn default_feeds() -> Vec<FeedConfig> {
    vec![
        FeedConfig::new("TMZ", "https://www.tmz.com/rss.xml", LeadType::Story),
        FeedConfig::new(
            "Google News (Entertainment)",
            "https://news.google.com/rss/headlines/section/topic/ENTERTAINMENT?hl=en-US&gl=US&ceid=US:en",
            LeadType::Seo,
        ),
        FeedConfig::new(
            "E! News",
            "https://www.eonline.com/syndication/feeds/rssfeeds/topstories.xml",
            LeadType::Story,
        ),
        FeedConfig::new("Page Six", "https://pagesix.com/feed/", LeadType::Story),
    ]
}

/// Everything the aggregator and its adapters need. Passed in explicitly so
/// tests can swap sources without touching globals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarvestConfig {
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedConfig>,
    /// Sources that earn the scorer's authority bonus.
    #[serde(default = "default_authority_sources")]
    pub authority_sources: Vec<String>,
    #[serde(default = "default_items_per_feed")]
    pub items_per_feed: usize,
    #[serde(default = "default_trends_limit")]
    pub trends_limit: usize,
    #[serde(default = "default_trends_region")]
    pub trends_region: String,
    #[serde(default = "default_trends_category")]
    pub trends_category: String,
    #[serde(default = "default_trends_url")]
    pub trends_url: String,
    #[serde(default = "default_social_delay_ms")]
    pub social_delay_ms: u64,
    #[serde(default = "default_adapter_timeout_secs")]
    pub adapter_timeout_secs: u64,
    /// When false, any status may follow any other.
    #[serde(default = "default_true")]
    pub enforce_workflow: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            authority_sources: default_authority_sources(),
            items_per_feed: default_items_per_feed(),
            trends_limit: default_trends_limit(),
            trends_region: default_trends_region(),
            trends_category: default_trends_category(),
            trends_url: default_trends_url(),
            social_delay_ms: default_social_delay_ms(),
            adapter_timeout_secs: default_adapter_timeout_secs(),
            enforce_workflow: true,
        }
    }
}

impl HarvestConfig {
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs.max(1))
    }

    pub fn social_delay(&self) -> Duration {
        Duration::from_millis(self.social_delay_ms)
    }
}

/// Load harvest config from an explicit path. Supports TOML or JSON formats.
pub fn load_harvest_config_from(path: &Path) -> Result<HarvestConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading harvest config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_harvest_config(&content, ext.as_str())
}

/// Load harvest config using env var + fallbacks:
/// 1) $HARVEST_CONFIG_PATH
/// 2) config/harvest.toml
/// 3) config/harvest.json
/// 4) built-in defaults
pub fn load_harvest_config_default() -> Result<HarvestConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_harvest_config_from(&pb);
        } else {
            return Err(anyhow!("HARVEST_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/harvest.toml");
    if toml_p.exists() {
        return load_harvest_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/harvest.json");
    if json_p.exists() {
        return load_harvest_config_from(&json_p);
    }
    Ok(HarvestConfig::default())
}

fn parse_harvest_config(s: &str, hint_ext: &str) -> Result<HarvestConfig> {
    let cfg: HarvestConfig = if hint_ext == "json" {
        serde_json::from_str(s).context("parsing harvest config json")?
    } else {
        toml::from_str(s).context("parsing harvest config toml")?
    };
    Ok(clean(cfg))
}

fn clean(mut cfg: HarvestConfig) -> HarvestConfig {
    cfg.feeds
        .retain(|f| !f.name.trim().is_empty() && !f.url.trim().is_empty());
    cfg.authority_sources = cfg
        .authority_sources
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    cfg
}
