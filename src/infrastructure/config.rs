//! Crawler configuration
//!
//! A single flat JSON file with load-or-default semantics: a missing file
//! yields the defaults (and is not created), a malformed file is an error so
//! that a typo never silently falls back to defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Scheme+host of the target site; pages and the API share it.
    pub api_domain: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    /// Locale and currency sent with every API call.
    pub locale: String,
    pub currency: String,
    /// Root of the crawler's on-disk data (`listing_ids/`, `crawled_data/`).
    pub data_dir: PathBuf,
    /// Accessible label of the close button on the interstitial dialog.
    pub dialog_close_label: String,
    /// How long to let a page settle after navigation before the captured
    /// requests are considered complete, in milliseconds.
    pub page_settle_ms: u64,
    /// Idle gap that ends the request-event drain, in milliseconds.
    pub request_idle_ms: u64,
    /// External upsert command invoked with the finished file path appended.
    /// `None` skips the handoff.
    pub upsert_command: Option<Vec<String>>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            api_domain: "https://www.airbnb.com.vn".to_string(),
            user_agent: "stay-crawler/0.3 (data pipeline)".to_string(),
            timeout_seconds: 30,
            max_requests_per_second: 2,
            locale: "vi".to_string(),
            currency: "VND".to_string(),
            data_dir: PathBuf::from("output"),
            dialog_close_label: "Đóng".to_string(),
            page_settle_ms: 4_000,
            request_idle_ms: 1_500,
            upsert_command: None,
        }
    }
}

impl CrawlerConfig {
    /// Loads the config file if it exists, otherwise returns defaults.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Directory holding the per-region identifier lists.
    pub fn input_dir(&self) -> PathBuf {
        self.data_dir.join("listing_ids")
    }

    /// Directory receiving the versioned output files.
    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join("crawled_data")
    }
}
