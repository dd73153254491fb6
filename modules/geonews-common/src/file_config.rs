use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// TOML-backed pipeline tuning. Every section is optional; a missing file
/// yields `FileConfig::default()`. Secrets stay in env vars.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub source: SourceConfig,
    pub extraction: ExtractionConfig,
    pub geocoder: GeocoderConfig,
    pub filters: FiltersConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Trailing window, in days, ending at run time.
    pub window_days: u32,
    pub language: String,
    pub timeout_secs: u64,
    /// Keyword fetches in flight at once.
    pub fetch_concurrency: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            window_days: 15,
            language: "en".to_string(),
            timeout_secs: 30,
            fetch_concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    pub model: String,
    pub concurrency: usize,
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: "en_core_web_sm".to_string(),
            concurrency: 8,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeocoderConfig {
    pub timeout_secs: u64,
    /// Minimum gap between two geocoder requests.
    pub min_interval_ms: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            min_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FiltersConfig {
    /// Articles whose lowercased URL contains any of these are dropped.
    pub url_denylist: Vec<String>,
    /// Articles whose lowercased title contains any of these are dropped.
    pub title_noise: Vec<String>,
    /// Canonical locations (case-insensitive) never geocoded or stored.
    pub excluded_locations: Vec<String>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            url_denylist: ["politics", "yahoo", "sports", "entertainment", "cricket"]
                .map(String::from)
                .to_vec(),
            title_noise: ["tool", "angry"].map(String::from).to_vec(),
            excluded_locations: Vec::new(),
        }
    }
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

/// Like `load_config`, but a file that does not exist means defaults.
pub fn load_config_or_default(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "No config file, using defaults");
        return Ok(FileConfig::default());
    }
    load_config(path)
}
