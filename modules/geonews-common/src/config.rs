use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_NER_URL: &str = "http://localhost:8080";
const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_NEWSAPI_URL: &str = "https://newsapi.org/v2";
const DEFAULT_USER_AGENT: &str = "geonews/0.1";

/// Where the finished record set is written.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkTarget {
    Postgres { database_url: String },
    JsonFile { path: PathBuf },
}

/// Application configuration loaded from environment variables.
/// Secrets and endpoints only; pipeline tuning lives in the TOML `FileConfig`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // News source
    pub newsapi_key: String,
    pub newsapi_url: String,

    // Entity recognition
    pub ner_url: String,

    // Geocoding
    pub nominatim_url: String,
    pub nominatim_user_agent: String,

    // Persistence
    pub sink: SinkTarget,
    pub data_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));
        let sink = match std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()) {
            Some(database_url) => SinkTarget::Postgres { database_url },
            None => SinkTarget::JsonFile {
                path: std::env::var("OUTPUT_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| data_dir.join("disaster_events.json")),
            },
        };

        let config = Self {
            newsapi_key: std::env::var("NEWSAPI_KEY").context("NEWSAPI_KEY environment variable is required")?,
            newsapi_url: std::env::var("NEWSAPI_URL").unwrap_or_else(|_| DEFAULT_NEWSAPI_URL.to_string()),
            ner_url: std::env::var("NER_URL").unwrap_or_else(|_| DEFAULT_NER_URL.to_string()),
            nominatim_url: std::env::var("NOMINATIM_URL")
                .unwrap_or_else(|_| DEFAULT_NOMINATIM_URL.to_string()),
            nominatim_user_agent: std::env::var("NOMINATIM_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            sink,
            data_dir,
        };

        config.log_keys();
        Ok(config)
    }

    fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  NEWSAPI_KEY: {}", preview(&self.newsapi_key));
        tracing::info!("  NEWSAPI_URL: {}", self.newsapi_url);
        tracing::info!("  NER_URL: {}", self.ner_url);
        tracing::info!("  NOMINATIM_URL: {}", self.nominatim_url);
        match &self.sink {
            SinkTarget::Postgres { database_url } => {
                tracing::info!("  DATABASE_URL: {}", preview(database_url))
            }
            SinkTarget::JsonFile { path } => tracing::info!("  OUTPUT_PATH: {}", path.display()),
        }
    }
}

/// First five characters plus length, for logging secrets.
pub fn preview(val: &str) -> String {
    if val.is_empty() {
        return "<not set>".to_string();
    }
    let head: String = val.chars().take(5).collect();
    format!("{}...({} chars)", head, val.chars().count())
}
