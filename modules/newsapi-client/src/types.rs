use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Query parameters for `/v2/everything`.
#[derive(Debug, Clone, Serialize)]
pub struct EverythingQuery {
    pub q: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub language: String,
    #[serde(rename = "pageSize", skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl EverythingQuery {
    /// Query covering the `days` calendar days that end at `now`.
    pub fn trailing_window(q: &str, days: u32, now: DateTime<Utc>) -> Self {
        Self {
            q: q.to_string(),
            from: (now - Duration::days(i64::from(days))).date_naive(),
            to: now.date_naive(),
            language: "en".to_string(),
            page_size: None,
        }
    }

    pub fn language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }
}

/// Envelope returned by every NewsAPI endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EverythingResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// A single article as NewsAPI serves it. Only `url` is guaranteed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default)]
    pub source: ArticleSource,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: String,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

impl Article {
    /// `publishedAt` as a UTC timestamp, if present and RFC 3339.
    pub fn published_at_utc(&self) -> Option<DateTime<Utc>> {
        self.published_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}
