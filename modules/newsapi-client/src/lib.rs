pub mod error;
pub mod types;

pub use error::{NewsApiError, Result};
pub use types::{Article, ArticleSource, EverythingQuery, EverythingResponse};

use std::time::Duration;

const BASE_URL: &str = "https://newsapi.org/v2";

pub struct NewsApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn new(api_key: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: BASE_URL.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Build the `/everything` request without sending it.
    pub fn everything_request(&self, query: &EverythingQuery) -> Result<reqwest::Request> {
        let url = format!("{}/everything", self.base_url);
        Ok(self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(query)
            .build()?)
    }

    /// Search all articles matching `query.q` inside the query's date range.
    pub async fn everything(&self, query: &EverythingQuery) -> Result<Vec<Article>> {
        let request = self.everything_request(query)?;
        let resp = self.client.execute(request).await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        let parsed = parse_everything(&body)?;
        tracing::debug!(
            q = %query.q,
            total = parsed.total_results.unwrap_or_default(),
            returned = parsed.articles.len(),
            "NewsAPI everything"
        );
        Ok(parsed.articles)
    }
}

/// Parse an `/everything` body, turning `"status": "error"` envelopes into errors.
pub fn parse_everything(body: &str) -> Result<EverythingResponse> {
    let parsed: EverythingResponse = serde_json::from_str(body)?;
    if parsed.status != "ok" {
        return Err(NewsApiError::Api {
            status: 200,
            message: envelope_message(&parsed),
        });
    }
    Ok(parsed)
}

fn api_error(status: u16, body: &str) -> NewsApiError {
    let message = serde_json::from_str::<EverythingResponse>(body)
        .map(|env| envelope_message(&env))
        .unwrap_or_else(|_| body.to_string());
    NewsApiError::Api { status, message }
}

fn envelope_message(env: &EverythingResponse) -> String {
    match (&env.code, &env.message) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (None, Some(message)) => message.clone(),
        (Some(code), None) => code.clone(),
        (None, None) => format!("status {}", env.status),
    }
}
