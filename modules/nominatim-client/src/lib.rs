pub mod error;
pub mod types;

pub use error::{NominatimError, Result};
pub use types::{Place, SearchResult};

use std::time::Duration;

const BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Upper bound on free-text query length.
const MAX_QUERY_CHARS: usize = 200;

pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
}

impl NominatimClient {
    /// Nominatim rejects requests without an identifying `User-Agent`.
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Build the `/search` request for a free-text place name.
    pub fn search_request(&self, query: &str) -> Result<reqwest::Request> {
        let query = query.trim();
        if query.is_empty() {
            return Err(NominatimError::InvalidQuery("empty query".to_string()));
        }
        if query.chars().count() > MAX_QUERY_CHARS {
            return Err(NominatimError::InvalidQuery(format!(
                "query too long (max {MAX_QUERY_CHARS} chars)"
            )));
        }

        let url = format!("{}/search", self.base_url);
        Ok(self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .build()?)
    }

    /// Best match for `query`, or `None` when Nominatim has no result.
    pub async fn search(&self, query: &str) -> Result<Option<Place>> {
        let request = self.search_request(query)?;
        let resp = self.client.execute(request).await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(NominatimError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let place = parse_search(&body)?;
        tracing::debug!(query, found = place.is_some(), "Nominatim search");
        Ok(place)
    }
}

/// First result of a `/search` body, if any.
pub fn parse_search(body: &str) -> Result<Option<Place>> {
    let results: Vec<SearchResult> = serde_json::from_str(body)?;
    results.into_iter().next().map(Place::try_from).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> NominatimClient {
        NominatimClient::new("geonews-test/0.1", Duration::from_secs(10))
            .with_base_url("https://geo.example.test/")
    }

    #[test]
    fn search_request_asks_for_single_json_result() {
        let req = client().search_request("  Kathmandu ").unwrap();
        assert_eq!(req.url().path(), "/search");
        let query = req.url().query().unwrap();
        assert_eq!(query, "q=Kathmandu&format=json&limit=1");
    }

    #[test]
    fn rejects_empty_and_oversized_queries() {
        assert!(matches!(
            client().search_request("   "),
            Err(NominatimError::InvalidQuery(_))
        ));
        let long = "x".repeat(201);
        assert!(matches!(
            client().search_request(&long),
            Err(NominatimError::InvalidQuery(_))
        ));
    }

    #[test]
    fn parses_first_result() {
        let body = r#"[
            {"lat": "35.6768601", "lon": "139.7638947", "display_name": "Tokyo, Japan"},
            {"lat": "1.0", "lon": "2.0", "display_name": "elsewhere"}
        ]"#;
        let place = parse_search(body).unwrap().unwrap();
        assert_eq!(place.display_name, "Tokyo, Japan");
        assert!((place.lat - 35.6768601).abs() < 1e-9);
        assert!((place.lon - 139.7638947).abs() < 1e-9);
    }

    #[test]
    fn empty_result_list_is_none() {
        assert_eq!(parse_search("[]").unwrap(), None);
    }

    #[test]
    fn unparseable_coordinates_are_errors() {
        let body = r#"[{"lat": "north", "lon": "1.0"}]"#;
        assert!(matches!(parse_search(body), Err(NominatimError::Parse(_))));
    }
}
