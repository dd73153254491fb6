// Trait seams for the pipeline's external collaborators.
//
// ArticleSource: the news search API, one keyword at a time.
// EntityRecognizer: the NER model; returns every tagged span.
// Geocoder: free-text place name to a single best coordinate pair.
// EventSink: the persisted record collection, replaced wholesale.
//
// Production impls wrap the thin client crates; `testing` provides
// HashMap-backed mocks so the whole pipeline runs without network or database.

use anyhow::Result;
use async_trait::async_trait;

use geonews_common::{Coordinates, RawArticle, ResolvedEvent};
use ner_client::Entity;

#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Articles matching `keyword` published in the trailing `window_days`.
    async fn fetch(&self, keyword: &str, window_days: u32) -> Result<Vec<RawArticle>>;
}

#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Every entity span the model tags in `text`, in text order.
    async fn recognize(&self, text: &str) -> Result<Vec<Entity>>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best match for `query`. `Ok(None)` means the service had no usable result.
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>>;
}

#[async_trait]
pub trait EventSink: Send + Sync {
    /// Make the persisted collection exactly `events`. Returns rows written.
    async fn replace_all(&self, events: &[ResolvedEvent]) -> Result<u64>;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}

#[async_trait]
impl EntityRecognizer for ner_client::NerClient {
    async fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        Ok(self.entities(text).await?)
    }
}

#[async_trait]
impl Geocoder for nominatim_client::NominatimClient {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        let place = self.search(query).await?;
        Ok(place.and_then(|p| Coordinates::new(p.lat, p.lon)))
    }
}
