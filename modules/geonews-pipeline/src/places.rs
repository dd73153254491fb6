//! Place-name extraction: geopolitical entities from title and description.

use std::sync::Arc;

use anyhow::Result;

use geonews_common::{ClassifiedArticle, LocationCandidates};

use crate::traits::EntityRecognizer;

/// spaCy's label for countries, cities and states.
pub const GPE_LABEL: &str = "GPE";

pub struct PlaceExtractor {
    recognizer: Arc<dyn EntityRecognizer>,
}

impl PlaceExtractor {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>) -> Self {
        Self { recognizer }
    }

    /// GPE entity texts in `text`, in the order the model reported them.
    pub async fn extract_places(&self, text: &str) -> Result<Vec<String>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let entities = self.recognizer.recognize(text).await?;
        Ok(entities
            .into_iter()
            .filter(|e| e.label == GPE_LABEL)
            .map(|e| e.text)
            .collect())
    }

    /// Title places followed by description places, deduplicated.
    pub async fn candidates(&self, article: &ClassifiedArticle) -> Result<LocationCandidates> {
        let title_places = self.extract_places(&article.title).await?;
        let description_places = match article.description.as_deref() {
            Some(description) => self.extract_places(description).await?,
            None => Vec::new(),
        };
        Ok(LocationCandidates::merge(title_places, description_places))
    }
}
