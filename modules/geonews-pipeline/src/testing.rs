// Test mocks for the pipeline.
//
// Four mocks matching the four trait boundaries:
// - MockSource (ArticleSource): HashMap-based keyword→articles
// - MockRecognizer (EntityRecognizer): HashMap-based text→entities
// - MockGeocoder (Geocoder): HashMap-based place→coordinates, records calls
// - MemorySink (EventSink): holds the last replaced collection
//
// Plus helpers for constructing RawArticle, ClassifiedArticle and ResolvedEvent.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use geonews_common::{ClassifiedArticle, Coordinates, DisasterCategory, RawArticle, ResolvedEvent};
use ner_client::Entity;

use crate::classifier::classify;
use crate::traits::{ArticleSource, EntityRecognizer, EventSink, Geocoder};

// ---------------------------------------------------------------------------
// Test constants
// ---------------------------------------------------------------------------

/// Tokyo, Japan coordinates.
pub const TOKYO: (f64, f64) = (35.6812, 139.7671);
/// Jakarta, Indonesia coordinates.
pub const JAKARTA: (f64, f64) = (-6.2088, 106.8456);
/// Manila, Philippines coordinates.
pub const MANILA: (f64, f64) = (14.5995, 120.9842);

/// Publication time given to articles built by the helpers below.
pub fn fixed_published_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 3, 8, 30, 0).unwrap()
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Keyword-keyed article source. Unregistered keywords return no articles.
pub struct MockSource {
    articles: HashMap<String, Vec<RawArticle>>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            articles: HashMap::new(),
            failing: HashSet::new(),
            hanging: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, keyword: &str, articles: Vec<RawArticle>) -> Self {
        self.articles.insert(keyword.to_string(), articles);
        self
    }

    pub fn failing_on(mut self, keyword: &str) -> Self {
        self.failing.insert(keyword.to_string());
        self
    }

    /// The fetch for `keyword` never completes.
    pub fn hanging_on(mut self, keyword: &str) -> Self {
        self.hanging.insert(keyword.to_string());
        self
    }

    /// Keywords fetched, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleSource for MockSource {
    async fn fetch(&self, keyword: &str, _window_days: u32) -> Result<Vec<RawArticle>> {
        self.calls.lock().unwrap().push(keyword.to_string());
        if self.hanging.contains(keyword) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(keyword) {
            bail!("MockSource: scripted failure for keyword {keyword}");
        }
        Ok(self.articles.get(keyword).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockRecognizer
// ---------------------------------------------------------------------------

/// Text-keyed entity recognizer. Unregistered text has no entities.
pub struct MockRecognizer {
    entities: HashMap<String, Vec<Entity>>,
    failing: HashSet<String>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    /// Register `(entity text, label)` pairs for an exact input text.
    pub fn on_text(mut self, text: &str, entities: &[(&str, &str)]) -> Self {
        let entities = entities
            .iter()
            .map(|(text, label)| Entity {
                text: text.to_string(),
                label: label.to_string(),
            })
            .collect();
        self.entities.insert(text.to_string(), entities);
        self
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }
}

#[async_trait]
impl EntityRecognizer for MockRecognizer {
    async fn recognize(&self, text: &str) -> Result<Vec<Entity>> {
        if self.failing.contains(text) {
            bail!("MockRecognizer: scripted failure");
        }
        Ok(self.entities.get(text).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MockGeocoder
// ---------------------------------------------------------------------------

/// Place-keyed geocoder. Unregistered places have no result.
/// Every call is recorded so tests can assert on remote traffic.
pub struct MockGeocoder {
    places: HashMap<String, Coordinates>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self {
            places: HashMap::new(),
            failing: HashSet::new(),
            hanging: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, place: &str, lat: f64, lon: f64) -> Self {
        let coords = Coordinates::new(lat, lon).expect("test coordinates must be valid");
        self.places.insert(place.to_string(), coords);
        self
    }

    pub fn failing_on(mut self, place: &str) -> Self {
        self.failing.insert(place.to_string());
        self
    }

    /// The lookup for `place` never completes.
    pub fn hanging_on(mut self, place: &str) -> Self {
        self.hanging.insert(place.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        self.calls.lock().unwrap().push(query.to_string());
        if self.hanging.contains(query) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(query) {
            bail!("MockGeocoder: scripted failure for {query}");
        }
        Ok(self.places.get(query).copied())
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// In-memory collection. `replace_all` swaps the whole Vec under one lock.
pub struct MemorySink {
    events: Mutex<Vec<ResolvedEvent>>,
    replaces: Mutex<u32>,
    fail: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            replaces: Mutex::new(0),
            fail: false,
        }
    }

    /// A sink whose every write fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn events(&self) -> Vec<ResolvedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn replace_count(&self) -> u32 {
        *self.replaces.lock().unwrap()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn replace_all(&self, events: &[ResolvedEvent]) -> Result<u64> {
        if self.fail {
            bail!("MemorySink: scripted write failure");
        }
        *self.events.lock().unwrap() = events.to_vec();
        *self.replaces.lock().unwrap() += 1;
        Ok(events.len() as u64)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// A raw article published at `fixed_published_at()` by "Test Wire".
pub fn raw(title: &str, description: Option<&str>, url: &str) -> RawArticle {
    RawArticle {
        title: Some(title.to_string()),
        description: description.map(String::from),
        published_at: Some(fixed_published_at()),
        source_name: Some("Test Wire".to_string()),
        url: url.to_string(),
    }
}

/// A classified article; the category comes from the real classifier,
/// falling back to Flood for titles without a keyword.
pub fn classified(title: &str, description: Option<&str>, url: &str) -> ClassifiedArticle {
    let category = classify(title).unwrap_or(DisasterCategory::Flood);
    ClassifiedArticle::from_raw(raw(title, description, url), category)
        .expect("raw() always sets a title")
}

/// A resolved event at `timestamp` (RFC 3339) with zero coordinates.
pub fn resolved(
    title: &str,
    category: DisasterCategory,
    timestamp: &str,
    location: &str,
) -> ResolvedEvent {
    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .expect("test timestamp must be RFC 3339")
        .with_timezone(&Utc);
    let url = format!("https://example.com/{}", title.to_lowercase().replace(' ', "-"));
    let article = ClassifiedArticle {
        title: title.to_string(),
        description: None,
        published_at: Some(timestamp),
        source_name: Some("Test Wire".to_string()),
        url,
        disaster_event: category,
    };
    let coords = Coordinates::new(0.0, 0.0).expect("origin is a valid coordinate");
    ResolvedEvent::new(article, timestamp, location.to_string(), coords)
}
