use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// --- Disaster categories ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisasterCategory {
    Earthquake,
    Flood,
    Tsunami,
    Hurricane,
    Wildfire,
    Tornado,
    Cyclone,
    Volcano,
    Drought,
    Landslide,
    Storm,
    Blizzard,
    Avalanche,
    Heatwave,
}

impl DisasterCategory {
    pub const ALL: [DisasterCategory; 14] = [
        DisasterCategory::Earthquake,
        DisasterCategory::Flood,
        DisasterCategory::Tsunami,
        DisasterCategory::Hurricane,
        DisasterCategory::Wildfire,
        DisasterCategory::Tornado,
        DisasterCategory::Cyclone,
        DisasterCategory::Volcano,
        DisasterCategory::Drought,
        DisasterCategory::Landslide,
        DisasterCategory::Storm,
        DisasterCategory::Blizzard,
        DisasterCategory::Avalanche,
        DisasterCategory::Heatwave,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisasterCategory::Earthquake => "Earthquake",
            DisasterCategory::Flood => "Flood",
            DisasterCategory::Tsunami => "Tsunami",
            DisasterCategory::Hurricane => "Hurricane",
            DisasterCategory::Wildfire => "Wildfire",
            DisasterCategory::Tornado => "Tornado",
            DisasterCategory::Cyclone => "Cyclone",
            DisasterCategory::Volcano => "Volcano",
            DisasterCategory::Drought => "Drought",
            DisasterCategory::Landslide => "Landslide",
            DisasterCategory::Storm => "Storm",
            DisasterCategory::Blizzard => "Blizzard",
            DisasterCategory::Avalanche => "Avalanche",
            DisasterCategory::Heatwave => "Heatwave",
        }
    }
}

impl std::fmt::Display for DisasterCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisasterCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DisasterCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown disaster category: {s}"))
    }
}

// --- Articles ---

/// An article exactly as the news source returned it. Scoped to one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RawArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub source_name: Option<String>,
    pub url: String,
}

/// An article whose title matched a disaster keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedArticle {
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub source_name: Option<String>,
    pub url: String,
    pub disaster_event: DisasterCategory,
}

impl ClassifiedArticle {
    /// Returns `None` when the raw article has no title.
    pub fn from_raw(raw: RawArticle, disaster_event: DisasterCategory) -> Option<Self> {
        Some(Self {
            title: raw.title?,
            description: raw.description,
            published_at: raw.published_at,
            source_name: raw.source_name,
            url: raw.url,
            disaster_event,
        })
    }
}

impl AsRef<ClassifiedArticle> for ClassifiedArticle {
    fn as_ref(&self) -> &ClassifiedArticle {
        self
    }
}

/// Place names extracted from one article, title entities first.
/// Case-sensitively deduplicated; order is whatever extraction produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationCandidates(Vec<String>);

impl LocationCandidates {
    /// Merge title and description places, keeping the first occurrence of each.
    pub fn merge(title_places: Vec<String>, description_places: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        let places = title_places
            .into_iter()
            .chain(description_places)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .filter(|p| seen.insert(p.clone()))
            .collect();
        Self(places)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<Vec<String>> for LocationCandidates {
    fn from(places: Vec<String>) -> Self {
        Self::merge(places, Vec::new())
    }
}

// --- Geo ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Accepts only finite coordinates inside the WGS84 range.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        valid.then_some(Self { lat, lon })
    }
}

// --- Persisted record ---

/// One distinct disaster occurrence. Field names on the wire match the
/// collection the dashboard reads (`Location`, `Latitude`, `Longitude`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedEvent {
    pub title: String,
    pub disaster_event: DisasterCategory,
    pub timestamp: DateTime<Utc>,
    pub source: Option<String>,
    pub url: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
}

/// (calendar date, category, location): what makes an occurrence distinct.
pub type OccurrenceKey = (NaiveDate, DisasterCategory, String);

impl ResolvedEvent {
    pub fn new(
        article: ClassifiedArticle,
        timestamp: DateTime<Utc>,
        location: String,
        coords: Coordinates,
    ) -> Self {
        Self {
            title: article.title,
            disaster_event: article.disaster_event,
            timestamp,
            source: article.source_name,
            url: article.url,
            location,
            latitude: coords.lat,
            longitude: coords.lon,
        }
    }

    pub fn occurrence_key(&self) -> OccurrenceKey {
        (
            self.timestamp.date_naive(),
            self.disaster_event,
            self.location.clone(),
        )
    }
}
