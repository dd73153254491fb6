//! Title keyword classifier.
//!
//! The keyword list is a priority order, not an alphabetical convenience:
//! when a title mentions several disasters, the earliest keyword wins.

use geonews_common::DisasterCategory;

/// (keyword, category) in priority order. The forest fire aliases rank
/// just after "wildfire".
pub const DISASTER_KEYWORDS: &[(&str, DisasterCategory)] = &[
    ("earthquake", DisasterCategory::Earthquake),
    ("flood", DisasterCategory::Flood),
    ("tsunami", DisasterCategory::Tsunami),
    ("hurricane", DisasterCategory::Hurricane),
    ("wildfire", DisasterCategory::Wildfire),
    ("forestfire", DisasterCategory::Wildfire),
    ("forest fire", DisasterCategory::Wildfire),
    ("tornado", DisasterCategory::Tornado),
    ("cyclone", DisasterCategory::Cyclone),
    ("volcano", DisasterCategory::Volcano),
    ("drought", DisasterCategory::Drought),
    ("landslide", DisasterCategory::Landslide),
    ("storm", DisasterCategory::Storm),
    ("blizzard", DisasterCategory::Blizzard),
    ("avalanche", DisasterCategory::Avalanche),
    ("heatwave", DisasterCategory::Heatwave),
];

/// Keywords sent to the news source, one query each.
pub fn search_keywords() -> Vec<&'static str> {
    DISASTER_KEYWORDS
        .iter()
        .map(|(kw, _)| *kw)
        .filter(|kw| !kw.contains(' '))
        .collect()
}

/// First keyword (in priority order) found case-insensitively in `title`.
pub fn classify(title: &str) -> Option<DisasterCategory> {
    let lower = title.to_lowercase();
    DISASTER_KEYWORDS
        .iter()
        .find(|(kw, _)| lower.contains(*kw))
        .map(|(_, category)| *category)
}
