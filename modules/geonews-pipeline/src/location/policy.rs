use geonews_common::LocationCandidates;

/// Chooses the single place string used for geocoding and deduplication.
pub trait LocationPolicy: Send + Sync {
    fn select(&self, candidates: &LocationCandidates) -> Option<String>;
}

/// Reads the first three candidates as country, region, city by position and
/// returns the most specific one present.
///
/// Extraction order is not an administrative hierarchy, so this is a
/// heuristic. A gazetteer-backed policy can replace it behind `LocationPolicy`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalLocationPolicy;

impl LocationPolicy for PositionalLocationPolicy {
    fn select(&self, candidates: &LocationCandidates) -> Option<String> {
        let places = candidates.as_slice();
        let country = places.first();
        let region = places.get(1);
        let city = places.get(2);
        city.or(region).or(country).cloned()
    }
}
