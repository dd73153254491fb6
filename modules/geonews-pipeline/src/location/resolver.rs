use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use geonews_common::{Coordinates, LocationCandidates};

use super::policy::LocationPolicy;
use super::rate_limit::RateLimiter;
use crate::traits::Geocoder;

/// Result of one geocode lookup. `cached` is true when no request was made.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeocodeOutcome {
    pub coords: Option<Coordinates>,
    pub cached: bool,
}

/// What happened to one article's candidates.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved {
        location: String,
        coords: Coordinates,
        cached: bool,
    },
    NoCandidate,
    Excluded {
        location: String,
    },
    GeocodeFailed {
        location: String,
        cached: bool,
    },
}

/// Owns the geocoder, its rate limiter and the per-run lookup cache.
///
/// The cache stores misses as well as hits, and the cache lock is held across
/// the remote call, so each distinct location costs at most one request no
/// matter how many articles or callers ask for it.
pub struct LocationResolver {
    geocoder: Arc<dyn Geocoder>,
    policy: Box<dyn LocationPolicy>,
    limiter: RateLimiter,
    timeout: Duration,
    excluded: HashSet<String>,
    cache: Mutex<HashMap<String, Option<Coordinates>>>,
}

impl LocationResolver {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        policy: Box<dyn LocationPolicy>,
        min_interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            geocoder,
            policy,
            limiter: RateLimiter::new(min_interval),
            timeout,
            excluded: HashSet::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Canonical locations (compared case-insensitively) that are never geocoded.
    pub fn with_excluded_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded = locations
            .into_iter()
            .map(|l| l.as_ref().trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect();
        self
    }

    pub fn select_canonical_location(&self, candidates: &LocationCandidates) -> Option<String> {
        self.policy.select(candidates)
    }

    pub fn is_excluded(&self, location: &str) -> bool {
        self.excluded.contains(&location.trim().to_lowercase())
    }

    /// Coordinates for `location`. Errors and timeouts degrade to `None`.
    pub async fn geocode(&self, location: &str) -> GeocodeOutcome {
        let mut cache = self.cache.lock().await;
        if let Some(coords) = cache.get(location) {
            return GeocodeOutcome {
                coords: *coords,
                cached: true,
            };
        }

        self.limiter.wait().await;
        let coords = match tokio::time::timeout(self.timeout, self.geocoder.geocode(location)).await {
            Ok(Ok(Some(coords))) => Some(coords),
            Ok(Ok(None)) => {
                debug!(location, "No geocoding result");
                None
            }
            Ok(Err(e)) => {
                warn!(location, error = %e, "Error geocoding location");
                None
            }
            Err(_) => {
                warn!(location, timeout_secs = self.timeout.as_secs(), "Geocoding timed out");
                None
            }
        };

        cache.insert(location.to_string(), coords);
        GeocodeOutcome {
            coords,
            cached: false,
        }
    }

    /// Canonicalize, check exclusions, geocode.
    pub async fn resolve(&self, candidates: &LocationCandidates) -> Resolution {
        let Some(location) = self.select_canonical_location(candidates) else {
            return Resolution::NoCandidate;
        };
        if self.is_excluded(&location) {
            return Resolution::Excluded { location };
        }

        let outcome = self.geocode(&location).await;
        match outcome.coords {
            Some(coords) => Resolution::Resolved {
                location,
                coords,
                cached: outcome.cached,
            },
            None => Resolution::GeocodeFailed {
                location,
                cached: outcome.cached,
            },
        }
    }

    /// Distinct locations looked up so far, hits and misses alike.
    pub async fn cached_locations(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Forget every lookup. Called at the start of each run so a miss is
    /// retried on the next scheduled run.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }
}
