//! One enrichment run, end to end:
//! fetch → classify → extract places → filter → resolve location → collapse → persist.
//!
//! Every stage keeps arrival order, so "first seen wins" in the filters is
//! deterministic for a given source response.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use geonews_common::{
    ClassifiedArticle, FileConfig, LocationCandidates, RawArticle, ResolvedEvent,
};

use crate::classifier::{classify, search_keywords};
use crate::filter::{collapse_occurrences, ArticleFilter};
use crate::location::{LocationPolicy, LocationResolver, PositionalLocationPolicy, Resolution};
use crate::places::PlaceExtractor;
use crate::run_log::{EventKind, RunLog};
use crate::stats::PipelineStats;
use crate::traits::{ArticleSource, EntityRecognizer, EventSink, Geocoder};

/// Everything a run talks to. Production wiring lives in `main.rs`;
/// tests plug in the mocks from `testing`.
#[derive(TypedBuilder)]
pub struct PipelineDeps {
    pub source: Arc<dyn ArticleSource>,
    pub recognizer: Arc<dyn EntityRecognizer>,
    pub geocoder: Arc<dyn Geocoder>,
    pub sink: Arc<dyn EventSink>,
    #[builder(default)]
    pub config: FileConfig,
    #[builder(default = Box::new(PositionalLocationPolicy))]
    pub policy: Box<dyn LocationPolicy>,
}

/// A classified article with its place candidates.
#[derive(Debug, Clone)]
pub struct ExtractedArticle {
    pub article: ClassifiedArticle,
    pub candidates: LocationCandidates,
}

impl AsRef<ClassifiedArticle> for ExtractedArticle {
    fn as_ref(&self) -> &ClassifiedArticle {
        &self.article
    }
}

pub struct Pipeline {
    source: Arc<dyn ArticleSource>,
    sink: Arc<dyn EventSink>,
    extractor: PlaceExtractor,
    resolver: LocationResolver,
    filter: ArticleFilter,
    config: FileConfig,
}

impl Pipeline {
    pub fn new(deps: PipelineDeps) -> Result<Self> {
        let config = deps.config;
        let filter = ArticleFilter::new(&config.filters)?;
        let resolver = LocationResolver::new(
            deps.geocoder,
            deps.policy,
            Duration::from_millis(config.geocoder.min_interval_ms),
            Duration::from_secs(config.geocoder.timeout_secs),
        )
        .with_excluded_locations(&config.filters.excluded_locations);

        Ok(Self {
            source: deps.source,
            sink: deps.sink,
            extractor: PlaceExtractor::new(deps.recognizer),
            resolver,
            filter,
            config,
        })
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink.name()
    }

    /// Build the record set and replace the persisted collection with it.
    /// A sink failure is the only error that fails the run.
    pub async fn run(&self, run_log: &mut RunLog, stats: &mut PipelineStats) -> Result<u64> {
        let events = self.build_events(run_log, stats).await;

        let written = self
            .sink
            .replace_all(&events)
            .await
            .with_context(|| format!("Failed to persist events to {} sink", self.sink.name()))?;

        stats.events_stored = written as u32;
        run_log.log(EventKind::RecordsPersisted {
            sink: self.sink.name().to_string(),
            records: written,
        });
        info!(sink = self.sink.name(), records = written, "Persisted disaster events");
        Ok(written)
    }

    /// Everything except persistence. Never fails: per-keyword, per-article
    /// and per-location problems are counted and skipped.
    pub async fn build_events(
        &self,
        run_log: &mut RunLog,
        stats: &mut PipelineStats,
    ) -> Vec<ResolvedEvent> {
        self.resolver.clear_cache().await;

        let raw = self.fetch_all(run_log, stats).await;
        let classified = classify_all(raw, stats);
        let extracted = self.extract_all(classified, run_log, stats).await;

        let (kept, counts) = self.filter.apply(extracted);
        stats.filtered = counts;
        info!(kept = kept.len(), dropped = counts.total(), "Pre-resolution filter applied");

        let resolved = self.resolve_all(kept, run_log, stats).await;
        let (events, collapsed) = collapse_occurrences(resolved);
        stats.duplicates_collapsed = collapsed;
        info!(events = events.len(), collapsed, "Occurrences collapsed");
        events
    }

    /// One query per search keyword through an ordered worker pool.
    /// A failing or slow keyword contributes nothing.
    async fn fetch_all(&self, run_log: &mut RunLog, stats: &mut PipelineStats) -> Vec<RawArticle> {
        let window_days = self.config.source.window_days;
        let timeout = Duration::from_secs(self.config.source.timeout_secs);
        let concurrency = self.config.source.fetch_concurrency.max(1);

        let results: Vec<(&str, Result<Vec<RawArticle>>)> = stream::iter(search_keywords())
            .map(|keyword| async move {
                let result = match tokio::time::timeout(timeout, self.source.fetch(keyword, window_days)).await {
                    Ok(result) => result,
                    Err(_) => Err(anyhow!("timed out after {}s", timeout.as_secs())),
                };
                (keyword, result)
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut articles = Vec::new();
        for (keyword, result) in results {
            match result {
                Ok(batch) => {
                    let count = batch.len() as u32;
                    info!(keyword, articles = count, "Fetched articles");
                    stats.keywords.push((keyword.to_string(), count));
                    stats.articles_fetched += count;
                    run_log.log(EventKind::KeywordFetched {
                        keyword: keyword.to_string(),
                        articles: count,
                    });
                    articles.extend(batch);
                }
                Err(e) => {
                    warn!(keyword, error = %e, "Keyword fetch failed");
                    stats.keywords_failed.push(keyword.to_string());
                    run_log.log(EventKind::KeywordFailed {
                        keyword: keyword.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
        articles
    }

    /// Place candidates per article through an ordered worker pool.
    /// Articles whose extraction fails or times out are dropped.
    async fn extract_all(
        &self,
        articles: Vec<ClassifiedArticle>,
        run_log: &mut RunLog,
        stats: &mut PipelineStats,
    ) -> Vec<ExtractedArticle> {
        let timeout = Duration::from_secs(self.config.extraction.timeout_secs);
        let concurrency = self.config.extraction.concurrency.max(1);

        let results: Vec<(ClassifiedArticle, Result<LocationCandidates>)> = stream::iter(articles)
            .map(|article| async move {
                let result = match tokio::time::timeout(timeout, self.extractor.candidates(&article)).await {
                    Ok(result) => result,
                    Err(_) => Err(anyhow!("timed out after {}s", timeout.as_secs())),
                };
                (article, result)
            })
            .buffered(concurrency)
            .collect()
            .await;

        let mut extracted = Vec::with_capacity(results.len());
        for (article, result) in results {
            match result {
                Ok(candidates) => extracted.push(ExtractedArticle { article, candidates }),
                Err(e) => {
                    warn!(url = %article.url, error = %e, "Place extraction failed");
                    stats.extraction_failed += 1;
                    run_log.log(EventKind::ExtractionFailed {
                        url: article.url,
                        error: e.to_string(),
                    });
                }
            }
        }
        extracted
    }

    /// Sequential: the resolver's rate limiter serialises remote lookups anyway.
    async fn resolve_all(
        &self,
        articles: Vec<ExtractedArticle>,
        run_log: &mut RunLog,
        stats: &mut PipelineStats,
    ) -> Vec<ResolvedEvent> {
        let mut events = Vec::with_capacity(articles.len());

        for ExtractedArticle { article, candidates } in articles {
            match self.resolver.resolve(&candidates).await {
                Resolution::Resolved {
                    location,
                    coords,
                    cached,
                } => {
                    if cached {
                        stats.geocode_cache_hits += 1;
                    } else {
                        stats.geocode_calls += 1;
                        run_log.log(EventKind::LocationGeocoded {
                            location: location.clone(),
                            lat: coords.lat,
                            lon: coords.lon,
                        });
                    }
                    let timestamp = article.published_at.unwrap_or(run_log.started_at);
                    events.push(ResolvedEvent::new(article, timestamp, location, coords));
                }
                Resolution::NoCandidate => {
                    debug!(url = %article.url, "No place candidates");
                    stats.no_location += 1;
                }
                Resolution::Excluded { location } => {
                    debug!(url = %article.url, location, "Location excluded");
                    stats.excluded_location += 1;
                }
                Resolution::GeocodeFailed { location, cached } => {
                    if cached {
                        stats.geocode_cache_hits += 1;
                    } else {
                        stats.geocode_calls += 1;
                        run_log.log(EventKind::GeocodeFailed {
                            location: location.clone(),
                        });
                    }
                    debug!(url = %article.url, location, "Dropping article without coordinates");
                    stats.geocode_failed += 1;
                }
            }
        }

        let distinct_locations = self.resolver.cached_locations().await;
        info!(resolved = events.len(), distinct_locations, "Locations resolved");
        events
    }
}

/// Keep articles whose title matches a disaster keyword.
fn classify_all(raw: Vec<RawArticle>, stats: &mut PipelineStats) -> Vec<ClassifiedArticle> {
    let mut classified = Vec::with_capacity(raw.len());
    for article in raw {
        let Some(category) = article.title.as_deref().map(classify) else {
            stats.untitled += 1;
            continue;
        };
        match category.and_then(|c| ClassifiedArticle::from_raw(article, c)) {
            Some(c) => classified.push(c),
            None => stats.unclassified += 1,
        }
    }
    classified
}
