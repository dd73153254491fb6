//! Full pipeline runs through the mocks in `geonews_pipeline::testing`.
//!
//! Time is paused in every test: the geocoder rate limiter and the per-call
//! timeouts advance the clock instead of sleeping.
//!
//! Run with: cargo test -p geonews-pipeline --test pipeline_test

use std::collections::HashSet;
use std::sync::Arc;

use geonews_common::file_config::FiltersConfig;
use geonews_common::{DisasterCategory, FileConfig};
use geonews_pipeline::pipeline::{Pipeline, PipelineDeps};
use geonews_pipeline::run_log::RunLog;
use geonews_pipeline::stats::PipelineStats;
use geonews_pipeline::testing::{
    fixed_published_at, raw, MemorySink, MockGeocoder, MockRecognizer, MockSource, JAKARTA, MANILA,
    TOKYO,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    pipeline: Pipeline,
    geocoder: Arc<MockGeocoder>,
    sink: Arc<MemorySink>,
}

fn harness(source: MockSource, recognizer: MockRecognizer, geocoder: MockGeocoder) -> Harness {
    harness_with(source, recognizer, geocoder, MemorySink::new(), FileConfig::default())
}

fn harness_with(
    source: MockSource,
    recognizer: MockRecognizer,
    geocoder: MockGeocoder,
    sink: MemorySink,
    config: FileConfig,
) -> Harness {
    let geocoder = Arc::new(geocoder);
    let sink = Arc::new(sink);
    let pipeline = Pipeline::new(
        PipelineDeps::builder()
            .source(Arc::new(source))
            .recognizer(Arc::new(recognizer))
            .geocoder(geocoder.clone())
            .sink(sink.clone())
            .config(config)
            .build(),
    )
    .expect("pipeline builds");
    Harness {
        pipeline,
        geocoder,
        sink,
    }
}

fn run_log() -> RunLog {
    RunLog::new("test-run".into())
}

/// A geocoder that knows the three test cities.
fn city_geocoder() -> MockGeocoder {
    MockGeocoder::new()
        .on("Tokyo", TOKYO.0, TOKYO.1)
        .on("Jakarta", JAKARTA.0, JAKARTA.1)
        .on("Manila", MANILA.0, MANILA.1)
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn run_produces_distinct_geolocated_events() {
    let source = MockSource::new()
        .on(
            "earthquake",
            vec![
                raw(
                    "Earthquake rocks Japan",
                    Some("Buildings in Kanto and Tokyo swayed"),
                    "https://wire.example/jp-1",
                ),
                raw("Earthquake rocks Japan", None, "https://other.example/jp-copy"),
                raw("Earthquake aftershock felt in Tokyo", None, "https://wire.example/jp-2"),
                raw("Earthquake legend of Atlantis", None, "https://myth.example/a"),
                raw("Earthquake drill held at schools", None, "https://wire.example/drill"),
                raw("Earthquake response debated", None, "https://news.example/politics/q"),
            ],
        )
        .on(
            "flood",
            vec![raw("Flood waters rise in Jakarta", None, "https://wire.example/id-1")],
        )
        .on(
            "storm",
            vec![raw("Stock markets weather the week", None, "https://biz.example/s")],
        );

    let recognizer = MockRecognizer::new()
        .on_text("Earthquake rocks Japan", &[("Japan", "GPE")])
        .on_text(
            "Buildings in Kanto and Tokyo swayed",
            &[("Kanto", "GPE"), ("Tokyo", "GPE")],
        )
        .on_text("Earthquake aftershock felt in Tokyo", &[("Tokyo", "GPE")])
        .on_text("Earthquake legend of Atlantis", &[("Atlantis", "GPE")])
        .on_text("Earthquake response debated", &[("Tokyo", "GPE")])
        .on_text(
            "Flood waters rise in Jakarta",
            &[("Jakarta", "GPE"), ("BNPB", "ORG")],
        );

    let h = harness(source, recognizer, city_geocoder().hanging_on("Atlantis"));
    let mut log = run_log();
    let mut stats = PipelineStats::default();

    let written = h.pipeline.run(&mut log, &mut stats).await.unwrap();
    assert_eq!(written, 2);

    let events = h.sink.events();
    let summary: Vec<_> = events
        .iter()
        .map(|e| (e.disaster_event, e.location.as_str()))
        .collect();
    assert_eq!(
        summary,
        [
            (DisasterCategory::Earthquake, "Tokyo"),
            (DisasterCategory::Flood, "Jakarta"),
        ]
    );
    assert_eq!(events[0].title, "Earthquake rocks Japan");
    assert_eq!(events[0].url, "https://wire.example/jp-1");
    assert_eq!(events[0].timestamp, fixed_published_at());
    assert_eq!(events[0].source.as_deref(), Some("Test Wire"));
    assert_eq!((events[1].latitude, events[1].longitude), JAKARTA);

    assert_eq!(stats.articles_fetched, 8);
    assert_eq!(stats.unclassified, 1);
    assert_eq!(stats.filtered.duplicate_title, 1);
    assert_eq!(stats.filtered.denied_url, 1);
    assert_eq!(stats.no_location, 1);
    assert_eq!(stats.geocode_failed, 1);
    assert_eq!(stats.geocode_cache_hits, 1);
    assert_eq!(stats.duplicates_collapsed, 1);
    assert_eq!(stats.events_stored, 2);

    // Tokyo is looked up once even though two articles resolve to it.
    assert_eq!(h.geocoder.calls(), ["Tokyo", "Atlantis", "Jakarta"]);
}

#[tokio::test(start_paused = true)]
async fn persisted_events_have_finite_coordinates_and_unique_occurrences() {
    let titles = [
        ("Flood in Manila", "Manila"),
        ("Flood warning for Manila", "Manila"),
        ("Flood hits Jakarta", "Jakarta"),
        ("Flood recedes in Tokyo", "Tokyo"),
        ("Flood relief reaches Jakarta", "Jakarta"),
    ];
    let mut recognizer = MockRecognizer::new();
    let mut articles = Vec::new();
    for (i, (title, place)) in titles.iter().enumerate() {
        recognizer = recognizer.on_text(title, &[(*place, "GPE")]);
        articles.push(raw(title, None, &format!("https://wire.example/{i}")));
    }
    let source = MockSource::new().on("flood", articles);

    let h = harness(source, recognizer, city_geocoder());
    let mut stats = PipelineStats::default();
    h.pipeline.run(&mut run_log(), &mut stats).await.unwrap();

    let events = h.sink.events();
    assert_eq!(events.len(), 3);
    assert!(events
        .iter()
        .all(|e| e.latitude.is_finite() && e.longitude.is_finite()));
    let keys: HashSet<_> = events.iter().map(|e| e.occurrence_key()).collect();
    assert_eq!(keys.len(), events.len());
    assert_eq!(stats.duplicates_collapsed, 2);
}

#[tokio::test(start_paused = true)]
async fn two_runs_over_the_same_window_persist_identical_sets() {
    let source = MockSource::new().on(
        "cyclone",
        vec![
            raw("Cyclone nears Manila", None, "https://wire.example/ph"),
            raw("Cyclone batters Jakarta coast", None, "https://wire.example/id"),
        ],
    );
    let recognizer = MockRecognizer::new()
        .on_text("Cyclone nears Manila", &[("Manila", "GPE")])
        .on_text("Cyclone batters Jakarta coast", &[("Jakarta", "GPE")]);

    let h = harness(source, recognizer, city_geocoder());

    h.pipeline
        .run(&mut run_log(), &mut PipelineStats::default())
        .await
        .unwrap();
    let first = h.sink.events();

    h.pipeline
        .run(&mut run_log(), &mut PipelineStats::default())
        .await
        .unwrap();
    let second = h.sink.events();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(h.sink.replace_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_lookup_is_retried_on_the_next_run() {
    let source = MockSource::new().on(
        "earthquake",
        vec![raw("Earthquake shakes Lima", None, "https://wire.example/pe")],
    );
    let recognizer =
        MockRecognizer::new().on_text("Earthquake shakes Lima", &[("Lima", "GPE")]);

    let h = harness(source, recognizer, MockGeocoder::new().failing_on("Lima"));

    let mut first = PipelineStats::default();
    h.pipeline.run(&mut run_log(), &mut first).await.unwrap();
    assert_eq!(first.geocode_calls, 1);
    assert_eq!(first.geocode_failed, 1);

    let mut second = PipelineStats::default();
    h.pipeline.run(&mut run_log(), &mut second).await.unwrap();
    assert_eq!(second.geocode_calls, 1);
    assert_eq!(second.geocode_cache_hits, 0);
    assert_eq!(h.geocoder.calls(), ["Lima", "Lima"]);
    assert!(h.sink.events().is_empty());
}

// ---------------------------------------------------------------------------
// Failure isolation
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn failing_keyword_degrades_coverage_only() {
    let source = MockSource::new()
        .failing_on("earthquake")
        .hanging_on("tsunami")
        .on(
            "flood",
            vec![raw("Flood waters rise in Jakarta", None, "https://wire.example/id-1")],
        );
    let recognizer =
        MockRecognizer::new().on_text("Flood waters rise in Jakarta", &[("Jakarta", "GPE")]);

    let h = harness(source, recognizer, city_geocoder());
    let mut stats = PipelineStats::default();
    h.pipeline.run(&mut run_log(), &mut stats).await.unwrap();

    assert_eq!(h.sink.events().len(), 1);
    assert_eq!(stats.keywords_failed, ["earthquake", "tsunami"]);
    assert_eq!(stats.keywords.len(), 13);
}

#[tokio::test(start_paused = true)]
async fn extraction_failure_drops_only_that_article() {
    let source = MockSource::new().on(
        "storm",
        vec![
            raw("Storm hits Manila", None, "https://wire.example/ph"),
            raw("Storm floods Jakarta streets", None, "https://wire.example/id"),
        ],
    );
    let recognizer = MockRecognizer::new()
        .failing_on("Storm hits Manila")
        .on_text("Storm floods Jakarta streets", &[("Jakarta", "GPE")]);

    let h = harness(source, recognizer, city_geocoder());
    let mut stats = PipelineStats::default();
    h.pipeline.run(&mut run_log(), &mut stats).await.unwrap();

    let events = h.sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].location, "Jakarta");
    // "floods" outranks "storm" in the keyword priority list.
    assert_eq!(events[0].disaster_event, DisasterCategory::Flood);
    assert_eq!(stats.extraction_failed, 1);
}

#[tokio::test(start_paused = true)]
async fn geocode_timeout_excludes_article_without_error() {
    let source = MockSource::new().on(
        "volcano",
        vec![raw("Volcano erupts near Atlantis", None, "https://myth.example/v")],
    );
    let recognizer =
        MockRecognizer::new().on_text("Volcano erupts near Atlantis", &[("Atlantis", "GPE")]);

    let h = harness(source, recognizer, MockGeocoder::new().hanging_on("Atlantis"));
    let mut stats = PipelineStats::default();
    let written = h.pipeline.run(&mut run_log(), &mut stats).await.unwrap();

    assert_eq!(written, 0);
    assert!(h.sink.events().is_empty());
    assert_eq!(stats.geocode_failed, 1);
}

#[tokio::test(start_paused = true)]
async fn sink_failure_fails_the_run() {
    let source = MockSource::new().on(
        "flood",
        vec![raw("Flood waters rise in Jakarta", None, "https://wire.example/id-1")],
    );
    let recognizer =
        MockRecognizer::new().on_text("Flood waters rise in Jakarta", &[("Jakarta", "GPE")]);

    let h = harness_with(
        source,
        recognizer,
        city_geocoder(),
        MemorySink::failing(),
        FileConfig::default(),
    );
    let mut stats = PipelineStats::default();
    let err = h.pipeline.run(&mut run_log(), &mut stats).await.unwrap_err();

    assert!(err.to_string().contains("memory sink"));
    assert_eq!(stats.events_stored, 0);
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn excluded_locations_are_never_geocoded() {
    let source = MockSource::new().on(
        "flood",
        vec![
            raw("Flood in Manila", None, "https://wire.example/1"),
            raw("Flood in Jakarta", None, "https://wire.example/2"),
        ],
    );
    let recognizer = MockRecognizer::new()
        .on_text("Flood in Manila", &[("Manila", "GPE")])
        .on_text("Flood in Jakarta", &[("Jakarta", "GPE")]);
    let config = FileConfig {
        filters: FiltersConfig {
            excluded_locations: vec!["manila".into()],
            ..FiltersConfig::default()
        },
        ..FileConfig::default()
    };

    let h = harness_with(source, recognizer, city_geocoder(), MemorySink::new(), config);
    let mut stats = PipelineStats::default();
    h.pipeline.run(&mut run_log(), &mut stats).await.unwrap();

    assert_eq!(h.sink.events().len(), 1);
    assert_eq!(h.geocoder.calls(), ["Jakarta"]);
    assert_eq!(stats.excluded_location, 1);
}

#[tokio::test(start_paused = true)]
async fn missing_publication_time_falls_back_to_run_start() {
    let mut article = raw("Heatwave grips Manila", None, "https://wire.example/h");
    article.published_at = None;
    let source = MockSource::new().on("heatwave", vec![article]);
    let recognizer =
        MockRecognizer::new().on_text("Heatwave grips Manila", &[("Manila", "GPE")]);

    let h = harness(source, recognizer, city_geocoder());
    let mut log = run_log();
    h.pipeline
        .run(&mut log, &mut PipelineStats::default())
        .await
        .unwrap();

    let events = h.sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].timestamp, log.started_at);
}

#[tokio::test(start_paused = true)]
async fn dry_run_builds_events_without_touching_the_sink() {
    let source = MockSource::new().on(
        "flood",
        vec![raw("Flood in Jakarta", None, "https://wire.example/2")],
    );
    let recognizer = MockRecognizer::new().on_text("Flood in Jakarta", &[("Jakarta", "GPE")]);

    let h = harness(source, recognizer, city_geocoder());
    let events = h
        .pipeline
        .build_events(&mut run_log(), &mut PipelineStats::default())
        .await;

    assert_eq!(events.len(), 1);
    assert_eq!(h.sink.replace_count(), 0);
}
