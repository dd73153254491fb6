use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use geonews_common::file_config::load_config_or_default;
use geonews_common::AppConfig;
use geonews_pipeline::pipeline::{Pipeline, PipelineDeps};
use geonews_pipeline::run_log::RunLog;
use geonews_pipeline::sink;
use geonews_pipeline::source::NewsApiSource;
use geonews_pipeline::stats::PipelineStats;
use ner_client::NerClient;
use newsapi_client::NewsApiClient;
use nominatim_client::NominatimClient;

#[derive(Parser)]
#[command(name = "geonews-pipeline", about = "Fetch, classify and geolocate disaster news")]
struct Cli {
    /// Path to config TOML file
    #[arg(long, env = "GEONEWS_CONFIG", default_value = "config/geonews.toml")]
    config: PathBuf,

    /// Build the record set and report, but leave the persisted collection alone
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
                .add_directive("geonews=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    let file_config = load_config_or_default(&cli.config)?;

    let source = NewsApiSource::new(
        NewsApiClient::new(
            &config.newsapi_key,
            Duration::from_secs(file_config.source.timeout_secs),
        )
        .with_base_url(&config.newsapi_url),
        &file_config.source.language,
    );
    let recognizer = NerClient::new(&config.ner_url, &file_config.extraction.model);
    let geocoder = NominatimClient::new(
        &config.nominatim_user_agent,
        Duration::from_secs(file_config.geocoder.timeout_secs),
    )
    .with_base_url(&config.nominatim_url);

    let sink = sink::open(&config.sink).await?;

    let pipeline = Pipeline::new(
        PipelineDeps::builder()
            .source(Arc::new(source))
            .recognizer(Arc::new(recognizer))
            .geocoder(Arc::new(geocoder))
            .sink(sink)
            .config(file_config)
            .build(),
    )?;

    let run_id = Uuid::new_v4().to_string();
    let mut run_log = RunLog::new(run_id.clone());
    let mut stats = PipelineStats::default();
    tracing::info!(run_id, dry_run = cli.dry_run, sink = pipeline.sink_name(), "Starting pipeline run");

    let outcome = if cli.dry_run {
        let events = pipeline.build_events(&mut run_log, &mut stats).await;
        tracing::info!(events = events.len(), "Dry run, skipping sink");
        Ok(0)
    } else {
        pipeline.run(&mut run_log, &mut stats).await
    };

    if let Err(e) = run_log.save(&config.data_dir, &stats) {
        tracing::warn!(error = %e, "Failed to save run log");
    }
    println!("{stats}");

    outcome.map(|_| ())
}
