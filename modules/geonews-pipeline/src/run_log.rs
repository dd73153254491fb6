//! Pipeline run log: persisted JSON timeline of what happened during a run.
//!
//! Each run produces a single `{DATA_DIR}/pipeline-runs/{run_id}.json` file
//! containing the final stats and an ordered list of timestamped events.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::stats::PipelineStats;

pub struct RunLog {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    events: Vec<RunEvent>,
    seq: u32,
}

#[derive(Serialize)]
struct RunEvent {
    seq: u32,
    ts: DateTime<Utc>,
    #[serde(flatten)]
    kind: EventKind,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    KeywordFetched {
        keyword: String,
        articles: u32,
    },
    KeywordFailed {
        keyword: String,
        error: String,
    },
    ExtractionFailed {
        url: String,
        error: String,
    },
    LocationGeocoded {
        location: String,
        lat: f64,
        lon: f64,
    },
    GeocodeFailed {
        location: String,
    },
    RecordsPersisted {
        sink: String,
        records: u64,
    },
}

impl RunLog {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            events: Vec::new(),
            seq: 0,
        }
    }

    pub fn log(&mut self, kind: EventKind) {
        self.events.push(RunEvent {
            seq: self.seq,
            ts: Utc::now(),
            kind,
        });
        self.seq += 1;
    }

    /// Serialize the run log to JSON under `data_dir/pipeline-runs/`.
    /// Returns the file path on success.
    pub fn save(&self, data_dir: &Path, stats: &PipelineStats) -> Result<PathBuf> {
        let dir = data_dir.join("pipeline-runs");
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let path = dir.join(format!("{}.json", self.run_id));

        let output = SerializedRunLog {
            run_id: &self.run_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            stats: SerializedStats::from(stats),
            events: &self.events,
        };

        std::fs::write(&path, serde_json::to_string_pretty(&output)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), events = self.events.len(), "Pipeline run log saved");

        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Serialization wrappers
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SerializedRunLog<'a> {
    run_id: &'a str,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    stats: SerializedStats,
    events: &'a [RunEvent],
}

#[derive(Serialize)]
struct SerializedStats {
    articles_fetched: u32,
    keywords_failed: Vec<String>,
    unclassified: u32,
    extraction_failed: u32,
    filtered: u32,
    no_location: u32,
    excluded_location: u32,
    geocode_calls: u32,
    geocode_cache_hits: u32,
    geocode_failed: u32,
    duplicates_collapsed: u32,
    events_stored: u32,
}

impl From<&PipelineStats> for SerializedStats {
    fn from(s: &PipelineStats) -> Self {
        Self {
            articles_fetched: s.articles_fetched,
            keywords_failed: s.keywords_failed.clone(),
            unclassified: s.unclassified,
            extraction_failed: s.extraction_failed,
            filtered: s.filtered.total(),
            no_location: s.no_location,
            excluded_location: s.excluded_location,
            geocode_calls: s.geocode_calls,
            geocode_cache_hits: s.geocode_cache_hits,
            geocode_failed: s.geocode_failed,
            duplicates_collapsed: s.duplicates_collapsed,
            events_stored: s.events_stored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_writes_timeline_with_tagged_events() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = RunLog::new("run-123".into());
        log.log(EventKind::KeywordFetched {
            keyword: "flood".into(),
            articles: 4,
        });
        log.log(EventKind::GeocodeFailed {
            location: "Atlantis".into(),
        });
        let stats = PipelineStats {
            articles_fetched: 4,
            ..Default::default()
        };

        let path = log.save(dir.path(), &stats).unwrap();
        assert_eq!(path, dir.path().join("pipeline-runs").join("run-123.json"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["run_id"], "run-123");
        assert_eq!(json["stats"]["articles_fetched"], 4);
        let events = json["events"].as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["type"], "keyword_fetched");
        assert_eq!(events[0]["keyword"], "flood");
        assert_eq!(events[1]["seq"], 1);
        assert_eq!(events[1]["type"], "geocode_failed");
    }
}
