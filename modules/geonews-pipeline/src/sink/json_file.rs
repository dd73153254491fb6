use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::info;

use geonews_common::ResolvedEvent;

use crate::traits::EventSink;

/// A JSON array on disk. Writes go to a temp file in the same directory which
/// is then renamed over the target, so readers never see a partial file.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents; a missing file is an empty collection.
    pub fn load(&self) -> Result<Vec<ResolvedEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }
}

/// Blocking half of `replace_all`: temp file, fsync, rename.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(&dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[async_trait]
impl EventSink for JsonFileSink {
    async fn replace_all(&self, events: &[ResolvedEvent]) -> Result<u64> {
        let contents = serde_json::to_vec_pretty(events)?;
        tokio::task::spawn_blocking({
            let path = self.path.clone();
            move || write_atomically(&path, &contents)
        })
        .await
        .context("JSON sink writer task failed")??;
        info!(path = %self.path.display(), rows = events.len(), "Wrote event file");
        Ok(events.len() as u64)
    }

    fn name(&self) -> &'static str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::resolved;
    use geonews_common::DisasterCategory;

    #[tokio::test]
    async fn replace_all_overwrites_previous_collection() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("out").join("events.json"));

        let first = vec![
            resolved("Quake", DisasterCategory::Earthquake, "2024-04-03T01:00:00Z", "Hualien"),
            resolved("Flood", DisasterCategory::Flood, "2024-04-03T02:00:00Z", "Jakarta"),
        ];
        assert_eq!(sink.replace_all(&first).await.unwrap(), 2);
        assert_eq!(sink.load().unwrap(), first);

        let second = vec![resolved(
            "Storm",
            DisasterCategory::Storm,
            "2024-04-04T05:00:00Z",
            "Manila",
        )];
        sink.replace_all(&second).await.unwrap();
        assert_eq!(sink.load().unwrap(), second);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("out"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, ["events.json"]);
    }

    #[tokio::test]
    async fn empty_collection_is_written_as_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("events.json"));
        sink.replace_all(&[]).await.unwrap();
        assert_eq!(std::fs::read_to_string(sink.path()).unwrap().trim(), "[]");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn write_failure_is_reported_and_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let sink = JsonFileSink::new(blocker.join("events.json"));
        let events = vec![resolved("Flood", DisasterCategory::Flood, "2024-04-03T02:00:00Z", "Jakarta")];
        let err = sink.replace_all(&events).await.unwrap_err();
        assert!(format!("{err:#}").contains("Failed to create"));
        assert_eq!(std::fs::read_to_string(&blocker).unwrap(), "x");
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("nope.json"));
        assert!(sink.load().unwrap().is_empty());
    }
}
