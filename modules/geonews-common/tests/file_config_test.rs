use std::io::Write;

use geonews_common::file_config::{load_config, load_config_or_default};
use geonews_common::FileConfig;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_match_design_values() {
    let config = FileConfig::default();
    assert_eq!(config.source.window_days, 15);
    assert_eq!(config.source.language, "en");
    assert_eq!(config.geocoder.timeout_secs, 10);
    assert_eq!(config.geocoder.min_interval_ms, 1000);
    assert_eq!(
        config.filters.url_denylist,
        ["politics", "yahoo", "sports", "entertainment", "cricket"]
    );
    assert_eq!(config.filters.title_noise, ["tool", "angry"]);
    assert!(config.filters.excluded_locations.is_empty());
}

#[test]
fn partial_file_keeps_defaults_for_missing_keys() {
    let file = write_config(
        r#"
        [source]
        window_days = 7

        [filters]
        excluded_locations = ["Nowhere"]
        "#,
    );
    let config = load_config(file.path()).unwrap();
    assert_eq!(config.source.window_days, 7);
    assert_eq!(config.source.fetch_concurrency, 4);
    assert_eq!(config.filters.excluded_locations, ["Nowhere"]);
    assert_eq!(config.filters.title_noise, ["tool", "angry"]);
    assert_eq!(config.geocoder.min_interval_ms, 1000);
}

#[test]
fn unknown_keys_are_rejected() {
    let file = write_config(
        r#"
        [geocoder]
        timeout_secs = 5
        retries = 3
        "#,
    );
    let err = load_config(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("retries"));
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_or_default(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.source.window_days, 15);
}
