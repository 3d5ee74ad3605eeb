//! Reading feeds from disk and resolving feed locations from config.

use quakemap::{
    data::source_for, load, FeatureSource, FileSource, MapError, QuakeMapConfig, Sources,
};
use std::io::Write;
use std::time::Duration;

const USGS_SAMPLE: &str = r#"{
    "type": "FeatureCollection",
    "metadata": {"generated": 1700000000000, "title": "USGS All Earthquakes, Past Week", "count": 2},
    "features": [
        {"type": "Feature", "id": "nc73912345",
         "properties": {"mag": 1.87, "place": "10km NW of The Geysers, CA", "time": 1700000000000},
         "geometry": {"type": "Point", "coordinates": [-122.83, 38.84, 2.41]}},
        {"type": "Feature", "id": "us7000l123",
         "properties": {"mag": 4.6, "place": "Fiji region", "time": 1700000100000},
         "geometry": {"type": "Point", "coordinates": [-178.2, -17.9, 560.3]}}
    ],
    "bbox": [-178.2, -17.9, 2.41, -122.83, 38.84, 560.3]
}"#;

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_file_source_reads_usgs_feed() {
    let file = write_temp(USGS_SAMPLE);
    let source = FileSource::new(file.path());

    let geojson = source.fetch().await.unwrap();
    assert_eq!(geojson.len(), 2);
    assert_eq!(geojson.features()[1].property_f64("mag"), Some(4.6));
}

#[tokio::test]
async fn test_file_source_errors() {
    let missing = FileSource::new("/nonexistent/quakes.geojson");
    assert!(matches!(missing.fetch().await, Err(MapError::Io(_))));

    let garbage = write_temp("<html>503 Service Unavailable</html>");
    let source = FileSource::new(garbage.path());
    assert!(source.fetch().await.is_err());
}

#[tokio::test]
async fn test_sources_from_config_use_local_files() {
    let quakes = write_temp(USGS_SAMPLE);
    let plates = write_temp(
        r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "LineString", "coordinates": [[170, -20], [179, -15]]}}
        ]}"#,
    );

    let mut config = QuakeMapConfig::default();
    config.feeds.earthquakes = quakes.path().display().to_string();
    config.feeds.tectonic_plates = Some(format!("file://{}", plates.path().display()));

    let sources = Sources::from_config(&config).unwrap();
    let data = load(&sources).await;
    assert_eq!(data.earthquakes.unwrap().len(), 2);
    assert_eq!(data.tectonic_plates.unwrap().unwrap().len(), 1);
}

#[test]
fn test_source_for_locations() {
    let timeout = Some(Duration::from_secs(5));
    let http = source_for("https://earthquake.usgs.gov/feed.geojson", timeout).unwrap();
    assert_eq!(http.describe(), "https://earthquake.usgs.gov/feed.geojson");

    let file = source_for("file:///tmp/quakes.geojson", timeout).unwrap();
    assert_eq!(file.describe(), "/tmp/quakes.geojson");

    assert!(source_for("", timeout).is_err());
}

#[test]
fn test_feed_timeout_is_off_unless_configured() {
    let config = QuakeMapConfig::default();
    assert_eq!(config.feed_timeout(), None);
    assert!(source_for("https://earthquake.usgs.gov/feed.geojson", None).is_ok());

    let config = QuakeMapConfig::from_json_str(r#"{"feeds": {"timeout_secs": 120}}"#).unwrap();
    assert_eq!(config.feed_timeout(), Some(Duration::from_secs(120)));

    let mut config = QuakeMapConfig::default();
    config.feeds.timeout_secs = Some(0);
    assert!(config.validate().is_err());
}
