//! Feed sources: where GeoJSON comes from.
//!
//! Every source resolves to a plain `Result<GeoJson>`. Sources never touch the
//! map; merging is left to [`crate::compose`].

use crate::{
    constants::{USER_AGENT, USGS_FEED_BASE_URL},
    data::geojson::GeoJson,
    MapError, Result,
};
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Anything that can produce a GeoJSON document
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Human-readable location, used in logs
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<GeoJson>;
}

/// Downloads GeoJSON over HTTP(S)
pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    /// Source whose requests run until the server answers or the
    /// connection drops
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, None)
    }

    /// `timeout` bounds the whole request, body included, when set
    pub fn with_timeout(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl FeatureSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<GeoJson> {
        log::debug!("GET {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MapError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        log::debug!("{} returned {} bytes", self.url, body.len());
        GeoJson::from_slice(&body)
    }
}

/// Reads GeoJSON from a local file
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FeatureSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<GeoJson> {
        let bytes = tokio::fs::read(&self.path).await?;
        GeoJson::from_slice(&bytes)
    }
}

/// In-memory source with a fixed outcome
pub struct StaticSource {
    name: String,
    outcome: std::result::Result<GeoJson, String>,
}

impl StaticSource {
    pub fn ok(name: impl Into<String>, geojson: GeoJson) -> Self {
        Self {
            name: name.into(),
            outcome: Ok(geojson),
        }
    }

    pub fn failing(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: Err(reason.into()),
        }
    }
}

#[async_trait]
impl FeatureSource for StaticSource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    async fn fetch(&self) -> Result<GeoJson> {
        match &self.outcome {
            Ok(geojson) => Ok(geojson.clone()),
            Err(reason) => Err(MapError::Unavailable(format!("{}: {}", self.name, reason))),
        }
    }
}

/// Picks a source from a location string: `http(s)://` URLs are downloaded,
/// anything else (optionally prefixed with `file://`) is read from disk.
pub fn source_for(location: &str, timeout: Option<Duration>) -> Result<Box<dyn FeatureSource>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpSource::with_timeout(location, timeout)?))
    } else {
        let path = location.strip_prefix("file://").unwrap_or(location);
        if path.is_empty() {
            return Err(MapError::Config("empty feed location".into()));
        }
        Ok(Box::new(FileSource::new(path)))
    }
}

/// Magnitude threshold of a USGS summary feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsgsMagnitude {
    Significant,
    M4_5,
    M2_5,
    M1_0,
    All,
}

/// Time window of a USGS summary feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsgsPeriod {
    Hour,
    Day,
    Week,
    Month,
}

/// One of the USGS real-time GeoJSON summary feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsgsFeed {
    pub magnitude: UsgsMagnitude,
    pub period: UsgsPeriod,
}

impl UsgsFeed {
    pub const ALL_HOUR: UsgsFeed = UsgsFeed::new(UsgsMagnitude::All, UsgsPeriod::Hour);
    pub const ALL_DAY: UsgsFeed = UsgsFeed::new(UsgsMagnitude::All, UsgsPeriod::Day);
    pub const ALL_WEEK: UsgsFeed = UsgsFeed::new(UsgsMagnitude::All, UsgsPeriod::Week);
    pub const ALL_MONTH: UsgsFeed = UsgsFeed::new(UsgsMagnitude::All, UsgsPeriod::Month);

    pub const fn new(magnitude: UsgsMagnitude, period: UsgsPeriod) -> Self {
        Self { magnitude, period }
    }

    pub fn url(&self) -> String {
        format!("{}/{}.geojson", USGS_FEED_BASE_URL, self)
    }
}

impl Default for UsgsFeed {
    fn default() -> Self {
        Self::ALL_WEEK
    }
}

impl fmt::Display for UsgsFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = match self.magnitude {
            UsgsMagnitude::Significant => "significant",
            UsgsMagnitude::M4_5 => "4.5",
            UsgsMagnitude::M2_5 => "2.5",
            UsgsMagnitude::M1_0 => "1.0",
            UsgsMagnitude::All => "all",
        };
        let period = match self.period {
            UsgsPeriod::Hour => "hour",
            UsgsPeriod::Day => "day",
            UsgsPeriod::Week => "week",
            UsgsPeriod::Month => "month",
        };
        write!(f, "{}_{}", magnitude, period)
    }
}

impl FromStr for UsgsFeed {
    type Err = MapError;

    /// Parses feed names such as `all_week` or `4.5_day`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || MapError::Config(format!("unknown USGS feed '{}'", s));
        let (magnitude, period) = s.trim().rsplit_once('_').ok_or_else(invalid)?;

        let magnitude = match magnitude {
            "significant" => UsgsMagnitude::Significant,
            "4.5" => UsgsMagnitude::M4_5,
            "2.5" => UsgsMagnitude::M2_5,
            "1.0" => UsgsMagnitude::M1_0,
            "all" => UsgsMagnitude::All,
            _ => return Err(invalid()),
        };
        let period = match period {
            "hour" => UsgsPeriod::Hour,
            "day" => UsgsPeriod::Day,
            "week" => UsgsPeriod::Week,
            "month" => UsgsPeriod::Month,
            _ => return Err(invalid()),
        };
        Ok(Self::new(magnitude, period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::USGS_ALL_WEEK_URL;

    #[test]
    fn test_usgs_feed_urls() {
        assert_eq!(UsgsFeed::default().url(), USGS_ALL_WEEK_URL);
        assert_eq!(
            UsgsFeed::new(UsgsMagnitude::M4_5, UsgsPeriod::Day).url(),
            "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/4.5_day.geojson"
        );
    }

    #[test]
    fn test_usgs_feed_parsing() {
        assert_eq!("all_hour".parse::<UsgsFeed>().unwrap(), UsgsFeed::ALL_HOUR);
        assert_eq!(
            "significant_month".parse::<UsgsFeed>().unwrap(),
            UsgsFeed::new(UsgsMagnitude::Significant, UsgsPeriod::Month)
        );
        assert!("all_year".parse::<UsgsFeed>().is_err());
        assert!("weekly".parse::<UsgsFeed>().is_err());
    }

    #[tokio::test]
    async fn test_static_sources() {
        let ok = StaticSource::ok("memory", GeoJson::empty());
        assert!(ok.fetch().await.unwrap().is_empty());

        let failing = StaticSource::failing("plates", "connection refused");
        let err = failing.fetch().await.unwrap_err();
        assert!(matches!(err, MapError::Unavailable(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_source_for_locations() {
        let timeout = Some(Duration::from_secs(5));
        let http = source_for("https://example.org/feed.geojson", timeout).unwrap();
        assert_eq!(http.describe(), "https://example.org/feed.geojson");

        let file = source_for("file:///tmp/feed.geojson", timeout).unwrap();
        assert_eq!(file.describe(), "/tmp/feed.geojson");

        assert!(source_for("", timeout).is_err());
    }
}
