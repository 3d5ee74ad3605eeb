//! Loading both feeds and merging them into the map.
//!
//! [`load`] runs the earthquake and plate-boundary fetches concurrently and
//! waits for both; each resolves to its own `Result` and neither affects the
//! other. [`compose`] is then the only place that mutates the map: it adds
//! the markers and legend when the earthquake feed succeeded and the plate
//! lines when that feed succeeded. The two contributions touch disjoint
//! overlays, so the outcome does not depend on which fetch finished first.

use crate::{
    constants::{
        EARTHQUAKES_LAYER_ID, EARTHQUAKES_OVERLAY, TECTONIC_PLATES_LAYER_ID,
        TECTONIC_PLATES_OVERLAY,
    },
    core::{
        config::{LegendConfig, QuakeMapConfig},
        map::Map,
    },
    data::{
        earthquake::read_earthquakes,
        feed::{source_for, FeatureSource},
        geojson::GeoJson,
    },
    encoding::marker::MarkerEncoder,
    layers::{group::LayerGroup, marker::CircleMarker, vector::PathLayer, vector::PathStyle},
    MapError, Result,
};
use std::fmt;

/// The two feeds a map draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Earthquakes,
    TectonicPlates,
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feed::Earthquakes => write!(f, "earthquake feed"),
            Feed::TectonicPlates => write!(f, "tectonic plates feed"),
        }
    }
}

/// Where each feed is read from
pub struct Sources {
    pub earthquakes: Box<dyn FeatureSource>,
    /// `None` for maps without a plates overlay
    pub tectonic_plates: Option<Box<dyn FeatureSource>>,
}

impl Sources {
    pub fn new(
        earthquakes: Box<dyn FeatureSource>,
        tectonic_plates: Option<Box<dyn FeatureSource>>,
    ) -> Self {
        Self {
            earthquakes,
            tectonic_plates,
        }
    }

    pub fn from_config(config: &QuakeMapConfig) -> Result<Self> {
        let timeout = config.feed_timeout();
        let earthquakes = source_for(&config.feeds.earthquakes, timeout)?;
        let tectonic_plates = config
            .feeds
            .tectonic_plates
            .as_deref()
            .map(|location| source_for(location, timeout))
            .transpose()?;
        Ok(Self::new(earthquakes, tectonic_plates))
    }
}

/// Outcome of both fetches, each independent of the other
#[derive(Debug)]
pub struct LoadedData {
    pub earthquakes: Result<GeoJson>,
    /// `None` when no plates source was configured
    pub tectonic_plates: Option<Result<GeoJson>>,
}

/// Fetches both feeds concurrently and waits for both to settle
pub async fn load(sources: &Sources) -> LoadedData {
    log::debug!(
        "loading {} and {}",
        sources.earthquakes.describe(),
        sources
            .tectonic_plates
            .as_ref()
            .map(|s| s.describe())
            .unwrap_or_else(|| "no plates feed".to_string())
    );

    let plates = async {
        match &sources.tectonic_plates {
            Some(source) => Some(source.fetch().await),
            None => None,
        }
    };
    let (earthquakes, tectonic_plates) = futures::join!(sources.earthquakes.fetch(), plates);

    LoadedData {
        earthquakes,
        tectonic_plates,
    }
}

/// Session-wide visual parameters used while composing
#[derive(Debug, Clone, Default)]
pub struct Encoding {
    pub markers: MarkerEncoder,
    pub legend: LegendConfig,
    pub plates: PathStyle,
}

impl Encoding {
    pub fn from_config(config: &QuakeMapConfig) -> Result<Self> {
        Ok(Self {
            markers: config.marker_encoder()?,
            legend: config.legend.clone(),
            plates: config.plates.path_style(),
        })
    }
}

/// What [`compose`] added to the map
#[derive(Debug, Default)]
pub struct CompositionReport {
    pub markers_added: usize,
    /// Features skipped for missing magnitude or coordinates
    pub features_rejected: usize,
    pub legend_attached: bool,
    /// Polylines added to the plates overlay, `None` if it was not added
    pub plate_paths: Option<usize>,
    pub failures: Vec<(Feed, MapError)>,
}

impl CompositionReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, feed: Feed) -> bool {
        self.failures.iter().any(|(f, _)| *f == feed)
    }
}

/// Merges loaded feeds into `map`. A failed feed is logged and reported;
/// it never prevents the other feed's layer from being added.
pub fn compose(map: &mut Map, data: LoadedData, encoding: &Encoding) -> CompositionReport {
    let mut report = CompositionReport::default();

    match data.earthquakes {
        Ok(geojson) => add_earthquakes(map, &geojson, encoding, &mut report),
        Err(e) => {
            log::error!("error fetching earthquake data: {e}");
            report.failures.push((Feed::Earthquakes, e));
        }
    }

    match data.tectonic_plates {
        Some(Ok(geojson)) => add_plates(map, &geojson, &encoding.plates, &mut report),
        Some(Err(e)) => {
            log::error!("error fetching tectonic plates data: {e}");
            report.failures.push((Feed::TectonicPlates, e));
        }
        None => {}
    }

    log::info!(
        "composed {} markers ({} rejected), legend: {}, plate paths: {:?}",
        report.markers_added,
        report.features_rejected,
        report.legend_attached,
        report.plate_paths
    );
    report
}

fn ensure_group(map: &mut Map, id: &str, name: &str) {
    if map.group(id).is_none() {
        log::warn!("overlay group '{id}' missing, creating it");
        map.remove_overlay(id);
        let group = LayerGroup::new(id.to_string(), name.to_string());
        if let Err(e) = map.add_overlay(Box::new(group)) {
            log::error!("could not recreate overlay group '{id}': {e}");
        }
    }
}

fn add_earthquakes(
    map: &mut Map,
    geojson: &GeoJson,
    encoding: &Encoding,
    report: &mut CompositionReport,
) {
    let batch = read_earthquakes(geojson);
    report.features_rejected = batch.rejected.len();

    let markers: Vec<CircleMarker> = batch
        .features
        .iter()
        .enumerate()
        .map(|(index, quake)| {
            let id = quake
                .id
                .clone()
                .unwrap_or_else(|| format!("quake-{index}"));
            CircleMarker::new(id, quake.position(), encoding.markers.encode(quake))
                .bind_popup(encoding.markers.popup_text(quake))
        })
        .collect();
    report.markers_added = markers.len();

    ensure_group(map, EARTHQUAKES_LAYER_ID, EARTHQUAKES_OVERLAY);
    map.with_group_mut(EARTHQUAKES_LAYER_ID, |group| {
        for marker in markers {
            group.add_layer(Box::new(marker));
        }
    });

    // The legend follows the feed, not the feature count: an empty feed
    // still gets one
    match encoding.legend.build(encoding.markers.scale()) {
        Ok(legend) => {
            map.add_legend(legend, encoding.legend.position);
            report.legend_attached = true;
        }
        Err(e) => {
            log::error!("legend not attached: {e}");
            report.failures.push((Feed::Earthquakes, e));
        }
    }
}

fn add_plates(map: &mut Map, geojson: &GeoJson, style: &PathStyle, report: &mut CompositionReport) {
    let layer = PathLayer::from_geojson(
        "plate_boundaries".to_string(),
        TECTONIC_PLATES_OVERLAY.to_string(),
        geojson,
        style.clone(),
    );
    report.plate_paths = Some(layer.path_count());

    ensure_group(map, TECTONIC_PLATES_LAYER_ID, TECTONIC_PLATES_OVERLAY);
    map.with_group_mut(TECTONIC_PLATES_LAYER_ID, |group| {
        group.add_layer(Box::new(layer));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::MapBuilder;
    use crate::core::config::MapVariant;

    fn quakes_json() -> GeoJson {
        r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": "a", "properties": {"mag": 2.5},
                 "geometry": {"type": "Point", "coordinates": [-112.0, 37.0, 8.0]}},
                {"type": "Feature", "id": "b", "properties": {"mag": null},
                 "geometry": {"type": "Point", "coordinates": [-112.0, 37.0, 8.0]}}
            ]
        }"#
        .parse()
        .unwrap()
    }

    fn plates_json() -> GeoJson {
        r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "LineString", "coordinates": [[-120, 30], [-110, 40]]}}
            ]
        }"#
        .parse()
        .unwrap()
    }

    #[test]
    fn test_compose_both_feeds() {
        let mut map = MapBuilder::new().build().unwrap();
        let data = LoadedData {
            earthquakes: Ok(quakes_json()),
            tectonic_plates: Some(Ok(plates_json())),
        };
        let report = compose(&mut map, data, &Encoding::default());

        assert!(report.is_complete());
        assert_eq!(report.markers_added, 1);
        assert_eq!(report.features_rejected, 1);
        assert!(report.legend_attached);
        assert_eq!(report.plate_paths, Some(1));
        assert_eq!(map.group(EARTHQUAKES_LAYER_ID).map(|g| g.len()), Some(1));
        assert_eq!(map.group(TECTONIC_PLATES_LAYER_ID).map(|g| g.len()), Some(1));
    }

    #[test]
    fn test_earthquake_failure_leaves_plates() {
        let mut map = MapBuilder::new().build().unwrap();
        let data = LoadedData {
            earthquakes: Err(MapError::Unavailable("offline".into())),
            tectonic_plates: Some(Ok(plates_json())),
        };
        let report = compose(&mut map, data, &Encoding::default());

        assert!(report.failed(Feed::Earthquakes));
        assert!(!report.legend_attached);
        assert!(map.controls().legend().is_none());
        assert_eq!(map.group(EARTHQUAKES_LAYER_ID).map(|g| g.len()), Some(0));
        assert_eq!(report.plate_paths, Some(1));
    }

    #[test]
    fn test_missing_group_is_created() {
        let mut map = MapBuilder::from_variant(&MapVariant::Basic).build().unwrap();
        assert!(map.group(TECTONIC_PLATES_LAYER_ID).is_none());

        let data = LoadedData {
            earthquakes: Ok(GeoJson::empty()),
            tectonic_plates: Some(Ok(plates_json())),
        };
        compose(&mut map, data, &Encoding::default());
        assert_eq!(map.group(TECTONIC_PLATES_LAYER_ID).map(|g| g.len()), Some(1));
    }

    #[test]
    fn test_non_group_layer_is_replaced_by_group() {
        let mut map = MapBuilder::new().build().unwrap();
        map.remove_overlay(EARTHQUAKES_LAYER_ID);
        let stray = PathLayer::new(
            EARTHQUAKES_LAYER_ID.to_string(),
            "stray".to_string(),
            PathStyle::default(),
        );
        map.add_overlay(Box::new(stray)).unwrap();
        assert!(map.group(EARTHQUAKES_LAYER_ID).is_none());

        let data = LoadedData {
            earthquakes: Ok(quakes_json()),
            tectonic_plates: None,
        };
        let report = compose(&mut map, data, &Encoding::default());
        assert_eq!(report.markers_added, 1);
        assert_eq!(map.group(EARTHQUAKES_LAYER_ID).map(|g| g.len()), Some(1));
    }

    #[test]
    fn test_invalid_legend_still_adds_markers() {
        let mut map = MapBuilder::new().build().unwrap();
        let mut encoding = Encoding::default();
        encoding.legend.thresholds.clear();

        let data = LoadedData {
            earthquakes: Ok(quakes_json()),
            tectonic_plates: None,
        };
        let report = compose(&mut map, data, &encoding);

        assert_eq!(report.markers_added, 1);
        assert!(!report.legend_attached);
        assert!(matches!(
            report.failures.as_slice(),
            [(Feed::Earthquakes, MapError::InvalidLegend(_))]
        ));
    }

    #[tokio::test]
    async fn test_load_is_independent_per_feed() {
        use crate::data::feed::StaticSource;

        let sources = Sources::new(
            Box::new(StaticSource::ok("quakes", quakes_json())),
            Some(Box::new(StaticSource::failing("plates", "HTTP 503"))),
        );
        let data = load(&sources).await;
        assert_eq!(data.earthquakes.as_ref().map(|g| g.len()).ok(), Some(2));
        assert!(matches!(data.tectonic_plates, Some(Err(MapError::Unavailable(_)))));

        let sources = Sources::new(Box::new(StaticSource::ok("quakes", GeoJson::empty())), None);
        assert!(load(&sources).await.tectonic_plates.is_none());
    }
}
