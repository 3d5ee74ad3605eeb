use crate::{
    core::geo::LatLng,
    data::geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry},
    MapError, Result,
};
use serde::{Deserialize, Serialize};

/// One earthquake as read from the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeFeature {
    pub magnitude: f64,
    /// Kilometres below the surface; negative above sea level
    pub depth: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub id: Option<String>,
    pub place: Option<String>,
}

impl EarthquakeFeature {
    pub fn new(magnitude: f64, depth: f64, latitude: f64, longitude: f64) -> Self {
        Self {
            magnitude,
            depth,
            latitude,
            longitude,
            id: None,
            place: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// Reads `properties.mag` and `geometry.coordinates = [lng, lat, depth]`.
    /// `index` is the feature's position in the feed, used in error reports.
    pub fn from_feature(feature: &GeoJsonFeature, index: usize) -> Result<Self> {
        let malformed = |reason: &str| MapError::MalformedFeature {
            index,
            reason: reason.to_string(),
        };

        let magnitude = feature
            .property_f64("mag")
            .ok_or_else(|| malformed("missing numeric properties.mag"))?;

        let coordinates = match &feature.geometry {
            Some(GeoJsonGeometry::Point { coordinates }) => coordinates,
            Some(_) => return Err(malformed("geometry is not a Point")),
            None => return Err(malformed("missing or unreadable geometry")),
        };

        let [longitude, latitude, depth] = match coordinates.as_slice() {
            [lng, lat, depth, ..] => [*lng, *lat, *depth],
            _ => return Err(malformed("expected [longitude, latitude, depth]")),
        };

        Ok(Self {
            magnitude,
            depth,
            latitude,
            longitude,
            id: feature.id_string(),
            place: feature.property_str("place").map(str::to_string),
        })
    }
}

impl TryFrom<&GeoJsonFeature> for EarthquakeFeature {
    type Error = MapError;

    fn try_from(feature: &GeoJsonFeature) -> Result<Self> {
        Self::from_feature(feature, 0)
    }
}

/// Earthquakes read from one feed, with the features that could not be read
#[derive(Debug, Default)]
pub struct EarthquakeBatch {
    pub features: Vec<EarthquakeFeature>,
    pub rejected: Vec<MapError>,
}

impl EarthquakeBatch {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Reads every feature of a feed. A feature with missing fields is logged and
/// skipped; the rest of the feed is still read.
pub fn read_earthquakes(geojson: &GeoJson) -> EarthquakeBatch {
    let mut batch = EarthquakeBatch::default();

    for (index, feature) in geojson.features().iter().enumerate() {
        match EarthquakeFeature::from_feature(feature, index) {
            Ok(quake) => batch.features.push(quake),
            Err(e) => {
                log::warn!("skipping earthquake: {}", e);
                batch.rejected.push(e);
            }
        }
    }

    log::debug!(
        "read {} earthquakes ({} rejected)",
        batch.features.len(),
        batch.rejected.len()
    );
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(value: serde_json::Value) -> GeoJsonFeature {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_reads_usgs_feature() {
        let f = feature(json!({
            "type": "Feature",
            "id": "us7000abcd",
            "properties": {"mag": 4.6, "place": "South of the Fiji Islands"},
            "geometry": {"type": "Point", "coordinates": [178.1, -25.3, 560.2]}
        }));
        let quake = EarthquakeFeature::try_from(&f).unwrap();
        assert_eq!(quake.magnitude, 4.6);
        assert_eq!(quake.depth, 560.2);
        assert_eq!(quake.position(), LatLng::new(-25.3, 178.1));
        assert_eq!(quake.id.as_deref(), Some("us7000abcd"));
        assert_eq!(quake.place.as_deref(), Some("South of the Fiji Islands"));
    }

    #[test]
    fn test_negative_depth_is_kept() {
        let f = feature(json!({
            "properties": {"mag": 0.8},
            "geometry": {"type": "Point", "coordinates": [-116.8, 33.5, -5.0]}
        }));
        assert_eq!(EarthquakeFeature::try_from(&f).unwrap().depth, -5.0);
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let no_mag = feature(json!({
            "properties": {"mag": null},
            "geometry": {"type": "Point", "coordinates": [0.0, 0.0, 1.0]}
        }));
        let no_depth = feature(json!({
            "properties": {"mag": 2.0},
            "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}
        }));
        let line = feature(json!({
            "properties": {"mag": 2.0},
            "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]}
        }));
        let no_geometry = feature(json!({"properties": {"mag": 2.0}}));

        for (index, f) in [no_mag, no_depth, line, no_geometry].iter().enumerate() {
            let err = EarthquakeFeature::from_feature(f, index).unwrap_err();
            assert!(
                matches!(err, MapError::MalformedFeature { index: i, .. } if i == index),
                "unexpected error {err}"
            );
        }
    }

    #[test]
    fn test_read_earthquakes_skips_bad_features() {
        let geojson: GeoJson = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {"properties": {"mag": 1.0}, "geometry": {"type": "Point", "coordinates": [1.0, 2.0, 3.0]}},
                {"properties": {}, "geometry": {"type": "Point", "coordinates": [1.0, 2.0, 3.0]}},
                {"properties": {"mag": 2.0}, "geometry": {"type": "Point", "coordinates": [4.0, 5.0, 6.0]}}
            ]
        }))
        .unwrap();

        let batch = read_earthquakes(&geojson);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.features[1].magnitude, 2.0);
    }

    #[test]
    fn test_empty_feed() {
        let batch = read_earthquakes(&GeoJson::empty());
        assert!(batch.is_empty());
        assert!(batch.rejected.is_empty());
    }
}
