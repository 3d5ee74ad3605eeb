use crate::core::geo::{LatLng, LatLngBounds};
use crate::MapError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// `[longitude, latitude]` with an optional third element (elevation or depth)
pub type Position = Vec<f64>;

/// GeoJSON geometry types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point {
        coordinates: Position,
    },
    LineString {
        coordinates: Vec<Position>,
    },
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPoint {
        coordinates: Vec<Position>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Position>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    GeometryCollection {
        geometries: Vec<GeoJsonGeometry>,
    },
}

/// GeoJSON feature with geometry and properties
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    /// `None` when absent, null, or not a readable geometry
    #[serde(default, deserialize_with = "lenient_geometry")]
    pub geometry: Option<GeoJsonGeometry>,
    #[serde(default)]
    pub properties: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Reads a feature's geometry without failing the enclosing document: a
/// geometry that does not parse (unknown type, missing or null coordinates)
/// is dropped so the feature alone can be rejected later.
fn lenient_geometry<'de, D>(deserializer: D) -> std::result::Result<Option<GeoJsonGeometry>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match serde_json::from_value(value) {
        Ok(geometry) => Some(geometry),
        Err(e) => {
            log::debug!("unreadable geometry: {}", e);
            None
        }
    }))
}

/// Root GeoJSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeoJson {
    Feature(GeoJsonFeature),
    FeatureCollection { features: Vec<GeoJsonFeature> },
}

impl GeoJson {
    /// An empty feature collection
    pub fn empty() -> Self {
        GeoJson::FeatureCollection {
            features: Vec::new(),
        }
    }

    /// Parses GeoJSON from raw bytes
    pub fn from_slice(bytes: &[u8]) -> crate::Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| MapError::ParseError(format!("Invalid GeoJSON: {}", e)))
    }

    /// Gets all features, a lone feature counting as a collection of one
    pub fn features(&self) -> &[GeoJsonFeature] {
        match self {
            GeoJson::Feature(feature) => std::slice::from_ref(feature),
            GeoJson::FeatureCollection { features } => features,
        }
    }

    pub fn len(&self) -> usize {
        self.features().len()
    }

    pub fn is_empty(&self) -> bool {
        self.features().is_empty()
    }

    /// Gets the bounding box of all features
    pub fn bounds(&self) -> Option<LatLngBounds> {
        self.features()
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .filter_map(|g| LatLngBounds::from_points(&g.to_lat_lng_points()))
            .reduce(|a, b| a.union(&b))
    }
}

impl FromStr for GeoJson {
    type Err = MapError;

    fn from_str(geojson_str: &str) -> crate::Result<Self> {
        Self::from_slice(geojson_str.as_bytes())
    }
}

impl GeoJsonFeature {
    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.properties.as_ref()?.get(key)
    }

    pub fn property_f64(&self, key: &str) -> Option<f64> {
        self.property(key)?.as_f64()
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.property(key)?.as_str()
    }

    /// Feature id rendered as text, whether it was a string or a number
    pub fn id_string(&self) -> Option<String> {
        match self.id.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

fn position_to_lat_lng(position: &[f64]) -> Option<LatLng> {
    match position {
        [lng, lat, ..] => Some(LatLng::new(*lat, *lng)),
        _ => None,
    }
}

fn ring_to_lat_lngs(ring: &[Position]) -> Vec<LatLng> {
    ring.iter().filter_map(|p| position_to_lat_lng(p)).collect()
}

impl GeoJsonGeometry {
    /// Converts coordinates to LatLng points (exterior rings only for polygons)
    pub fn to_lat_lng_points(&self) -> Vec<LatLng> {
        match self {
            GeoJsonGeometry::Point { coordinates } => {
                position_to_lat_lng(coordinates).into_iter().collect()
            }
            GeoJsonGeometry::LineString { coordinates }
            | GeoJsonGeometry::MultiPoint { coordinates } => ring_to_lat_lngs(coordinates),
            GeoJsonGeometry::Polygon { coordinates } => coordinates
                .first()
                .map(|exterior| ring_to_lat_lngs(exterior))
                .unwrap_or_default(),
            GeoJsonGeometry::MultiLineString { coordinates } => coordinates
                .iter()
                .flat_map(|line| ring_to_lat_lngs(line))
                .collect(),
            GeoJsonGeometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .filter_map(|polygon| polygon.first())
                .flat_map(|exterior| ring_to_lat_lngs(exterior))
                .collect(),
            GeoJsonGeometry::GeometryCollection { geometries } => geometries
                .iter()
                .flat_map(|geom| geom.to_lat_lng_points())
                .collect(),
        }
    }

    /// Stroked paths of the geometry: lines as-is, every polygon ring as a
    /// closed path. Points contribute nothing.
    pub fn lines(&self) -> Vec<Vec<LatLng>> {
        let mut out = Vec::new();
        self.collect_lines(&mut out);
        out
    }

    fn collect_lines(&self, out: &mut Vec<Vec<LatLng>>) {
        match self {
            GeoJsonGeometry::Point { .. } | GeoJsonGeometry::MultiPoint { .. } => {}
            GeoJsonGeometry::LineString { coordinates } => push_path(out, coordinates),
            GeoJsonGeometry::MultiLineString { coordinates }
            | GeoJsonGeometry::Polygon { coordinates } => {
                for ring in coordinates {
                    push_path(out, ring);
                }
            }
            GeoJsonGeometry::MultiPolygon { coordinates } => {
                for ring in coordinates.iter().flatten() {
                    push_path(out, ring);
                }
            }
            GeoJsonGeometry::GeometryCollection { geometries } => {
                for geom in geometries {
                    geom.collect_lines(out);
                }
            }
        }
    }
}

fn push_path(out: &mut Vec<Vec<LatLng>>, ring: &[Position]) {
    let path = ring_to_lat_lngs(ring);
    if path.len() >= 2 {
        out.push(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USGS_SAMPLE: &str = r#"
    {
        "type": "FeatureCollection",
        "metadata": {"generated": 1700000000000, "title": "USGS All Earthquakes, Past Week"},
        "features": [
            {
                "type": "Feature",
                "properties": {"mag": 1.2, "place": "10 km N of Somewhere, CA", "time": 1700000000000},
                "geometry": {"type": "Point", "coordinates": [-122.8, 38.8, 2.5]},
                "id": "nc7391"
            },
            {
                "type": "Feature",
                "properties": {"mag": null},
                "geometry": null,
                "id": 42
            }
        ],
        "bbox": [-180, -90, -5, 180, 90, 700]
    }
    "#;

    #[test]
    fn test_geojson_parsing_with_depth() {
        let geojson: GeoJson = USGS_SAMPLE.parse().unwrap();
        assert_eq!(geojson.len(), 2);

        let first = &geojson.features()[0];
        assert_eq!(first.property_f64("mag"), Some(1.2));
        assert_eq!(first.property_str("place"), Some("10 km N of Somewhere, CA"));
        assert_eq!(first.id_string().as_deref(), Some("nc7391"));
        assert_eq!(
            first.geometry,
            Some(GeoJsonGeometry::Point {
                coordinates: vec![-122.8, 38.8, 2.5]
            })
        );

        let second = &geojson.features()[1];
        assert_eq!(second.property_f64("mag"), None);
        assert!(second.geometry.is_none());
        assert_eq!(second.id_string().as_deref(), Some("42"));
    }

    #[test]
    fn test_invalid_geojson_is_parse_error() {
        let err = "{\"type\": \"Nonsense\"}".parse::<GeoJson>().unwrap_err();
        assert!(matches!(err, MapError::ParseError(_)));
    }

    #[test]
    fn test_unreadable_geometry_keeps_document() {
        let geojson: GeoJson = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {"mag": 1.0}, "geometry": {"type": "Point", "coordinates": [1.0, 2.0, 3.0]}},
            {"type": "Feature", "properties": {"mag": 2.0}, "geometry": {"type": "Point"}},
            {"type": "Feature", "properties": {"mag": 3.0}, "geometry": {"type": "Point", "coordinates": [1.0, 2.0, null]}},
            {"type": "Feature", "properties": {"mag": 4.0}, "geometry": {"type": "Circle", "radius": 5}}
        ]}"#
            .parse()
            .unwrap();
        assert_eq!(geojson.len(), 4);
        assert!(geojson.features()[0].geometry.is_some());
        assert!(geojson.features()[1..].iter().all(|f| f.geometry.is_none()));
    }

    #[test]
    fn test_single_feature_root() {
        let geojson: GeoJson = r#"{"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}}"#
            .parse()
            .unwrap();
        assert_eq!(geojson.len(), 1);
    }

    #[test]
    fn test_point_geometry() {
        let geometry = GeoJsonGeometry::Point {
            coordinates: vec![-112.5, 37.5, 10.0],
        };
        assert_eq!(geometry.to_lat_lng_points(), vec![LatLng::new(37.5, -112.5)]);
        assert!(geometry.lines().is_empty());
    }

    #[test]
    fn test_boundary_lines() {
        let geometry = GeoJsonGeometry::GeometryCollection {
            geometries: vec![
                GeoJsonGeometry::LineString {
                    coordinates: vec![vec![0.0, 0.0], vec![10.0, 5.0]],
                },
                GeoJsonGeometry::Polygon {
                    coordinates: vec![vec![
                        vec![0.0, 0.0],
                        vec![1.0, 0.0],
                        vec![1.0, 1.0],
                        vec![0.0, 0.0],
                    ]],
                },
                GeoJsonGeometry::LineString {
                    coordinates: vec![vec![3.0, 3.0]],
                },
            ],
        };
        let lines = geometry.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0][1], LatLng::new(5.0, 10.0));
        assert_eq!(lines[1].len(), 4);
    }

    #[test]
    fn test_bounds_calculation() {
        let geojson = GeoJson::FeatureCollection {
            features: vec![
                GeoJsonFeature {
                    geometry: Some(GeoJsonGeometry::Point {
                        coordinates: vec![-74.0060, 40.7128],
                    }),
                    ..Default::default()
                },
                GeoJsonFeature {
                    geometry: Some(GeoJsonGeometry::Point {
                        coordinates: vec![-73.9857, 40.7489],
                    }),
                    ..Default::default()
                },
            ],
        };

        let bounds = geojson.bounds().unwrap();
        assert_eq!(bounds.south_west.lat, 40.7128);
        assert_eq!(bounds.north_east.lat, 40.7489);
        assert!(GeoJson::empty().bounds().is_none());
    }
}
