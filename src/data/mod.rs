pub mod earthquake;
pub mod feed;
pub mod geojson;

pub use earthquake::{read_earthquakes, EarthquakeBatch, EarthquakeFeature};
pub use feed::{source_for, FeatureSource, FileSource, HttpSource, StaticSource, UsgsFeed};
pub use geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry};
