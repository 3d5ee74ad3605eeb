//! Engine-wide defaults: feed locations, Leaflet-derived map defaults and the
//! visual-encoding parameters shared by markers and the legend.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// USGS summary feed for all earthquakes of the past week.
pub const USGS_ALL_WEEK_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_week.geojson";

/// Base URL of the USGS summary feeds.
pub const USGS_FEED_BASE_URL: &str = "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary";

/// PB2002 plate boundaries as GeoJSON.
pub const TECTONIC_PLATES_URL: &str =
    "https://raw.githubusercontent.com/fraxen/tectonicplates/master/GeoJSON/PB2002_boundaries.json";

/// Initial map center (western United States).
pub const DEFAULT_CENTER: (f64, f64) = (37.5, -112.5);

/// Marker radius in pixels per unit of magnitude.
pub const MARKER_RADIUS_FACTOR: f64 = 4.0;

/// Marker fill opacity.
pub const MARKER_FILL_OPACITY: f32 = 0.8;

/// Depth domain of the color scale, in km.
pub const DEPTH_DOMAIN: (f64, f64) = (0.0, 180.0);

/// Anchor colors of the depth scale, shallow to deep.
pub const DEPTH_COLORS: [&str; 3] = ["green", "yellow", "red"];

/// Legend thresholds in km; the last bucket is open-ended.
pub const LEGEND_DEPTHS: [f64; 4] = [0.0, 60.0, 120.0, 180.0];

/// Legend heading.
pub const LEGEND_TITLE: &str = "Depth Legend";

/// Plate boundary stroke.
pub const PLATE_STROKE_COLOR: &str = "orange";
pub const PLATE_STROKE_WEIGHT: f32 = 2.0;

/// Overlay names shown in the layer switcher.
pub const EARTHQUAKES_OVERLAY: &str = "Earthquakes";
pub const TECTONIC_PLATES_OVERLAY: &str = "Tectonic Plates";

/// Layer ids of the overlay groups.
pub const EARTHQUAKES_LAYER_ID: &str = "earthquakes";
pub const TECTONIC_PLATES_LAYER_ID: &str = "tectonic_plates";

/// User agent sent with feed and tile requests.
pub const USER_AGENT: &str = concat!("quakemap/", env!("CARGO_PKG_VERSION"));

/// Tiles kept in memory per map.
pub const DEFAULT_TILE_CACHE_SIZE: usize = 512;
