//! # quakemap
//!
//! Earthquake map engine in the spirit of Leaflet.
//!
//! Recent earthquakes are read from a GeoJSON feed and turned into circle
//! markers sized by magnitude and colored by depth. A depth legend, optional
//! tectonic plate boundaries and switchable base layers complete the view.
//! The library stays UI-agnostic; the `egui` feature adds a painter-based
//! widget used by the `quakemap-app` viewer.

pub mod compose;
pub mod core;
pub mod data;
pub mod encoding;
pub mod layers;
pub mod prelude;
pub mod rendering;
pub mod spatial;
pub mod tiles;
pub mod ui;

pub use crate::core::constants;

// Re-export public API
pub use core::{
    builder::MapBuilder,
    config::{MapVariant, QuakeMapConfig},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::Map,
    viewport::Viewport,
};

pub use encoding::{
    color::Color,
    legend::{build_legend, Legend, LegendEntry},
    marker::{compute_marker_style, MarkerEncoder, MarkerStyle},
    scale::{ColorScale, InterpolationMode},
};

pub use data::{
    earthquake::{EarthquakeBatch, EarthquakeFeature},
    feed::{FeatureSource, FileSource, HttpSource, StaticSource, UsgsFeed},
    geojson::{GeoJson, GeoJsonFeature, GeoJsonGeometry},
};

pub use layers::{
    base::LayerTrait, group::LayerGroup, marker::CircleMarker, tile::{TileLayer, TileLayerOptions},
    vector::{PathLayer, PathStyle},
};

pub use compose::{compose, load, CompositionReport, Encoding, Feed, LoadedData, Sources};

pub use rendering::context::{DrawCommand, RenderContext};
pub use spatial::index::{SpatialIndex, SpatialItem};
pub use tiles::{TileCache, TileKey, TileLoader, TileLoaderConfig};
pub use ui::{ControlManager, ControlPosition, LayerControl, LegendControl, Popup};

#[cfg(feature = "egui")]
pub use ui::QuakeMapWidget;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Malformed feature {index}: {reason}")]
    MalformedFeature { index: usize, reason: String },

    #[error("Invalid legend: {0}")]
    InvalidLegend(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Error type alias for convenience
pub type Error = MapError;
