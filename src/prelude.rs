//! Prelude module for common quakemap types and traits
//!
//! `use quakemap::prelude::*;` brings in the map context, the feed and
//! composition entry points and the visual-encoding types.

pub use crate::core::{
    builder::MapBuilder,
    config::{MapVariant, QuakeMapConfig},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::Map,
    viewport::Viewport,
};

pub use crate::compose::{compose, load, CompositionReport, Encoding, Feed, LoadedData, Sources};

pub use crate::data::{
    earthquake::{read_earthquakes, EarthquakeBatch, EarthquakeFeature},
    feed::{FeatureSource, FileSource, HttpSource, StaticSource},
    geojson::{GeoJson, GeoJsonFeature},
};

pub use crate::encoding::{
    color::Color,
    legend::{build_legend, Legend},
    marker::{MarkerEncoder, MarkerStyle},
    scale::ColorScale,
};

pub use crate::layers::{
    base::LayerTrait, group::LayerGroup, manager::LayerManager, marker::CircleMarker,
    tile::TileLayer, vector::PathLayer,
};

pub use crate::rendering::context::{DrawCommand, RenderContext};
pub use crate::spatial::index::{SpatialIndex, SpatialItem};
pub use crate::tiles::{TileCache, TileKey, TileLoader, TileLoaderConfig};
pub use crate::ui::{ControlPosition, Popup};

#[cfg(feature = "egui")]
pub use crate::ui::QuakeMapWidget;

pub use crate::{MapError, Result};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
