//! Map configuration: view, feeds, visual encoding, legend and base layers.
//!
//! Presets mirror the two published map pages through [`MapVariant`]; a
//! JSON file can override any section, and missing sections fall back to the
//! tectonic-plates preset.

use crate::{
    constants::{
        DEFAULT_CENTER, DEFAULT_TILE_CACHE_SIZE, DEPTH_COLORS, DEPTH_DOMAIN,
        LEGEND_DEPTHS, LEGEND_TITLE, MARKER_FILL_OPACITY, MARKER_RADIUS_FACTOR,
        TECTONIC_PLATES_URL, USGS_ALL_WEEK_URL,
    },
    core::geo::LatLng,
    encoding::{
        color::Color,
        legend::{build_legend, Legend},
        marker::MarkerEncoder,
        scale::{ColorScale, InterpolationMode},
    },
    layers::{tile::TileLayerOptions, vector::PathStyle},
    prelude::HashSet,
    ui::controls::ControlPosition,
    MapError, Result,
};
use serde::{Deserialize, Serialize};
use std::{path::Path, str::FromStr, time::Duration};

/// Which of the two map pages to reproduce
#[derive(Debug, Clone, PartialEq)]
pub enum MapVariant {
    /// Earthquakes on a single street layer
    Basic,
    /// Earthquakes and plate boundaries with switchable base layers
    TectonicPlates,
    Custom(Box<QuakeMapConfig>),
}

impl MapVariant {
    pub fn resolve(&self) -> QuakeMapConfig {
        match self {
            Self::Basic => QuakeMapConfig {
                view: ViewConfig {
                    zoom: 5.0,
                    ..ViewConfig::default()
                },
                feeds: FeedConfig {
                    tectonic_plates: None,
                    ..FeedConfig::default()
                },
                base_layers: BaseLayersConfig {
                    layers: vec![BaseLayerConfig::new(
                        "street",
                        "Street Map",
                        TileLayerOptions::street(),
                    )],
                    default_layer: "street".to_string(),
                    ..BaseLayersConfig::default()
                },
                layer_control: false,
                ..QuakeMapConfig::tectonic_plates()
            },
            Self::TectonicPlates => QuakeMapConfig::tectonic_plates(),
            Self::Custom(config) => config.as_ref().clone(),
        }
    }
}

impl Default for MapVariant {
    fn default() -> Self {
        Self::TectonicPlates
    }
}

impl FromStr for MapVariant {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "tectonic-plates" | "tectonic_plates" | "plates" => Ok(Self::TectonicPlates),
            other => Err(MapError::Config(format!("unknown map variant '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub center: LatLng,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            center: LatLng::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1),
            zoom: 4.0,
            min_zoom: 1.0,
            max_zoom: 18.0,
        }
    }
}

/// Feed locations: `http(s)://` URLs or local file paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub earthquakes: String,
    pub tectonic_plates: Option<String>,
    /// Whole-request limit in seconds; requests are never cut short when unset
    pub timeout_secs: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            earthquakes: USGS_ALL_WEEK_URL.to_string(),
            tectonic_plates: Some(TECTONIC_PLATES_URL.to_string()),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthScaleConfig {
    /// CSS names or hex strings, shallow to deep
    pub colors: Vec<String>,
    /// Depth range in km covered by the colors
    pub domain: [f64; 2],
    pub mode: InterpolationMode,
}

impl Default for DepthScaleConfig {
    fn default() -> Self {
        Self {
            colors: DEPTH_COLORS.iter().map(|c| c.to_string()).collect(),
            domain: [DEPTH_DOMAIN.0, DEPTH_DOMAIN.1],
            mode: InterpolationMode::Lab,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Pixels of radius per unit of magnitude
    pub radius_factor: f64,
    pub fill_opacity: f32,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            radius_factor: MARKER_RADIUS_FACTOR,
            fill_opacity: MARKER_FILL_OPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub title: String,
    /// Ascending depth thresholds in km
    pub thresholds: Vec<f64>,
    pub position: ControlPosition,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            title: LEGEND_TITLE.to_string(),
            thresholds: LEGEND_DEPTHS.to_vec(),
            position: ControlPosition::BottomRight,
        }
    }
}

impl LegendConfig {
    pub fn build(&self, scale: &ColorScale) -> Result<Legend> {
        Ok(build_legend(&self.thresholds, scale)?.with_title(self.title.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateConfig {
    pub color: Color,
    pub weight: f32,
}

impl Default for PlateConfig {
    fn default() -> Self {
        let style = PathStyle::plate_boundaries();
        Self {
            color: style.color,
            weight: style.weight,
        }
    }
}

impl PlateConfig {
    pub fn path_style(&self) -> PathStyle {
        PathStyle::new(self.color, self.weight)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseLayerConfig {
    pub id: String,
    /// Label in the layer switcher
    pub name: String,
    #[serde(flatten)]
    pub options: TileLayerOptions,
}

impl BaseLayerConfig {
    pub fn new(id: &str, name: &str, options: TileLayerOptions) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            options,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseLayersConfig {
    pub layers: Vec<BaseLayerConfig>,
    /// Id of the layer shown at start
    pub default_layer: String,
    /// Tiles kept in memory across all base layers
    pub cache_size: usize,
}

impl Default for BaseLayersConfig {
    fn default() -> Self {
        Self {
            layers: vec![
                BaseLayerConfig::new("street", "Street Map", TileLayerOptions::street()),
                BaseLayerConfig::new("dark", "Dark Map", TileLayerOptions::dark()),
                BaseLayerConfig::new("satellite", "Satellite Map", TileLayerOptions::satellite()),
            ],
            default_layer: "satellite".to_string(),
            cache_size: DEFAULT_TILE_CACHE_SIZE,
        }
    }
}

/// Complete map configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuakeMapConfig {
    pub view: ViewConfig,
    pub feeds: FeedConfig,
    pub depth_scale: DepthScaleConfig,
    pub markers: MarkerConfig,
    pub legend: LegendConfig,
    pub plates: PlateConfig,
    pub base_layers: BaseLayersConfig,
    /// Whether to add the base layer / overlay switcher
    pub layer_control: bool,
}

impl Default for QuakeMapConfig {
    fn default() -> Self {
        Self::tectonic_plates()
    }
}

impl QuakeMapConfig {
    fn tectonic_plates() -> Self {
        Self {
            view: ViewConfig::default(),
            feeds: FeedConfig::default(),
            depth_scale: DepthScaleConfig::default(),
            markers: MarkerConfig::default(),
            legend: LegendConfig::default(),
            plates: PlateConfig::default(),
            base_layers: BaseLayersConfig::default(),
            layer_control: true,
        }
    }

    /// Parses and validates a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        log::debug!("loaded config from {}", path.display());
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let view = &self.view;
        if !(0.0..=18.0).contains(&view.min_zoom)
            || !(0.0..=18.0).contains(&view.max_zoom)
            || view.min_zoom > view.max_zoom
        {
            return Err(MapError::Config(format!(
                "zoom limits [{}, {}] must lie in [0, 18] and be ordered",
                view.min_zoom, view.max_zoom
            )));
        }
        if !(view.min_zoom..=view.max_zoom).contains(&view.zoom) {
            return Err(MapError::Config(format!(
                "initial zoom {} outside [{}, {}]",
                view.zoom, view.min_zoom, view.max_zoom
            )));
        }
        if !view.center.is_valid() {
            return Err(MapError::Config(format!(
                "invalid center {:?}",
                view.center
            )));
        }

        if self.feeds.earthquakes.trim().is_empty() {
            return Err(MapError::Config("earthquake feed location is empty".into()));
        }
        if self.feeds.timeout_secs == Some(0) {
            return Err(MapError::Config("feed timeout must be positive".into()));
        }

        let scale = self.color_scale()?;
        self.legend.build(&scale)?;

        if !self.markers.radius_factor.is_finite() {
            return Err(MapError::Config("marker radius factor must be finite".into()));
        }
        if !(0.0..=1.0).contains(&self.markers.fill_opacity) {
            return Err(MapError::Config(format!(
                "marker fill opacity {} outside [0, 1]",
                self.markers.fill_opacity
            )));
        }
        if !(self.plates.weight.is_finite() && self.plates.weight >= 0.0) {
            return Err(MapError::Config("plate stroke weight must be >= 0".into()));
        }

        let layers = &self.base_layers.layers;
        if layers.is_empty() {
            return Err(MapError::Config("at least one base layer is required".into()));
        }
        let mut ids = HashSet::default();
        for layer in layers {
            if !ids.insert(layer.id.as_str()) {
                return Err(MapError::Config(format!("duplicate base layer id '{}'", layer.id)));
            }
            if layer.options.min_zoom > layer.options.max_zoom {
                return Err(MapError::Config(format!(
                    "base layer '{}' has min_zoom > max_zoom",
                    layer.id
                )));
            }
        }
        if !ids.contains(self.base_layers.default_layer.as_str()) {
            return Err(MapError::Config(format!(
                "default base layer '{}' is not defined",
                self.base_layers.default_layer
            )));
        }
        Ok(())
    }

    pub fn color_scale(&self) -> Result<ColorScale> {
        let [lo, hi] = self.depth_scale.domain;
        ColorScale::from_names(&self.depth_scale.colors, (lo, hi), self.depth_scale.mode)
    }

    pub fn marker_encoder(&self) -> Result<MarkerEncoder> {
        Ok(MarkerEncoder::new(self.color_scale()?)
            .with_radius_factor(self.markers.radius_factor)
            .with_fill_opacity(self.markers.fill_opacity))
    }

    pub fn feed_timeout(&self) -> Option<Duration> {
        self.feeds.timeout_secs.map(Duration::from_secs)
    }
}
