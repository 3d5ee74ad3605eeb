use crate::{
    constants::{PLATE_STROKE_COLOR, PLATE_STROKE_WEIGHT},
    core::{
        geo::{LatLng, LatLngBounds, Point},
        viewport::Viewport,
    },
    data::geojson::GeoJson,
    encoding::color::Color,
    layers::base::{LayerProperties, LayerTrait, LayerType},
    rendering::context::{LineRenderStyle, RenderContext},
    Result,
};
use serde::{Deserialize, Serialize};

/// Stroke applied to every path of a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStyle {
    /// Line color
    pub color: Color,
    /// Line width in pixels
    pub weight: f32,
    /// Opacity (0.0 to 1.0)
    #[serde(default = "default_path_opacity")]
    pub opacity: f32,
}

fn default_path_opacity() -> f32 {
    1.0
}

impl PathStyle {
    pub fn new(color: Color, weight: f32) -> Self {
        Self {
            color,
            weight,
            opacity: 1.0,
        }
    }

    /// Orange, 2 px: the plate boundary stroke
    pub fn plate_boundaries() -> Self {
        let color = Color::named(PLATE_STROKE_COLOR).unwrap_or(Color::rgb(255, 165, 0));
        Self::new(color, PLATE_STROKE_WEIGHT)
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::plate_boundaries()
    }
}

/// A set of stroked polylines sharing one style, e.g. plate boundaries
pub struct PathLayer {
    properties: LayerProperties,
    paths: Vec<Vec<LatLng>>,
    /// Per-path extents, kept parallel to `paths` for viewport culling
    path_bounds: Vec<LatLngBounds>,
    style: PathStyle,
}

impl PathLayer {
    pub fn new(id: String, name: String, style: PathStyle) -> Self {
        Self {
            properties: LayerProperties::new(id, name, LayerType::Vector),
            paths: Vec::new(),
            path_bounds: Vec::new(),
            style,
        }
    }

    /// Collects the stroked paths of every feature in `geojson`.
    /// Features without geometry and point geometries are skipped.
    pub fn from_geojson(id: String, name: String, geojson: &GeoJson, style: PathStyle) -> Self {
        let mut layer = Self::new(id, name, style);
        for feature in geojson.features() {
            if let Some(geometry) = &feature.geometry {
                for path in geometry.lines() {
                    layer.add_path(path);
                }
            }
        }
        log::debug!(
            "path layer '{}' built with {} paths",
            layer.properties.id,
            layer.paths.len()
        );
        layer
    }

    /// Adds a polyline; paths with fewer than two points are ignored
    pub fn add_path(&mut self, path: Vec<LatLng>) {
        if path.len() < 2 {
            return;
        }
        if let Some(bounds) = LatLngBounds::from_points(&path) {
            self.path_bounds.push(bounds);
            self.paths.push(path);
        }
    }

    pub fn paths(&self) -> &[Vec<LatLng>] {
        &self.paths
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn style(&self) -> &PathStyle {
        &self.style
    }

    pub fn set_style(&mut self, style: PathStyle) {
        self.style = style;
    }
}

impl LayerTrait for PathLayer {
    crate::impl_layer_trait!(PathLayer, properties);

    fn bounds(&self) -> Option<LatLngBounds> {
        let mut iter = self.path_bounds.iter();
        let first = iter.next()?.clone();
        Some(iter.fold(first, |acc, b| acc.union(b)))
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({
            "color": self.style.color.to_hex(),
            "weight": self.style.weight,
            "opacity": self.style.opacity,
            "paths": self.paths.len()
        })
    }

    fn render(&self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let view_bounds = viewport.bounds();
        let style = LineRenderStyle {
            color: self
                .style
                .color
                .with_opacity(self.style.opacity * self.properties.opacity),
            width: self.style.weight,
        };

        for (path, bounds) in self.paths.iter().zip(&self.path_bounds) {
            if !bounds.intersects(&view_bounds) {
                continue;
            }
            let points: Vec<Point> = path
                .iter()
                .map(|ll| viewport.lat_lng_to_pixel(ll))
                .collect();
            context.render_line(points, style.clone());
        }
        Ok(())
    }
}
