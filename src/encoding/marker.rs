use crate::{
    constants::{MARKER_FILL_OPACITY, MARKER_RADIUS_FACTOR},
    data::earthquake::EarthquakeFeature,
    encoding::{color::Color, scale::ColorScale},
};
use serde::{Deserialize, Serialize};

/// Visual encoding of one earthquake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    /// Radius in pixels; not clamped, so negative magnitudes give radius ≤ 0
    pub radius: f64,
    /// Stroke color
    pub color: Color,
    pub fill_color: Color,
    pub fill_opacity: f32,
}

impl MarkerStyle {
    /// Radius actually painted on screen
    pub fn display_radius(&self) -> f32 {
        self.radius.max(0.0) as f32
    }
}

/// Computes radius and color with the default factor and opacity
pub fn compute_marker_style(feature: &EarthquakeFeature, scale: &ColorScale) -> MarkerStyle {
    let color = scale.color_at(feature.depth);
    MarkerStyle {
        radius: feature.magnitude * MARKER_RADIUS_FACTOR,
        color,
        fill_color: color,
        fill_opacity: MARKER_FILL_OPACITY,
    }
}

/// Popup markup bound to each marker
pub fn popup_text(feature: &EarthquakeFeature) -> String {
    format!(
        "Magnitude: {}<br>Depth: {} km",
        feature.magnitude, feature.depth
    )
}

/// Session-wide encoding parameters, built once and shared by every marker
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEncoder {
    scale: ColorScale,
    radius_factor: f64,
    fill_opacity: f32,
}

impl MarkerEncoder {
    pub fn new(scale: ColorScale) -> Self {
        Self {
            scale,
            radius_factor: MARKER_RADIUS_FACTOR,
            fill_opacity: MARKER_FILL_OPACITY,
        }
    }

    pub fn with_radius_factor(mut self, radius_factor: f64) -> Self {
        self.radius_factor = radius_factor;
        self
    }

    pub fn with_fill_opacity(mut self, fill_opacity: f32) -> Self {
        self.fill_opacity = fill_opacity.clamp(0.0, 1.0);
        self
    }

    pub fn scale(&self) -> &ColorScale {
        &self.scale
    }

    pub fn radius_factor(&self) -> f64 {
        self.radius_factor
    }

    pub fn encode(&self, feature: &EarthquakeFeature) -> MarkerStyle {
        let color = self.scale.color_at(feature.depth);
        MarkerStyle {
            radius: feature.magnitude * self.radius_factor,
            color,
            fill_color: color,
            fill_opacity: self.fill_opacity,
        }
    }

    pub fn popup_text(&self, feature: &EarthquakeFeature) -> String {
        popup_text(feature)
    }
}

impl Default for MarkerEncoder {
    fn default() -> Self {
        Self::new(ColorScale::depth())
    }
}
