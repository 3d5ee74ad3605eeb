use crate::{
    core::{
        geo::{LatLng, LatLngBounds},
        viewport::Viewport,
    },
    encoding::marker::MarkerStyle,
    layers::base::{LayerProperties, LayerTrait, LayerType},
    rendering::context::{CircleRenderStyle, RenderContext},
    Result,
};

/// Stroke width Leaflet uses for circle markers
const CIRCLE_STROKE_WIDTH: f32 = 3.0;

/// A screen-sized circle pinned to a geographic position
pub struct CircleMarker {
    properties: LayerProperties,
    position: LatLng,
    style: MarkerStyle,
    popup_text: Option<String>,
}

impl CircleMarker {
    pub fn new(id: String, position: LatLng, style: MarkerStyle) -> Self {
        let properties = LayerProperties::new(id, "Marker".to_string(), LayerType::Marker);
        Self {
            properties,
            position,
            style,
            popup_text: None,
        }
    }

    /// Attaches popup markup shown when the marker is clicked
    pub fn bind_popup(mut self, text: String) -> Self {
        self.popup_text = Some(text);
        self
    }

    pub fn popup_text(&self) -> Option<&str> {
        self.popup_text.as_deref()
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn style(&self) -> &MarkerStyle {
        &self.style
    }

    /// Painted radius in pixels, never negative
    pub fn radius(&self) -> f64 {
        self.style.radius.max(0.0)
    }
}

impl LayerTrait for CircleMarker {
    crate::impl_layer_trait!(CircleMarker, properties);

    fn bounds(&self) -> Option<LatLngBounds> {
        Some(LatLngBounds::new(self.position, self.position))
    }

    // Circle markers keep their pixel size, so an off-screen center may still
    // paint inside the view; culling happens in screen space in `render`.
    fn intersects_bounds(&self, _bounds: &LatLngBounds) -> bool {
        true
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({
            "position": {
                "lat": self.position.lat,
                "lng": self.position.lng
            },
            "radius": self.style.radius,
            "color": self.style.color.to_hex(),
            "fillColor": self.style.fill_color.to_hex(),
            "fillOpacity": self.style.fill_opacity,
            "popup": self.popup_text
        })
    }

    fn render(&self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let center = viewport.lat_lng_to_pixel(&self.position);
        let radius = self.radius();
        if !context.is_circle_visible(&center, radius + CIRCLE_STROKE_WIDTH as f64) {
            return Ok(());
        }

        let opacity = self.properties.opacity;
        context.render_circle(
            center,
            CircleRenderStyle {
                fill_color: self
                    .style
                    .fill_color
                    .with_opacity(self.style.fill_opacity * opacity),
                stroke_color: self.style.color.with_opacity(opacity),
                stroke_width: CIRCLE_STROKE_WIDTH,
                radius: radius as f32,
            },
        );
        Ok(())
    }
}
