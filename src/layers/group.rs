use crate::{
    core::{geo::LatLngBounds, viewport::Viewport},
    layers::{
        base::{LayerProperties, LayerTrait, LayerType},
        marker::CircleMarker,
    },
    rendering::context::RenderContext,
    Result,
};

/// A named, toggleable collection of layers shown and hidden together.
///
/// Children render in insertion order; hiding the group hides every child
/// without touching their own visibility flags.
pub struct LayerGroup {
    properties: LayerProperties,
    layers: Vec<Box<dyn LayerTrait>>,
}

impl LayerGroup {
    pub fn new(id: String, name: String) -> Self {
        Self {
            properties: LayerProperties::new(id, name, LayerType::Group),
            layers: Vec::new(),
        }
    }

    pub fn add_layer(&mut self, layer: Box<dyn LayerTrait>) {
        self.layers.push(layer);
    }

    /// Removes the first child with `layer_id`
    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn LayerTrait>> {
        let pos = self.layers.iter().position(|l| l.id() == layer_id)?;
        Some(self.layers.remove(pos))
    }

    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn LayerTrait> {
        self.layers
            .iter()
            .find(|l| l.id() == layer_id)
            .map(|l| l.as_ref())
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn LayerTrait> {
        self.layers.iter().map(|l| l.as_ref())
    }

    /// Children that are circle markers
    pub fn markers(&self) -> impl Iterator<Item = &CircleMarker> {
        self.layers
            .iter()
            .filter_map(|l| l.as_any().downcast_ref::<CircleMarker>())
    }
}

impl LayerTrait for LayerGroup {
    crate::impl_layer_trait!(LayerGroup, properties);

    fn bounds(&self) -> Option<LatLngBounds> {
        self.layers
            .iter()
            .filter_map(|l| l.bounds())
            .reduce(|acc, b| acc.union(&b))
    }

    // Children may be pixel-sized (markers), so the group never culls itself.
    fn intersects_bounds(&self, _bounds: &LatLngBounds) -> bool {
        true
    }

    fn options(&self) -> serde_json::Value {
        serde_json::json!({
            "layers": self.layers.len()
        })
    }

    fn render(&self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let view_bounds = viewport.bounds();
        for layer in &self.layers {
            if layer.is_visible() && layer.intersects_bounds(&view_bounds) {
                layer.render(context, viewport)?;
            }
        }
        Ok(())
    }
}
