use crate::{
    core::viewport::Viewport, layers::base::LayerTrait, prelude::HashMap,
    rendering::context::RenderContext, MapError, Result,
};

/// Owns the map's layers and renders them bottom to top by z-index.
/// Layers with equal z-index keep insertion order.
pub struct LayerManager {
    /// All layers indexed by ID
    layers: HashMap<String, Box<dyn LayerTrait>>,
    /// Layer IDs sorted by z-index
    render_order: Vec<String>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self {
            layers: HashMap::default(),
            render_order: Vec::new(),
        }
    }

    /// Adds a layer; ids must be unique
    pub fn add_layer(&mut self, layer: Box<dyn LayerTrait>) -> Result<()> {
        let layer_id = layer.id().to_string();
        if self.layers.contains_key(&layer_id) {
            return Err(MapError::Layer(format!("duplicate layer id '{layer_id}'")));
        }
        let z_index = layer.z_index();

        let insert_pos = self
            .render_order
            .iter()
            .position(|id| {
                self.layers
                    .get(id)
                    .map(|l| l.z_index() > z_index)
                    .unwrap_or(false)
            })
            .unwrap_or(self.render_order.len());

        self.layers.insert(layer_id.clone(), layer);
        self.render_order.insert(insert_pos, layer_id);
        Ok(())
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn LayerTrait>> {
        self.render_order.retain(|id| id != layer_id);
        self.layers.remove(layer_id)
    }

    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn LayerTrait> {
        self.layers.get(layer_id).map(|l| l.as_ref())
    }

    pub fn contains(&self, layer_id: &str) -> bool {
        self.layers.contains_key(layer_id)
    }

    /// Applies a function to a specific layer mutably, then re-sorts in
    /// case its z-index changed
    pub fn with_layer_mut<F, R>(&mut self, layer_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn LayerTrait) -> R,
    {
        let result = self.layers.get_mut(layer_id).map(|layer| f(layer.as_mut()));
        if result.is_some() {
            self.update_render_order();
        }
        result
    }

    /// Layer ids in render order
    pub fn list_layers(&self) -> Vec<String> {
        self.render_order.clone()
    }

    /// Layers in render order
    pub fn layers(&self) -> Vec<&dyn LayerTrait> {
        self.render_order
            .iter()
            .filter_map(|id| self.layers.get(id).map(|l| l.as_ref()))
            .collect()
    }

    /// Renders every visible layer that may touch the viewport
    pub fn render(&self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        let viewport_bounds = viewport.bounds();

        for layer_id in &self.render_order {
            if let Some(layer) = self.layers.get(layer_id) {
                if layer.is_visible() && layer.intersects_bounds(&viewport_bounds) {
                    layer.render(context, viewport)?;
                }
            }
        }
        Ok(())
    }

    /// Re-sorts after z-indices changed; the sort is stable
    fn update_render_order(&mut self) {
        let layers = &self.layers;
        self.render_order
            .sort_by_key(|id| layers.get(id).map(|l| l.z_index()).unwrap_or(0));
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::group::LayerGroup;

    fn group(id: &str, z: i32) -> Box<dyn LayerTrait> {
        let mut group = LayerGroup::new(id.to_string(), id.to_string());
        group.set_z_index(z);
        Box::new(group)
    }

    #[test]
    fn test_render_order_follows_z_index() {
        let mut manager = LayerManager::new();
        manager.add_layer(group("top", 10)).unwrap();
        manager.add_layer(group("bottom", 0)).unwrap();
        manager.add_layer(group("middle", 5)).unwrap();
        manager.add_layer(group("middle2", 5)).unwrap();

        assert_eq!(
            manager.list_layers(),
            vec!["bottom", "middle", "middle2", "top"]
        );

        manager.with_layer_mut("bottom", |l| l.set_z_index(20));
        assert_eq!(manager.list_layers().last().map(String::as_str), Some("bottom"));
    }

    #[test]
    fn test_duplicate_and_removal() {
        let mut manager = LayerManager::new();
        manager.add_layer(group("a", 0)).unwrap();
        assert!(manager.add_layer(group("a", 1)).is_err());

        assert!(manager.remove_layer("a").is_some());
        assert!(manager.is_empty());
        assert!(manager.list_layers().is_empty());
    }
}
