//! Builds a ready-to-compose [`Map`] from a [`QuakeMapConfig`].

use crate::{
    constants::{
        EARTHQUAKES_LAYER_ID, EARTHQUAKES_OVERLAY, TECTONIC_PLATES_LAYER_ID,
        TECTONIC_PLATES_OVERLAY,
    },
    core::{
        config::{MapVariant, QuakeMapConfig},
        geo::Point,
        map::Map,
        viewport::Viewport,
    },
    layers::{base::LayerTrait, group::LayerGroup, tile::TileLayer},
    ui::controls::{LayerControl, LayerEntry},
    Result,
};

/// Overlays stack above base tiles; earthquakes draw over plate lines
const PLATES_Z_INDEX: i32 = 10;
const EARTHQUAKES_Z_INDEX: i32 = 20;

/// Builder for the map context
pub struct MapBuilder {
    config: QuakeMapConfig,
    size: Point,
}

impl MapBuilder {
    /// Starts from the tectonic-plates preset
    pub fn new() -> Self {
        Self::from_config(MapVariant::default().resolve())
    }

    pub fn from_config(config: QuakeMapConfig) -> Self {
        Self {
            config,
            size: Point::new(800.0, 600.0),
        }
    }

    pub fn from_variant(variant: &MapVariant) -> Self {
        Self::from_config(variant.resolve())
    }

    /// Initial container size in pixels
    pub fn with_size(mut self, size: Point) -> Self {
        self.size = size;
        self
    }

    pub fn config(&self) -> &QuakeMapConfig {
        &self.config
    }

    /// Creates the viewport, base layers, empty overlay groups and, when
    /// configured, the layer switcher
    pub fn build(self) -> Result<Map> {
        let config = &self.config;
        config.validate()?;

        let mut viewport = Viewport::new(config.view.center, config.view.zoom, self.size);
        viewport.set_zoom_limits(config.view.min_zoom, config.view.max_zoom);
        let mut map = Map::new(viewport);

        for layer in &config.base_layers.layers {
            map.add_base_layer(TileLayer::with_options(
                layer.id.clone(),
                layer.name.clone(),
                layer.options.clone(),
            ))?;
        }
        map.set_base_layer(&config.base_layers.default_layer)?;

        let mut overlays = Vec::new();
        if config.feeds.tectonic_plates.is_some() {
            let mut plates = LayerGroup::new(
                TECTONIC_PLATES_LAYER_ID.to_string(),
                TECTONIC_PLATES_OVERLAY.to_string(),
            );
            plates.set_z_index(PLATES_Z_INDEX);
            map.add_overlay(Box::new(plates))?;
            overlays.push(LayerEntry::new(TECTONIC_PLATES_OVERLAY, TECTONIC_PLATES_LAYER_ID));
        }

        let mut earthquakes = LayerGroup::new(
            EARTHQUAKES_LAYER_ID.to_string(),
            EARTHQUAKES_OVERLAY.to_string(),
        );
        earthquakes.set_z_index(EARTHQUAKES_Z_INDEX);
        map.add_overlay(Box::new(earthquakes))?;
        overlays.insert(0, LayerEntry::new(EARTHQUAKES_OVERLAY, EARTHQUAKES_LAYER_ID));

        if config.layer_control {
            let base_layers = config
                .base_layers
                .layers
                .iter()
                .map(|l| LayerEntry::new(l.name.clone(), l.id.clone()))
                .collect();
            map.add_layer_control(LayerControl::new(base_layers, overlays));
        }

        log::debug!(
            "map built: {} base layers, overlays {:?}",
            map.base_layers().len(),
            map.overlay_ids()
        );
        Ok(map)
    }
}

impl Default for MapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tectonic_plates_map() {
        let map = MapBuilder::new().build().unwrap();

        assert_eq!(map.viewport().zoom, 4.0);
        assert_eq!(map.base_layers().len(), 3);
        assert_eq!(map.active_base_layer().map(|l| l.id()), Some("satellite"));
        assert_eq!(
            map.overlay_ids(),
            vec![TECTONIC_PLATES_LAYER_ID, EARTHQUAKES_LAYER_ID]
        );

        let control = map.controls().layer_control().unwrap();
        assert_eq!(
            control.base_layer_names(),
            vec!["Street Map", "Dark Map", "Satellite Map"]
        );
        assert_eq!(control.overlay_names(), vec!["Earthquakes", "Tectonic Plates"]);
        assert!(map.controls().legend().is_none());
    }

    #[test]
    fn test_basic_map() {
        let map = MapBuilder::from_variant(&MapVariant::Basic)
            .with_size(Point::new(1024.0, 768.0))
            .build()
            .unwrap();

        assert_eq!(map.viewport().zoom, 5.0);
        assert_eq!(map.viewport().size, Point::new(1024.0, 768.0));
        assert_eq!(map.base_layers().len(), 1);
        assert_eq!(map.overlay_ids(), vec![EARTHQUAKES_LAYER_ID]);
        assert!(map.controls().layer_control().is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = QuakeMapConfig::default();
        config.base_layers.layers.clear();
        assert!(MapBuilder::from_config(config).build().is_err());
    }
}
