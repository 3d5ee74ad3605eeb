use crate::{
    core::{
        geo::{LatLng, Point},
        viewport::Viewport,
    },
    encoding::legend::Legend,
    layers::{base::LayerTrait, group::LayerGroup, manager::LayerManager, tile::TileLayer},
    rendering::context::RenderContext,
    spatial::index::{SpatialIndex, SpatialItem},
    ui::{
        controls::{ControlManager, ControlPosition, LayerControl, LegendControl},
        popup::{Popup, PopupManager},
    },
    MapError, Result,
};

/// Extra screen pixels accepted around a marker when clicking it
const CLICK_TOLERANCE: f64 = 2.0;

/// Popup target registered in the click index
#[derive(Debug, Clone)]
pub struct PopupTarget {
    pub position: LatLng,
    pub content: String,
}

/// The application context: viewport, base layers, overlays, controls and
/// the open popup. Everything a page would otherwise keep in globals lives
/// here and is passed explicitly to the composition step and the renderer.
pub struct Map {
    pub viewport: Viewport,
    base_layers: Vec<TileLayer>,
    active_base: Option<usize>,
    overlays: LayerManager,
    controls: ControlManager,
    popups: PopupManager,
}

impl Map {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            base_layers: Vec::new(),
            active_base: None,
            overlays: LayerManager::new(),
            controls: ControlManager::new(),
            popups: PopupManager::new(),
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.viewport.set_center(center);
        self.viewport.set_zoom(zoom);
    }

    /// Registers a base layer; the first one becomes active
    pub fn add_base_layer(&mut self, layer: TileLayer) -> Result<()> {
        if self.base_layers.iter().any(|l| l.id() == layer.id()) {
            return Err(MapError::Layer(format!(
                "duplicate base layer id '{}'",
                layer.id()
            )));
        }
        self.base_layers.push(layer);
        if self.active_base.is_none() {
            self.active_base = Some(self.base_layers.len() - 1);
        }
        Ok(())
    }

    /// Makes `layer_id` the single visible base layer
    pub fn set_base_layer(&mut self, layer_id: &str) -> Result<()> {
        let index = self
            .base_layers
            .iter()
            .position(|l| l.id() == layer_id)
            .ok_or_else(|| MapError::Layer(format!("unknown base layer '{layer_id}'")))?;
        if self.active_base != Some(index) {
            log::debug!("base layer switched to '{layer_id}'");
        }
        self.active_base = Some(index);
        Ok(())
    }

    pub fn base_layers(&self) -> &[TileLayer] {
        &self.base_layers
    }

    pub fn active_base_layer(&self) -> Option<&TileLayer> {
        self.active_base.and_then(|i| self.base_layers.get(i))
    }

    /// Adds an overlay layer above the base layer
    pub fn add_overlay(&mut self, layer: Box<dyn LayerTrait>) -> Result<()> {
        log::debug!("overlay '{}' added ({})", layer.id(), layer.layer_type());
        self.overlays.add_layer(layer)
    }

    pub fn remove_overlay(&mut self, layer_id: &str) -> Option<Box<dyn LayerTrait>> {
        self.overlays.remove_layer(layer_id)
    }

    pub fn overlay(&self, layer_id: &str) -> Option<&dyn LayerTrait> {
        self.overlays.get_layer(layer_id)
    }

    pub fn has_overlay(&self, layer_id: &str) -> bool {
        self.overlays.contains(layer_id)
    }

    /// Overlay ids in render order
    pub fn overlay_ids(&self) -> Vec<String> {
        self.overlays.list_layers()
    }

    pub fn overlays(&self) -> Vec<&dyn LayerTrait> {
        self.overlays.layers()
    }

    /// The overlay `layer_id` if it is a `LayerGroup`
    pub fn group(&self, layer_id: &str) -> Option<&LayerGroup> {
        self.overlays
            .get_layer(layer_id)
            .and_then(|l| l.as_any().downcast_ref::<LayerGroup>())
    }

    /// Applies `f` to the overlay group `layer_id`; `None` when there is no
    /// such overlay or it is not a group
    pub fn with_group_mut<F, R>(&mut self, layer_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut LayerGroup) -> R,
    {
        self.overlays
            .with_layer_mut(layer_id, |layer| {
                layer.as_any_mut().downcast_mut::<LayerGroup>().map(f)
            })
            .flatten()
    }

    pub fn set_overlay_visible(&mut self, layer_id: &str, visible: bool) -> Result<()> {
        self.overlays
            .with_layer_mut(layer_id, |layer| layer.set_visible(visible))
            .ok_or_else(|| MapError::Layer(format!("unknown overlay '{layer_id}'")))?;

        // A popup of a hidden layer would point at nothing
        if !visible
            && self
                .popups
                .current()
                .is_some_and(|p| self.overlay_owns(layer_id, &p.source_id))
        {
            self.popups.close();
        }
        Ok(())
    }

    pub fn is_overlay_visible(&self, layer_id: &str) -> bool {
        self.overlays
            .get_layer(layer_id)
            .is_some_and(|l| l.is_visible())
    }

    fn overlay_owns(&self, overlay_id: &str, child_id: &str) -> bool {
        overlay_id == child_id
            || self
                .group(overlay_id)
                .is_some_and(|g| g.get_layer(child_id).is_some())
    }

    /// Attaches the legend control, replacing any previous legend
    pub fn add_legend(&mut self, legend: Legend, position: ControlPosition) {
        log::debug!("legend attached with {} entries", legend.len());
        self.controls
            .set_legend(LegendControl::new(legend, position));
    }

    pub fn add_layer_control(&mut self, control: LayerControl) {
        self.controls.set_layer_control(control);
    }

    pub fn controls(&self) -> &ControlManager {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut ControlManager {
        &mut self.controls
    }

    /// Click index over the markers of every visible overlay group, in
    /// zoom-0 world pixels. Only markers with a bound popup are included.
    pub fn marker_index(&self) -> SpatialIndex<PopupTarget> {
        let mut items = Vec::new();
        for layer in self.overlays.layers() {
            if !layer.is_visible() {
                continue;
            }
            let Some(group) = layer.as_any().downcast_ref::<LayerGroup>() else {
                continue;
            };
            for marker in group.markers().filter(|m| m.is_visible()) {
                let Some(content) = marker.popup_text() else {
                    continue;
                };
                let position = marker.position();
                items.push(SpatialItem::new(
                    marker.id().to_string(),
                    self.viewport.project(&position, Some(0.0)),
                    marker.radius(),
                    PopupTarget {
                        position,
                        content: content.to_string(),
                    },
                ));
            }
        }
        SpatialIndex::bulk_load(items)
    }

    /// Handles a click at container pixel `point`: opens the popup of the
    /// marker under it, or closes the open popup when nothing was hit
    pub fn open_popup_at(&mut self, point: Point) -> Option<&Popup> {
        let clicked = self.viewport.pixel_to_lat_lng(&point);
        let world = self.viewport.project(&clicked, Some(0.0));
        let scale = self.viewport.scale();

        let index = self.marker_index();
        match index.hit_test(&world, scale, CLICK_TOLERANCE) {
            Some(hit) => {
                self.popups.open(Popup::new(
                    hit.id.clone(),
                    hit.data.position,
                    hit.data.content.clone(),
                ));
                self.popups.current()
            }
            None => {
                self.popups.close();
                None
            }
        }
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popups.current()
    }

    pub fn close_popup(&mut self) -> Option<Popup> {
        self.popups.close()
    }

    /// Queues the active base layer's tiles, then every visible overlay
    pub fn render(&self, context: &mut RenderContext) -> Result<()> {
        if let Some(base) = self.active_base_layer() {
            if base.is_visible() {
                base.render(context, &self.viewport)?;
            }
        }
        self.overlays.render(context, &self.viewport)
    }
}
