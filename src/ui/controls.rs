use crate::encoding::legend::Legend;
use serde::{Deserialize, Serialize};

/// Corner of the map a control is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlPosition {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

/// The depth legend box
#[derive(Debug, Clone, PartialEq)]
pub struct LegendControl {
    pub legend: Legend,
    pub position: ControlPosition,
}

impl LegendControl {
    pub fn new(legend: Legend, position: ControlPosition) -> Self {
        Self { legend, position }
    }

    pub fn to_html(&self) -> String {
        self.legend.to_html()
    }
}

/// One row of the layer switcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerEntry {
    /// Label shown to the user
    pub name: String,
    pub layer_id: String,
}

impl LayerEntry {
    pub fn new(name: impl Into<String>, layer_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layer_id: layer_id.into(),
        }
    }
}

/// Layer switcher: base layers are mutually exclusive, overlays toggle
/// independently
#[derive(Debug, Clone, PartialEq)]
pub struct LayerControl {
    pub base_layers: Vec<LayerEntry>,
    pub overlays: Vec<LayerEntry>,
    pub position: ControlPosition,
    pub collapsed: bool,
}

impl LayerControl {
    pub fn new(base_layers: Vec<LayerEntry>, overlays: Vec<LayerEntry>) -> Self {
        Self {
            base_layers,
            overlays,
            position: ControlPosition::TopRight,
            collapsed: true,
        }
    }

    pub fn base_layer_names(&self) -> Vec<&str> {
        self.base_layers.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn overlay_names(&self) -> Vec<&str> {
        self.overlays.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn base_layer_by_name(&self, name: &str) -> Option<&LayerEntry> {
        self.base_layers.iter().find(|e| e.name == name)
    }

    pub fn overlay_by_name(&self, name: &str) -> Option<&LayerEntry> {
        self.overlays.iter().find(|e| e.name == name)
    }
}

/// The controls currently attached to a map
#[derive(Debug, Clone, Default)]
pub struct ControlManager {
    legend: Option<LegendControl>,
    layer_control: Option<LayerControl>,
}

impl ControlManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the legend, replacing any previous one
    pub fn set_legend(&mut self, legend: LegendControl) {
        self.legend = Some(legend);
    }

    pub fn remove_legend(&mut self) -> Option<LegendControl> {
        self.legend.take()
    }

    pub fn legend(&self) -> Option<&LegendControl> {
        self.legend.as_ref()
    }

    pub fn set_layer_control(&mut self, control: LayerControl) {
        self.layer_control = Some(control);
    }

    pub fn layer_control(&self) -> Option<&LayerControl> {
        self.layer_control.as_ref()
    }

    pub fn layer_control_mut(&mut self) -> Option<&mut LayerControl> {
        self.layer_control.as_mut()
    }

    pub fn has_visible_controls(&self) -> bool {
        self.legend.is_some() || self.layer_control.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{legend::build_legend, scale::ColorScale};

    #[test]
    fn test_position_serde_names() {
        let pos: ControlPosition = serde_json::from_str("\"bottomright\"").unwrap();
        assert_eq!(pos, ControlPosition::BottomRight);
        assert_eq!(
            serde_json::to_string(&ControlPosition::TopLeft).unwrap(),
            "\"topleft\""
        );
    }

    #[test]
    fn test_control_manager() {
        let mut controls = ControlManager::new();
        assert!(!controls.has_visible_controls());

        let legend = build_legend(&[0.0, 60.0], &ColorScale::depth()).unwrap();
        controls.set_legend(LegendControl::new(legend, ControlPosition::BottomRight));
        controls.set_layer_control(LayerControl::new(
            vec![LayerEntry::new("Street Map", "street")],
            vec![LayerEntry::new("Earthquakes", "earthquakes")],
        ));

        assert!(controls.has_visible_controls());
        let layer_control = controls.layer_control().unwrap();
        assert_eq!(layer_control.base_layer_names(), vec!["Street Map"]);
        assert_eq!(
            layer_control.overlay_by_name("Earthquakes").map(|e| e.layer_id.as_str()),
            Some("earthquakes")
        );
        assert!(controls.legend().unwrap().to_html().contains("0 - 60 km"));
    }
}
