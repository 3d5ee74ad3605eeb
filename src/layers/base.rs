use crate::{
    core::{geo::LatLngBounds, viewport::Viewport},
    rendering::context::RenderContext,
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Tile,
    Vector,
    Marker,
    Group,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Tile => write!(f, "tile"),
            LayerType::Vector => write!(f, "vector"),
            LayerType::Marker => write!(f, "marker"),
            LayerType::Group => write!(f, "group"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayerProperties {
    pub id: String,
    pub name: String,
    pub layer_type: LayerType,
    pub z_index: i32,
    pub opacity: f32,
    pub visible: bool,
    pub interactive: bool,
}

impl LayerProperties {
    pub fn new(id: String, name: String, layer_type: LayerType) -> Self {
        Self {
            id,
            name,
            layer_type,
            z_index: 0,
            opacity: 1.0,
            visible: true,
            interactive: true,
        }
    }
}

/// Operations shared by every layer the map can hold
pub trait LayerTrait: Send + Sync {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn layer_type(&self) -> LayerType;

    fn z_index(&self) -> i32;

    fn set_z_index(&mut self, z_index: i32);

    fn opacity(&self) -> f32;

    fn set_opacity(&mut self, opacity: f32);

    fn is_visible(&self) -> bool;

    fn set_visible(&mut self, visible: bool);

    /// Geographic extent, if the layer has one
    fn bounds(&self) -> Option<LatLngBounds> {
        None
    }

    /// Whether the layer may draw anything inside `bounds`
    fn intersects_bounds(&self, bounds: &LatLngBounds) -> bool {
        self.bounds().map_or(true, |b| b.intersects(bounds))
    }

    /// Serializable summary of the layer's options
    fn options(&self) -> serde_json::Value;

    /// Queues the layer's primitives for the current frame
    fn render(&self, context: &mut RenderContext, viewport: &Viewport) -> Result<()>;

    fn as_any(&self) -> &dyn std::any::Any;

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
