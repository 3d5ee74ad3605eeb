pub mod builder;
pub mod config;
pub mod constants;
pub mod geo;
pub mod map;
pub mod viewport;

pub use builder::MapBuilder;
pub use config::{MapVariant, QuakeMapConfig};
pub use geo::{LatLng, LatLngBounds, Point, TileCoord};
pub use map::Map;
pub use viewport::Viewport;
