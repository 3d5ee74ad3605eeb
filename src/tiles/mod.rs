//! Tile byte fetching for raster base layers.
//!
//! `TileLayer` decides which tiles are needed; `TileLoader` downloads them on
//! background threads and keeps the bytes in an LRU `TileCache`.

pub mod cache;
pub mod loader;

pub use cache::{TileCache, TileKey};
pub use loader::{TileLoader, TileLoaderConfig, TileState};
