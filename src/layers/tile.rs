use crate::{
    constants::TILE_SIZE,
    core::{
        geo::{Point, TileCoord},
        viewport::Viewport,
    },
    layers::base::{LayerProperties, LayerTrait, LayerType},
    rendering::context::RenderContext,
    Result,
};
use serde::{Deserialize, Serialize};

/// Configuration for a tile layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayerOptions {
    /// URL template for tiles (e.g., "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png")
    pub url_template: String,
    /// Available subdomains for load balancing
    #[serde(default)]
    pub subdomains: Vec<String>,
    /// Attribution markup
    #[serde(default)]
    pub attribution: String,
    /// Minimum zoom level for this tile source
    #[serde(default)]
    pub min_zoom: u8,
    /// Maximum zoom level for this tile source
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
}

fn default_max_zoom() -> u8 {
    18
}

fn abc() -> Vec<String> {
    vec!["a".to_string(), "b".to_string(), "c".to_string()]
}

impl TileLayerOptions {
    /// OpenStreetMap standard tiles
    pub fn street() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            subdomains: abc(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors".to_string(),
            min_zoom: 0,
            max_zoom: 18,
        }
    }

    /// CARTO dark basemap
    pub fn dark() -> Self {
        Self {
            url_template: "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png"
                .to_string(),
            subdomains: abc(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/\">OpenStreetMap</a> contributors, &copy; <a href=\"https://carto.com/attribution\">CARTO</a>".to_string(),
            min_zoom: 0,
            max_zoom: 18,
        }
    }

    /// Esri World Imagery
    pub fn satellite() -> Self {
        Self {
            url_template: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}".to_string(),
            subdomains: Vec::new(),
            attribution: "&copy; Esri".to_string(),
            min_zoom: 0,
            max_zoom: 18,
        }
    }
}

impl Default for TileLayerOptions {
    fn default() -> Self {
        Self::street()
    }
}

/// A base layer of raster tiles from a slippy-map server.
///
/// The layer only decides which tiles cover the view and where they go; the
/// bytes are fetched by [`crate::tiles::TileLoader`] on behalf of whichever
/// backend consumes the `Tile` draw commands.
pub struct TileLayer {
    properties: LayerProperties,
    options: TileLayerOptions,
}

impl TileLayer {
    pub fn new(id: String, name: String) -> Self {
        Self::with_options(id, name, TileLayerOptions::default())
    }

    pub fn with_options(id: String, name: String, options: TileLayerOptions) -> Self {
        let mut properties = LayerProperties::new(id, name, LayerType::Tile);
        properties.interactive = false;
        Self {
            properties,
            options,
        }
    }

    pub fn street(id: String, name: String) -> Self {
        Self::with_options(id, name, TileLayerOptions::street())
    }

    pub fn dark(id: String, name: String) -> Self {
        Self::with_options(id, name, TileLayerOptions::dark())
    }

    pub fn satellite(id: String, name: String) -> Self {
        Self::with_options(id, name, TileLayerOptions::satellite())
    }

    pub fn tile_options(&self) -> &TileLayerOptions {
        &self.options
    }

    pub fn attribution(&self) -> &str {
        &self.options.attribution
    }

    /// Fills the URL template for `coord`. `{r}` (retina suffix) is always
    /// empty; subdomains rotate on `x + y`.
    pub fn tile_url(&self, coord: TileCoord) -> String {
        let subdomain = if self.options.subdomains.is_empty() {
            ""
        } else {
            let idx = ((coord.x as u64 + coord.y as u64) % self.options.subdomains.len() as u64)
                as usize;
            self.options.subdomains[idx].as_str()
        };

        self.options
            .url_template
            .replace("{s}", subdomain)
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
            .replace("{r}", "")
    }

    /// Integer zoom the tiles are requested at
    pub fn tile_zoom(&self, viewport: &Viewport) -> u8 {
        let zoom = viewport.zoom.floor().max(0.0) as u8;
        zoom.clamp(self.options.min_zoom, self.options.max_zoom)
    }

    /// On-screen size of one tile; larger than `TILE_SIZE` between integer
    /// zooms and past the source's max zoom
    fn tile_pixel_size(&self, viewport: &Viewport) -> f64 {
        let tile_zoom = self.tile_zoom(viewport) as f64;
        TILE_SIZE as f64 * 2_f64.powf(viewport.zoom - tile_zoom)
    }

    /// Tiles covering the viewport, row by row from the top-left
    pub fn visible_tiles(&self, viewport: &Viewport) -> Vec<TileCoord> {
        let zoom = self.tile_zoom(viewport);
        let tiles_per_axis = 1i64 << zoom;
        let tile_px = self.tile_pixel_size(viewport);
        let origin = viewport.pixel_origin();

        let index = |v: f64| (v / tile_px).floor() as i64;
        let min_x = index(origin.x).max(0);
        let max_x = index(origin.x + viewport.size.x).min(tiles_per_axis - 1);
        let min_y = index(origin.y).max(0);
        let max_y = index(origin.y + viewport.size.y).min(tiles_per_axis - 1);

        let mut tiles = Vec::new();
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                tiles.push(TileCoord::new(x as u32, y as u32, zoom));
            }
        }
        tiles
    }

    /// Container-pixel rectangle (top-left, bottom-right) of a tile
    pub fn tile_screen_bounds(&self, coord: TileCoord, viewport: &Viewport) -> (Point, Point) {
        let tile_px = self.tile_pixel_size(viewport);
        let origin = viewport.pixel_origin();
        let top_left = Point::new(
            coord.x as f64 * tile_px - origin.x,
            coord.y as f64 * tile_px - origin.y,
        );
        let bottom_right = top_left.add(&Point::new(tile_px, tile_px));
        (top_left, bottom_right)
    }
}

impl LayerTrait for TileLayer {
    crate::impl_layer_trait!(TileLayer, properties);

    fn options(&self) -> serde_json::Value {
        serde_json::to_value(&self.options).unwrap_or(serde_json::Value::Null)
    }

    fn render(&self, context: &mut RenderContext, viewport: &Viewport) -> Result<()> {
        for coord in self.visible_tiles(viewport) {
            let bounds = self.tile_screen_bounds(coord, viewport);
            context.render_tile(
                &self.properties.id,
                coord,
                self.tile_url(coord),
                bounds,
                self.properties.opacity,
            );
        }
        Ok(())
    }
}
