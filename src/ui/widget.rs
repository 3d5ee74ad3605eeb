//! egui front end for a [`Map`].
//!
//! The widget owns what only matters on screen (downloaded tile textures,
//! whether the layer switcher is expanded) and borrows the map each frame.
//! Layers render into a [`RenderContext`] and the resulting commands are
//! replayed with the egui painter.

use crate::{
    core::{geo::Point, map::Map},
    layers::base::LayerTrait,
    prelude::{HashMap, HashSet},
    rendering::context::{DrawCommand, RenderContext},
    tiles::{TileCache, TileKey, TileLoader},
    ui::{
        controls::{ControlPosition, LayerControl, LegendControl},
        popup::strip_markup,
    },
};
use egui::{
    Align2, Color32, ColorImage, FontId, Pos2, Rect, Response, Sense, Shape, Stroke,
    TextureHandle, TextureOptions, Ui, Vec2,
};

const SCROLL_ZOOM_RATE: f64 = 0.002;
const CONTROL_MARGIN: f32 = 10.0;
const SWATCH_SIZE: f32 = 18.0;
const PLACEHOLDER_FILL: Color32 = Color32::from_gray(48);

fn to_pos(rect: Rect, point: &Point) -> Pos2 {
    Pos2::new(rect.min.x + point.x as f32, rect.min.y + point.y as f32)
}

fn anchor(position: ControlPosition, rect: Rect) -> (Align2, Pos2) {
    let m = CONTROL_MARGIN;
    match position {
        ControlPosition::TopLeft => (Align2::LEFT_TOP, rect.left_top() + Vec2::new(m, m)),
        ControlPosition::TopRight => (Align2::RIGHT_TOP, rect.right_top() + Vec2::new(-m, m)),
        ControlPosition::BottomLeft => {
            (Align2::LEFT_BOTTOM, rect.left_bottom() + Vec2::new(m, -m - 16.0))
        }
        ControlPosition::BottomRight => {
            (Align2::RIGHT_BOTTOM, rect.right_bottom() + Vec2::new(-m, -m - 16.0))
        }
    }
}

/// Interactive earthquake map for egui
pub struct QuakeMapWidget {
    loader: TileLoader,
    textures: HashMap<TileKey, TextureHandle>,
    undecodable: HashSet<TileKey>,
    layers_expanded: bool,
}

impl QuakeMapWidget {
    pub fn new(tile_cache_size: usize) -> Self {
        Self {
            loader: TileLoader::new(TileCache::new(tile_cache_size)),
            textures: HashMap::default(),
            undecodable: HashSet::default(),
            layers_expanded: false,
        }
    }

    /// Draws `map` filling the available space and applies this frame's
    /// input to it
    pub fn show(&mut self, ui: &mut Ui, map: &mut Map) -> Response {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        map.viewport
            .set_size(Point::new(rect.width() as f64, rect.height() as f64));

        handle_input(ui, rect, &response, map);
        self.loader.poll();

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, PLACEHOLDER_FILL);

        let mut ctx = RenderContext::new(rect.width() as f64, rect.height() as f64);
        if let Err(e) = map.render(&mut ctx) {
            log::error!("map render failed: {e}");
        }

        let mut visible_tiles = HashSet::default();
        for cmd in ctx.take_commands() {
            match cmd {
                DrawCommand::Tile {
                    source,
                    coord,
                    url,
                    bounds,
                    opacity,
                } => {
                    let key = TileKey::new(source, coord);
                    let tile_rect = Rect::from_two_pos(to_pos(rect, &bounds.0), to_pos(rect, &bounds.1));
                    if let Some(texture) = self.texture_for(ui.ctx(), &key, url) {
                        painter.image(
                            texture,
                            tile_rect,
                            Rect::from_min_size(Pos2::ZERO, Vec2::splat(1.0)),
                            Color32::WHITE.gamma_multiply(opacity),
                        );
                    }
                    visible_tiles.insert(key);
                }
                DrawCommand::Line { points, style } => {
                    let points = points.iter().map(|p| to_pos(rect, p)).collect();
                    painter.add(Shape::line(
                        points,
                        Stroke::new(style.width, Color32::from(style.color)),
                    ));
                }
                DrawCommand::Circle { center, style } => {
                    painter.circle(
                        to_pos(rect, &center),
                        style.radius.max(0.0),
                        Color32::from(style.fill_color),
                        Stroke::new(style.stroke_width, Color32::from(style.stroke_color)),
                    );
                }
            }
        }
        self.loader.retain_queued(|key| visible_tiles.contains(key));
        self.evict_textures(&visible_tiles);

        self.show_popup(ui, rect, map);
        if let Some(legend) = map.controls().legend().cloned() {
            show_legend(ui, rect, &legend);
        }
        if let Some(control) = map.controls().layer_control().cloned() {
            self.show_layer_control(ui, rect, &control, map);
        }
        show_attribution(ui, rect, map);

        if self.loader.pending() > 0 {
            ui.ctx().request_repaint();
        }
        response
    }

    /// Texture for a tile, uploading it once its bytes are cached and
    /// requesting the download otherwise
    fn texture_for(&mut self, ctx: &egui::Context, key: &TileKey, url: String) -> Option<egui::TextureId> {
        if let Some(texture) = self.textures.get(key) {
            return Some(texture.id());
        }
        if self.undecodable.contains(key) {
            return None;
        }

        let Some(bytes) = self.loader.cache().get(key) else {
            self.loader.request(key.clone(), url);
            return None;
        };

        match image::load_from_memory(&bytes) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let size = [rgba.width() as usize, rgba.height() as usize];
                let color_image = ColorImage::from_rgba_unmultiplied(size, &rgba.into_raw());
                let name = format!(
                    "tile_{}_{}_{}_{}",
                    key.source, key.coord.z, key.coord.x, key.coord.y
                );
                let texture = ctx.load_texture(name, color_image, TextureOptions::LINEAR);
                let id = texture.id();
                self.textures.insert(key.clone(), texture);
                Some(id)
            }
            Err(e) => {
                log::warn!("could not decode tile {:?}: {e}", key.coord);
                self.undecodable.insert(key.clone());
                None
            }
        }
    }

    /// Frees textures of tiles that left the view once more are held than
    /// the byte cache could refill
    fn evict_textures(&mut self, visible: &HashSet<TileKey>) {
        if self.textures.len() > self.loader.cache().capacity() {
            self.textures.retain(|key, _| visible.contains(key));
        }
    }

    fn show_popup(&mut self, ui: &Ui, rect: Rect, map: &mut Map) {
        let Some(popup) = map.popup() else {
            return;
        };
        let anchor_px = map.viewport.lat_lng_to_pixel(&popup.position);
        let text = popup.plain_text();
        let pos = to_pos(rect, &anchor_px) - Vec2::new(0.0, 12.0);
        if !rect.contains(pos) {
            return;
        }

        let mut close = false;
        egui::Area::new(egui::Id::new("quakemap_popup"))
            .order(egui::Order::Foreground)
            .pivot(Align2::CENTER_BOTTOM)
            .fixed_pos(pos)
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(text);
                        close = ui.small_button("x").clicked();
                    });
                });
            });
        if close {
            map.close_popup();
        }
    }

    fn show_layer_control(&mut self, ui: &Ui, rect: Rect, control: &LayerControl, map: &mut Map) {
        let (pivot, pos) = anchor(control.position, rect);
        egui::Area::new(egui::Id::new("quakemap_layers"))
            .order(egui::Order::Foreground)
            .pivot(pivot)
            .fixed_pos(pos)
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    if control.collapsed && !self.layers_expanded {
                        if ui.button("Layers").clicked() {
                            self.layers_expanded = true;
                        }
                        return;
                    }

                    let active = map.active_base_layer().map(|l| l.id().to_string());
                    for entry in &control.base_layers {
                        let selected = active.as_deref() == Some(entry.layer_id.as_str());
                        if ui.radio(selected, entry.name.as_str()).clicked() && !selected {
                            if let Err(e) = map.set_base_layer(&entry.layer_id) {
                                log::warn!("{e}");
                            }
                        }
                    }

                    ui.separator();
                    for entry in &control.overlays {
                        let mut visible = map.is_overlay_visible(&entry.layer_id);
                        let enabled = map.has_overlay(&entry.layer_id);
                        let changed = ui
                            .add_enabled(enabled, egui::Checkbox::new(&mut visible, entry.name.as_str()))
                            .changed();
                        if changed {
                            if let Err(e) = map.set_overlay_visible(&entry.layer_id, visible) {
                                log::warn!("{e}");
                            }
                        }
                    }

                    if control.collapsed && ui.small_button("Hide").clicked() {
                        self.layers_expanded = false;
                    }
                });
            });
    }
}

impl Default for QuakeMapWidget {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_TILE_CACHE_SIZE)
    }
}

/// Drag pans, scroll or pinch zooms around the pointer, click opens a popup
fn handle_input(ui: &Ui, rect: Rect, response: &Response, map: &mut Map) {
    if response.dragged() {
        let delta = response.drag_delta();
        map.viewport
            .pan(Point::new(delta.x as f64, delta.y as f64));
    }

    if let Some(hover) = response.hover_pos() {
        let anchor = Point::new((hover.x - rect.min.x) as f64, (hover.y - rect.min.y) as f64);
        let (scroll, pinch) = ui.input(|i| (i.raw_scroll_delta.y, i.zoom_delta()));
        let mut zoom_change = scroll as f64 * SCROLL_ZOOM_RATE;
        if pinch != 1.0 {
            zoom_change += (pinch as f64).log2();
        }
        if zoom_change != 0.0 {
            let zoom = map.viewport.zoom + zoom_change;
            map.viewport.zoom_around(anchor, zoom);
        }
    }

    if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            let point = Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64);
            map.open_popup_at(point);
        }
    }
}

fn show_legend(ui: &Ui, rect: Rect, control: &LegendControl) {
    let (pivot, pos) = anchor(control.position, rect);
    egui::Area::new(egui::Id::new("quakemap_legend"))
        .order(egui::Order::Foreground)
        .interactable(false)
        .pivot(pivot)
        .fixed_pos(pos)
        .show(ui.ctx(), |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.strong(control.legend.title.as_str());
                for entry in &control.legend.entries {
                    ui.horizontal(|ui| {
                        let (swatch, _) =
                            ui.allocate_exact_size(Vec2::splat(SWATCH_SIZE), Sense::hover());
                        ui.painter().rect_filled(swatch, 0.0, Color32::from(entry.color));
                        ui.label(entry.label.as_str());
                    });
                }
            });
        });
}

fn show_attribution(ui: &Ui, rect: Rect, map: &Map) {
    let Some(text) = map
        .active_base_layer()
        .map(|l| strip_markup(l.attribution()))
        .filter(|t| !t.is_empty())
    else {
        return;
    };

    egui::Area::new(egui::Id::new("quakemap_attribution"))
        .order(egui::Order::Foreground)
        .interactable(false)
        .pivot(Align2::RIGHT_BOTTOM)
        .fixed_pos(rect.right_bottom())
        .show(ui.ctx(), |ui| {
            egui::Frame::none()
                .fill(Color32::from_white_alpha(200))
                .inner_margin(egui::Margin::symmetric(4.0, 1.0))
                .show(ui, |ui| {
                    ui.label(
                        egui::RichText::new(text)
                            .font(FontId::proportional(10.0))
                            .color(Color32::from_gray(40)),
                    );
                });
        });
}
