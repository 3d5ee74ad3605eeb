use crate::constants::TILE_SIZE;
use crate::core::geo::{LatLng, LatLngBounds, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const EARTH_RADIUS: f64 = 6378137.0;

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        Self {
            center,
            zoom: zoom.clamp(0.0, 18.0),
            size,
            min_zoom: 0.0,
            max_zoom: 18.0,
        }
    }

    /// Sets the center of the viewport, keeping latitude inside the projection
    pub fn set_center(&mut self, center: LatLng) {
        self.center = LatLng::new(LatLng::clamp_lat(center.lat), LatLng::wrap_lng(center.lng));
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
    }

    /// Gets the scale factor for the current zoom level
    pub fn scale(&self) -> f64 {
        2_f64.powf(self.zoom)
    }

    /// Projects a LatLng to world pixel coordinates (EPSG:3857) at the given zoom level
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let z = zoom.unwrap_or(self.zoom);
        let scale = TILE_SIZE as f64 * 2_f64.powf(z);

        let lat = LatLng::clamp_lat(lat_lng.lat);
        let x = lat_lng.lng.to_radians() * EARTH_RADIUS;
        let y = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS;

        let pixel_x = (x + PI * EARTH_RADIUS) / (2.0 * PI * EARTH_RADIUS) * scale;
        let pixel_y = (-y + PI * EARTH_RADIUS) / (2.0 * PI * EARTH_RADIUS) * scale;

        Point::new(pixel_x, pixel_y)
    }

    /// Unprojects world pixel coordinates back to LatLng at the given zoom level
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let z = zoom.unwrap_or(self.zoom);
        let scale = TILE_SIZE as f64 * 2_f64.powf(z);

        let x = (pixel.x / scale) * (2.0 * PI * EARTH_RADIUS) - PI * EARTH_RADIUS;
        let y = PI * EARTH_RADIUS - (pixel.y / scale) * (2.0 * PI * EARTH_RADIUS);

        let lng = (x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();

        LatLng::new(lat, lng)
    }

    /// World pixel position of the top-left corner of the view
    pub fn pixel_origin(&self) -> Point {
        let center = self.project(&self.center, None);
        center.subtract(&Point::new(self.size.x / 2.0, self.size.y / 2.0))
    }

    /// Converts a geographical coordinate to container pixel coordinates
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        self.project(lat_lng, None).subtract(&self.pixel_origin())
    }

    /// Converts container pixel coordinates back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        self.unproject(&pixel.add(&self.pixel_origin()), None)
    }

    /// Moves the view by a screen-space delta (dragging right moves the map east-to-west)
    pub fn pan(&mut self, delta: Point) {
        let center_px = self.project(&self.center, None);
        let new_center = self.unproject(&center_px.subtract(&delta), None);
        self.set_center(new_center);
    }

    /// Zooms while keeping the geographic point under `anchor` fixed on screen
    pub fn zoom_around(&mut self, anchor: Point, new_zoom: f64) {
        let anchored = self.pixel_to_lat_lng(&anchor);
        self.set_zoom(new_zoom);

        let drift = self.lat_lng_to_pixel(&anchored).subtract(&anchor);
        let center_px = self.project(&self.center, None).add(&drift);
        let center = self.unproject(&center_px, None);
        self.set_center(center);
    }

    /// Geographic bounds currently visible
    pub fn bounds(&self) -> LatLngBounds {
        let top_left = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let bottom_right = self.pixel_to_lat_lng(&self.size);
        LatLngBounds::from_coords(bottom_right.lat, top_left.lng, top_left.lat, bottom_right.lng)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::default(), 2.0, Point::new(800.0, 600.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_center_projects_to_middle_of_view() {
        let viewport = Viewport::new(LatLng::new(37.5, -112.5), 5.0, Point::new(1200.0, 800.0));
        let pixel = viewport.lat_lng_to_pixel(&LatLng::new(37.5, -112.5));
        assert!(approx(pixel.x, 600.0));
        assert!(approx(pixel.y, 400.0));
    }

    #[test]
    fn test_project_unproject_roundtrip() {
        let viewport = Viewport::default();
        let original = LatLng::new(-33.9249, 18.4241);
        let back = viewport.unproject(&viewport.project(&original, Some(7.0)), Some(7.0));
        assert!(approx(original.lat, back.lat));
        assert!(approx(original.lng, back.lng));
    }

    #[test]
    fn test_zoom_limits() {
        let mut viewport = Viewport::default();
        viewport.set_zoom_limits(1.0, 18.0);
        viewport.set_zoom(25.0);
        assert_eq!(viewport.zoom, 18.0);
        viewport.set_zoom(-1.0);
        assert_eq!(viewport.zoom, 1.0);
    }

    #[test]
    fn test_pan_moves_center_west_when_dragging_right() {
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0), 4.0, Point::new(800.0, 600.0));
        viewport.pan(Point::new(100.0, 0.0));
        assert!(viewport.center.lng < 0.0);
        assert!(approx(viewport.center.lat, 0.0));
    }

    #[test]
    fn test_zoom_around_keeps_anchor_fixed() {
        let mut viewport = Viewport::new(LatLng::new(37.5, -112.5), 4.0, Point::new(800.0, 600.0));
        let anchor = Point::new(200.0, 150.0);
        let before = viewport.pixel_to_lat_lng(&anchor);
        viewport.zoom_around(anchor, 6.0);
        let after = viewport.lat_lng_to_pixel(&before);
        assert!((after.x - anchor.x).abs() < 1e-3);
        assert!((after.y - anchor.y).abs() < 1e-3);
    }

    #[test]
    fn test_bounds_contain_center() {
        let viewport = Viewport::new(LatLng::new(37.5, -112.5), 4.0, Point::new(800.0, 600.0));
        assert!(viewport.bounds().contains(&viewport.center));
    }
}
