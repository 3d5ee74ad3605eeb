use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Web Mercator latitude limit
const MAX_LATITUDE: f64 = 85.0511287798;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat >= -90.0 && self.lat <= 90.0 && self.lng >= -180.0 && self.lng <= 180.0
    }

    /// Wraps longitude to [-180, 180] range
    pub fn wrap_lng(lng: f64) -> f64 {
        let wrapped = lng % 360.0;
        if wrapped > 180.0 {
            wrapped - 360.0
        } else if wrapped < -180.0 {
            wrapped + 360.0
        } else {
            wrapped
        }
    }

    /// Clamps latitude to the Web Mercator range
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-MAX_LATITUDE, MAX_LATITUDE)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a point in screen or projected coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a bounding box of geographical coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }

    /// Checks if the bounds intersect with another bounds
    pub fn intersects(&self, other: &LatLngBounds) -> bool {
        !(other.north_east.lat < self.south_west.lat
            || other.south_west.lat > self.north_east.lat
            || other.north_east.lng < self.south_west.lng
            || other.south_west.lng > self.north_east.lng)
    }

    /// Extends the bounds to include a point
    pub fn extend(&mut self, point: &LatLng) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    /// Returns the union of this bounds with another bounds
    pub fn union(&self, other: &LatLngBounds) -> LatLngBounds {
        let south = self.south_west.lat.min(other.south_west.lat);
        let west = self.south_west.lng.min(other.south_west.lng);
        let north = self.north_east.lat.max(other.north_east.lat);
        let east = self.north_east.lng.max(other.north_east.lng);

        LatLngBounds::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    /// Smallest bounds covering every point, `None` when empty
    pub fn from_points<'a, I>(points: I) -> Option<LatLngBounds>
    where
        I: IntoIterator<Item = &'a LatLng>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = LatLngBounds::new(first, first);
        for point in iter {
            bounds.extend(point);
        }
        Some(bounds)
    }
}

/// Represents a tile coordinate in the slippy map tile system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Creates a tile coordinate from a LatLng and zoom level
    pub fn from_lat_lng(lat_lng: &LatLng, zoom: u8) -> Self {
        let lat_rad = LatLng::clamp_lat(lat_lng.lat).to_radians();
        let n = 2_f64.powi(zoom as i32);
        let max_index = (n as u32).saturating_sub(1);

        let x = ((lat_lng.lng + 180.0) / 360.0 * n).floor().max(0.0) as u32;
        let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor().max(0.0) as u32;

        Self::new(x.min(max_index), y.min(max_index), zoom)
    }

    /// Converts tile coordinate to LatLng (northwest corner)
    pub fn to_lat_lng(&self) -> LatLng {
        let n = 2_f64.powi(self.z as i32);
        let lng = self.x as f64 / n * 360.0 - 180.0;
        let lat_rad = (PI * (1.0 - 2.0 * self.y as f64 / n)).sinh().atan();
        let lat = lat_rad.to_degrees();

        LatLng::new(lat, lng)
    }

    /// Checks if the tile is valid for the given zoom level
    pub fn is_valid(&self) -> bool {
        let max_coord = 2_u32.pow(self.z as u32);
        self.x < max_coord && self.y < max_coord
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lat_lng_creation() {
        let coord = LatLng::new(37.5, -112.5);
        assert_eq!(coord.lat, 37.5);
        assert_eq!(coord.lng, -112.5);
        assert!(coord.is_valid());
        assert!(!LatLng::new(95.0, 0.0).is_valid());
    }

    #[test]
    fn test_wrap_lng() {
        assert_eq!(LatLng::wrap_lng(190.0), -170.0);
        assert_eq!(LatLng::wrap_lng(-190.0), 170.0);
        assert_eq!(LatLng::wrap_lng(45.0), 45.0);
    }

    #[test]
    fn test_tile_coord_conversion() {
        let lat_lng = LatLng::new(37.5, -112.5);
        let tile = TileCoord::from_lat_lng(&lat_lng, 5);
        assert!(tile.is_valid());
        let back = tile.to_lat_lng();

        // north-west corner of the containing tile
        assert!(back.lat >= lat_lng.lat);
        assert!(back.lng <= lat_lng.lng);
    }

    #[test]
    fn test_tile_coord_edges_stay_valid() {
        let tile = TileCoord::from_lat_lng(&LatLng::new(-90.0, 180.0), 3);
        assert!(tile.is_valid());
    }

    #[test]
    fn test_bounds_from_points() {
        let points = [
            LatLng::new(40.0, -75.0),
            LatLng::new(41.0, -73.0),
            LatLng::new(40.5, -74.0),
        ];
        let bounds = LatLngBounds::from_points(&points).unwrap();
        assert_eq!(bounds, LatLngBounds::from_coords(40.0, -75.0, 41.0, -73.0));
        assert!(bounds.contains(&LatLng::new(40.5, -74.0)));
        assert!(!bounds.contains(&LatLng::new(42.0, -74.0)));
        assert!(LatLngBounds::from_points(&[]).is_none());
    }
}
