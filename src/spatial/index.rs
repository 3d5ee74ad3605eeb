use crate::core::geo::Point;

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A point feature with a screen-space hit radius, indexed by its position
/// in zoom-0 world pixels so the tree survives zooming unchanged
#[derive(Debug, Clone)]
pub struct SpatialItem<T> {
    pub id: String,
    pub point: Point,
    /// Hit radius in screen pixels
    pub radius: f64,
    pub data: T,
}

impl<T> SpatialItem<T> {
    pub fn new(id: String, point: Point, radius: f64, data: T) -> Self {
        Self {
            id,
            point,
            radius: radius.max(0.0),
            data,
        }
    }
}

impl<T> PartialEq for SpatialItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> RTreeObject for SpatialItem<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.point.x, self.point.y])
    }
}

impl<T> PointDistance for SpatialItem<T> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point.x - point[0];
        let dy = self.point.y - point[1];
        dx * dx + dy * dy
    }
}

/// R-tree over point items used for click hit-testing
pub struct SpatialIndex<T> {
    rtree: RTree<SpatialItem<T>>,
    max_radius: f64,
}

impl<T> SpatialIndex<T> {
    pub fn new() -> Self {
        Self {
            rtree: RTree::new(),
            max_radius: 0.0,
        }
    }

    /// Builds the tree in one pass; faster than repeated inserts
    pub fn bulk_load(items: Vec<SpatialItem<T>>) -> Self {
        let max_radius = items.iter().map(|i| i.radius).fold(0.0, f64::max);
        Self {
            rtree: RTree::bulk_load(items),
            max_radius,
        }
    }

    pub fn insert(&mut self, item: SpatialItem<T>) {
        self.max_radius = self.max_radius.max(item.radius);
        self.rtree.insert(item);
    }

    /// Items within `radius` world units of `center`
    pub fn query_radius(&self, center: &Point, radius: f64) -> Vec<&SpatialItem<T>> {
        self.rtree
            .locate_within_distance([center.x, center.y], radius * radius)
            .collect()
    }

    /// The item whose circle contains `point`, closest center first.
    ///
    /// `point` is in zoom-0 world pixels and `scale` is the world-to-screen
    /// factor (`2^zoom`); `tolerance` pads every radius in screen pixels.
    pub fn hit_test(&self, point: &Point, scale: f64, tolerance: f64) -> Option<&SpatialItem<T>> {
        if scale <= 0.0 {
            return None;
        }
        let reach = (self.max_radius + tolerance) / scale;
        self.query_radius(point, reach)
            .into_iter()
            .filter(|item| {
                item.distance_2(&[point.x, point.y]).sqrt() * scale <= item.radius + tolerance
            })
            .min_by(|a, b| {
                let da = a.distance_2(&[point.x, point.y]);
                let db = b.distance_2(&[point.x, point.y]);
                da.total_cmp(&db)
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpatialItem<T>> {
        self.rtree.iter()
    }

    pub fn get(&self, id: &str) -> Option<&SpatialItem<T>> {
        self.rtree.iter().find(|item| item.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
        self.max_radius = 0.0;
    }
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SpatialIndex<&'static str> {
        SpatialIndex::bulk_load(vec![
            SpatialItem::new("small".into(), Point::new(10.0, 10.0), 4.0, "M1"),
            SpatialItem::new("big".into(), Point::new(10.5, 10.0), 20.0, "M5"),
            SpatialItem::new("far".into(), Point::new(100.0, 100.0), 8.0, "M2"),
        ])
    }

    #[test]
    fn test_hit_test_prefers_nearest_center() {
        let idx = index();
        assert_eq!(idx.len(), 3);

        let hit = idx.hit_test(&Point::new(10.0, 10.0), 1.0, 0.0).unwrap();
        assert_eq!(hit.id, "small");

        // 5 px right of "small" is outside its radius but inside "big"
        let hit = idx.hit_test(&Point::new(15.0, 10.0), 1.0, 0.0).unwrap();
        assert_eq!(hit.id, "big");
    }

    #[test]
    fn test_hit_test_scales_with_zoom() {
        let idx = index();
        // At scale 4 the 1 world-px offset becomes 4 screen px
        assert!(idx.hit_test(&Point::new(101.0, 100.0), 4.0, 0.0).is_some());
        assert!(idx.hit_test(&Point::new(103.0, 100.0), 4.0, 0.0).is_none());
        assert!(idx.hit_test(&Point::new(103.0, 100.0), 4.0, 5.0).is_some());
    }

    #[test]
    fn test_query_and_clear() {
        let mut idx = index();
        assert_eq!(idx.query_radius(&Point::new(10.0, 10.0), 1.0).len(), 2);
        assert_eq!(idx.get("far").map(|i| i.data), Some("M2"));

        idx.clear();
        assert!(idx.is_empty());
        assert!(idx.hit_test(&Point::new(10.0, 10.0), 1.0, 100.0).is_none());
    }
}
