//! Nearest-neighbour index over world-space frame locations.
//!
//! Points are collected with [`SpatialIndex::insert`] and the k-d tree is
//! built by [`SpatialIndex::balance`]. Distances are always recomputed from
//! the stored points, so equal distances resolve to the smallest key no
//! matter how the tree happens to order them.

use std::collections::HashMap;
use std::fmt;

use kiddo::{KdTree, SquaredEuclidean};
use snapper_math::Vec3;

/// kiddo's default bucket size. A bucket holding more than this many
/// points with the same coordinate on one axis cannot be split.
const BUCKET_SIZE: usize = 32;

/// One index hit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub point: Vec3,
    pub key: usize,
    /// Euclidean distance to the query point
    pub distance: f32,
}

enum Backend {
    /// Not balanced yet; queries scan linearly
    Pending,
    Tree(KdTree<f32, 3>),
    /// Too many coincident coordinates for the tree; scan linearly
    Linear,
}

pub struct SpatialIndex {
    points: Vec<(Vec3, usize)>,
    backend: Backend,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backend = match self.backend {
            Backend::Pending => "pending",
            Backend::Tree(_) => "kd-tree",
            Backend::Linear => "linear",
        };
        f.debug_struct("SpatialIndex")
            .field("len", &self.points.len())
            .field("backend", &backend)
            .finish()
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            backend: Backend::Pending,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            backend: Backend::Pending,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point. The index must be balanced again before queries use
    /// the tree.
    pub fn insert(&mut self, point: Vec3, key: usize) {
        self.points.push((point, key));
        self.backend = Backend::Pending;
    }

    /// Build the search structure over everything inserted so far
    pub fn balance(&mut self) {
        if self.points.is_empty() || has_axis_collision(&self.points) {
            log::debug!(
                "Spatial index over {} points uses a linear scan",
                self.points.len()
            );
            self.backend = Backend::Linear;
            return;
        }
        let mut tree: KdTree<f32, 3> = KdTree::with_capacity(self.points.len());
        for (i, (p, _)) in self.points.iter().enumerate() {
            tree.add(&p.to_array(), i as u64);
        }
        self.backend = Backend::Tree(tree);
    }

    /// Closest point, ties broken by the smallest key. `None` when empty.
    pub fn nearest(&self, point: Vec3) -> Option<Neighbor> {
        if self.points.is_empty() {
            return None;
        }
        let slots: Vec<usize> = match &self.backend {
            Backend::Tree(tree) => {
                let best = tree.nearest_one::<SquaredEuclidean>(&point.to_array());
                let slack = best.distance * 1e-5 + f32::EPSILON;
                tree.within::<SquaredEuclidean>(&point.to_array(), best.distance + slack)
                    .into_iter()
                    .map(|n| n.item as usize)
                    .collect()
            }
            Backend::Pending | Backend::Linear => (0..self.points.len()).collect(),
        };
        slots
            .into_iter()
            .map(|slot| self.neighbor(slot, point))
            .min_by(|a, b| {
                a.distance
                    .total_cmp(&b.distance)
                    .then(a.key.cmp(&b.key))
            })
    }

    /// Every point within `radius` (inclusive), sorted by distance then key
    pub fn range(&self, point: Vec3, radius: f32) -> Vec<Neighbor> {
        if self.points.is_empty() || radius < 0.0 || radius.is_nan() {
            return Vec::new();
        }
        let radius_sq = radius * radius;
        let slots: Vec<usize> = match &self.backend {
            Backend::Tree(tree) => {
                let slack = radius_sq * 1e-5 + f32::EPSILON;
                tree.within::<SquaredEuclidean>(&point.to_array(), radius_sq + slack)
                    .into_iter()
                    .map(|n| n.item as usize)
                    .collect()
            }
            Backend::Pending | Backend::Linear => (0..self.points.len()).collect(),
        };
        let mut hits: Vec<Neighbor> = slots
            .into_iter()
            .filter(|&slot| (self.points[slot].0 - point).length_squared() <= radius_sq)
            .map(|slot| self.neighbor(slot, point))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.key.cmp(&b.key)));
        hits
    }

    fn neighbor(&self, slot: usize, query: Vec3) -> Neighbor {
        let (point, key) = self.points[slot];
        Neighbor {
            point,
            key,
            distance: point.distance(query),
        }
    }
}

/// True if some coordinate value is shared by more points on one axis than
/// a tree bucket can hold
fn has_axis_collision(points: &[(Vec3, usize)]) -> bool {
    if points.len() <= BUCKET_SIZE {
        return false;
    }
    (0..3).any(|axis| {
        let mut counts: HashMap<u32, usize> = HashMap::new();
        points.iter().any(|(p, _)| {
            // +0.0 folds -0.0 into 0.0
            let value = p.to_array()[axis] + 0.0;
            let count = counts.entry(value.to_bits()).or_insert(0);
            *count += 1;
            *count > BUCKET_SIZE
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn index(points: &[Vec3]) -> SpatialIndex {
        let mut index = SpatialIndex::new();
        for (i, &p) in points.iter().enumerate() {
            index.insert(p, i);
        }
        index.balance();
        index
    }

    #[test]
    fn test_nearest() {
        let index = index(&[
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(5.0, 5.0, 5.0),
        ]);
        let hit = index.nearest(Vec3::new(0.1, 0.0, 0.0)).unwrap();
        assert_eq!(hit.key, 0);
        assert_relative_eq!(hit.distance, 0.1, epsilon = 1e-6);

        let hit = index.nearest(Vec3::new(10.0, 10.0, 10.0)).unwrap();
        assert_eq!(hit.key, 2);
    }

    #[test]
    fn test_empty_index() {
        let mut index = SpatialIndex::new();
        index.balance();
        assert!(index.nearest(Vec3::ZERO).is_none());
        assert!(index.range(Vec3::ZERO, 10.0).is_empty());
    }

    #[test]
    fn test_ties_resolve_to_smallest_key() {
        let index = index(&[
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        ]);
        assert_eq!(index.nearest(Vec3::ZERO).unwrap().key, 0);
        assert_eq!(index.nearest(Vec3::new(1.0, 0.0, 0.0)).unwrap().key, 0);
    }

    #[test]
    fn test_range_sorted_and_inclusive() {
        let index = index(&[
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
        ]);
        let keys: Vec<usize> = index.range(Vec3::ZERO, 0.5).iter().map(|n| n.key).collect();
        assert_eq!(keys, vec![0, 1, 2]);
        let keys: Vec<usize> = index.range(Vec3::ZERO, 1e-4).iter().map(|n| n.key).collect();
        assert_eq!(keys, vec![0, 1]);
    }

    #[test]
    fn test_many_points_on_one_plane() {
        // every point has z == 0
        let points: Vec<Vec3> = (0..100)
            .map(|i| Vec3::new((i % 10) as f32, (i / 10) as f32, 0.0))
            .collect();
        let index = index(&points);
        let hit = index.nearest(Vec3::new(3.1, 4.2, 0.5)).unwrap();
        assert_eq!(hit.key, 43);
        assert_eq!(index.range(Vec3::new(3.0, 4.0, 0.0), 1.0).len(), 5);
    }

    #[test]
    fn test_unbalanced_queries_scan() {
        let mut index = SpatialIndex::new();
        index.insert(Vec3::new(2.0, 0.0, 0.0), 7);
        assert_eq!(index.nearest(Vec3::ZERO).unwrap().key, 7);
    }
}
