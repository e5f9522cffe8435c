//! A packed group of radius levels served by one shared lookup forest.
//!
//! The group covers consecutive ladder levels whose radii grow by powers of
//! two on top of the group's base radius. An insertion cascades upward
//! through the levels until it joins an existing cluster; everything the
//! cascade builds is recorded in the forest, so deleting a center later
//! updates all levels of the group through one split/merge pass instead of
//! one restart per level.

use std::mem;

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::core::lookup::LookupForest;
use crate::core::point::Metric;

#[derive(Debug)]
pub struct PackedGroup {
    forest: LookupForest,
    /// Radius of each level in the group: base, 2·base, 4·base, ...
    radii: Vec<f64>,
    scratch: Vec<u32>,
    rng: ChaCha8Rng,
}

impl PackedGroup {
    pub fn new(k: usize, base_radius: f64, nb_levels: usize, nb_points: usize, rng: ChaCha8Rng) -> Self {
        let mut radii = Vec::with_capacity(nb_levels);
        let mut radius = base_radius;
        for _ in 0..nb_levels {
            radii.push(radius);
            radius *= 2.;
        }
        PackedGroup {
            forest: LookupForest::new(k, nb_levels, nb_points),
            radii,
            scratch: Vec::with_capacity(nb_points),
            rng,
        }
    }

    pub fn nb_levels(&self) -> usize {
        self.radii.len()
    }

    pub fn radius(&self, level: usize) -> f64 {
        self.radii[level]
    }

    pub fn contains(&self, element: u32) -> bool {
        self.forest.has_element(element)
    }

    /// The smallest level of the group on which every present element sits
    /// in a cluster; `nb_levels` or `None` mean no level qualifies.
    pub fn smallest_valid_level(&self) -> Option<usize> {
        self.forest.smallest_valid_level()
    }

    pub fn nb_clusters(&self, level: usize) -> usize {
        self.forest.nb_clusters(level)
    }

    pub fn insert<P: Metric>(&mut self, points: &[P], element: u32) {
        self.forest.create_leaf(element);
        self.cascade(points, element);
    }

    pub fn delete<P: Metric>(&mut self, points: &[P], element: u32) {
        let mut scratch = mem::take(&mut self.scratch);
        if self.forest.remove(element, &mut scratch) {
            // A center went away; re-run the cascade for everything it held,
            // in shuffled order.
            scratch.shuffle(&mut self.rng);
            for &survivor in &scratch {
                self.cascade(points, survivor);
            }
        }
        self.scratch = scratch;
    }

    /// Exact radius of the clustering at `level`, walking every cluster tree
    /// down to its leaves.
    pub fn true_radius<P: Metric>(&self, points: &[P], level: usize) -> f64 {
        let mut max = 0.;
        let mut members = Vec::new();
        for slot in 0..self.forest.k() {
            let Some(center) = self.forest.root_element(level, slot) else {
                break;
            };
            members.clear();
            self.forest.cluster_members(level, slot, &mut members);
            for &member in &members {
                let d = points[member as usize].distance(&points[center as usize]);
                if d > max {
                    max = d;
                }
            }
        }
        max
    }

    /// Runs the placement cascade for an element whose leaf already exists.
    fn cascade<P: Metric>(&mut self, points: &[P], element: u32) {
        let mut level = 0;
        while level < self.forest.nb_levels() && self.try_place(points, element, level) {
            level += 1;
        }
        if level == self.forest.nb_levels() && !self.forest.is_marked(element) {
            self.forest.add_highest_leftover(element);
        } else {
            self.forest.compute_clusters(element);
        }
    }

    /// One cascade step: join the first cluster of `level` within range, or
    /// open a new cluster in the first free slot. Returns whether the
    /// cascade continues above this level.
    fn try_place<P: Metric>(&mut self, points: &[P], element: u32, level: usize) -> bool {
        let mut radius = self.radii[level];
        if self.forest.is_marked(element) {
            // A center of some lower level joins clusters only at half the
            // guess, which keeps the packed levels consistent with the flat
            // ladder they stand in for.
            radius /= 2.;
        }
        let point = &points[element as usize];
        let mut slot = 0;
        while slot < self.forest.k() {
            let Some(center) = self.forest.root_element(level, slot) else {
                break;
            };
            let d = point.distance(&points[center as usize]);
            if d <= radius {
                self.forest.connect(element, level, slot);
                return false;
            }
            slot += 1;
        }
        self.forest.connect(element, level, slot);
        true
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use crate::core::point::GeoPoint;

    use super::*;

    fn points(coords: &[(f64, f64)]) -> Vec<GeoPoint> {
        coords.iter().map(|&(x, y)| GeoPoint::new(x, y)).collect()
    }

    fn group(k: usize, nb_levels: usize, nb: usize) -> PackedGroup {
        PackedGroup::new(k, 1., nb_levels, nb, ChaCha8Rng::seed_from_u64(9))
    }

    #[test]
    fn test_doubling_radii() {
        let group = group(2, 4, 8);
        assert_eq!(group.nb_levels(), 4);
        assert_eq!(group.radius(0), 1.);
        assert_eq!(group.radius(3), 8.);
    }

    #[test]
    fn test_insert_selects_smallest_level() {
        let pts = points(&[(0., 0.), (0.5, 0.), (5., 0.)]);
        let mut group = group(2, 4, pts.len());
        for e in 0..3 {
            group.insert(&pts, e);
        }
        // Two clusters of radius 1 suffice: {0, 1} and {2}.
        assert_eq!(group.smallest_valid_level(), Some(0));
        assert_eq!(group.nb_clusters(0), 2);
        assert!(float_cmp::approx_eq!(f64, group.true_radius(&pts, 0), 0.5));
    }

    #[test]
    fn test_spread_points_push_the_valid_level_up() {
        let pts = points(&[(0., 0.), (3., 0.), (0., 3.), (3., 3.)]);
        let mut group = group(2, 4, pts.len());
        for e in 0..4 {
            group.insert(&pts, e);
        }
        // Nothing fits two clusters below radius 4.
        assert_eq!(group.smallest_valid_level(), Some(2));
        assert_eq!(group.nb_clusters(2), 2);
    }

    #[test]
    fn test_center_deletion_reinserts_survivors() {
        let pts = points(&[(0., 0.), (0.5, 0.), (5., 0.)]);
        let mut group = group(2, 4, pts.len());
        for e in 0..3 {
            group.insert(&pts, e);
        }
        group.delete(&pts, 0);
        assert!(!group.contains(0));
        assert!(group.contains(1));
        assert!(group.contains(2));
        // The survivors are 4.5 apart: still two clusters at radius 1.
        assert_eq!(group.smallest_valid_level(), Some(0));
        assert_eq!(group.nb_clusters(0), 2);
    }

    #[test]
    fn test_unmarked_deletion_is_local() {
        let pts = points(&[(0., 0.), (0.5, 0.), (5., 0.)]);
        let mut group = group(2, 4, pts.len());
        for e in 0..3 {
            group.insert(&pts, e);
        }
        // Element 1 joined cluster 0 at level 0 and never became a center.
        group.delete(&pts, 1);
        assert!(!group.contains(1));
        assert_eq!(group.smallest_valid_level(), Some(0));
        assert_eq!(group.nb_clusters(0), 2);
        // Add and remove round trip leaves no trace of the element.
        group.insert(&pts, 1);
        group.delete(&pts, 1);
        assert!(!group.contains(1));
    }

    #[test]
    fn test_churn_keeps_selection_consistent() {
        use itertools::Itertools;

        let coords = (0..16).map(|i| (f64::from(i) * 1.5, 0.)).collect::<Vec<_>>();
        let pts = points(&coords);
        let mut group = PackedGroup::new(3, 1., 5, pts.len(), ChaCha8Rng::seed_from_u64(1));
        for e in 0..16 {
            group.insert(&pts, e);
        }
        for e in [0, 5, 10, 15, 3, 7] {
            group.delete(&pts, e);
        }
        let level = group.smallest_valid_level().expect("points remain");
        assert!(level < group.nb_levels());
        assert!(group.nb_clusters(level) <= 3);
        // Joining through a chain of centers with halved radii telescopes:
        // nothing on the selected level may sit further than twice its
        // radius guess from the cluster root.
        let mut members = Vec::new();
        for slot in 0..3 {
            if let Some(center) = group.forest.root_element(level, slot) {
                let before = members.len();
                group.forest.cluster_members(level, slot, &mut members);
                for &member in &members[before..] {
                    let d = pts[member as usize].distance(&pts[center as usize]);
                    assert!(d <= 2. * group.radius(level) + 1e-9);
                }
            }
        }
        assert!(members.iter().all_unique());
    }
}
