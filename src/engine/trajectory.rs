//! One ladder level of the adversarial algorithm over trajectories.
//!
//! The insertion path is the same greedy placement as the GPS level, under
//! the Hausdorff metric. The extra operation is the *update*: a trajectory
//! that grows by one point may drift out of its cluster, pull overflow
//! elements into it, or stop being a legitimate center altogether.

use std::mem;

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::core::point::{Metric, Trajectory};
use crate::core::set::SetCollection;
use crate::utils::helpers;

#[derive(Debug)]
pub struct TrajectoryLevel {
    k: usize,
    radius: f64,
    centers: Vec<u32>,
    true_rad: Vec<f64>,
    clusters: SetCollection,
    scratch: Vec<u32>,
    rng: ChaCha8Rng,
}

impl TrajectoryLevel {
    pub fn new(k: usize, radius: f64, nb_points: usize, rng: ChaCha8Rng) -> Self {
        TrajectoryLevel {
            k,
            radius,
            centers: Vec::with_capacity(k + 1),
            true_rad: Vec::with_capacity(k),
            clusters: SetCollection::new(k + 1, nb_points, nb_points),
            scratch: Vec::with_capacity(nb_points),
            rng,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn nb_clusters(&self) -> usize {
        self.centers.len()
    }

    pub fn centers(&self) -> &[u32] {
        &self.centers
    }

    pub fn cluster_of(&self, element: u32) -> Option<usize> {
        self.clusters.set_of(element)
    }

    pub fn is_feasible(&self) -> bool {
        self.clusters.card(self.k) == 0
    }

    pub fn true_radius(&self) -> f64 {
        if self.true_rad.is_empty() {
            0.
        } else {
            helpers::arg_max(&self.true_rad).1
        }
    }

    pub fn insert(&mut self, points: &[Trajectory], element: u32) {
        let point = &points[element as usize];
        for (i, &center) in self.centers.iter().enumerate() {
            let d = point.distance(&points[center as usize]);
            if d <= self.radius {
                self.clusters.add(element, i);
                if d > self.true_rad[i] {
                    self.true_rad[i] = d;
                }
                return;
            }
        }
        let nb = self.centers.len();
        self.clusters.add(element, nb);
        if nb < self.k {
            self.centers.push(element);
            self.true_rad.push(0.);
        }
    }

    /// Re-evaluates `element` after it grew by one point.
    pub fn update(&mut self, points: &[Trajectory], element: u32) {
        let cluster = self
            .clusters
            .set_of(element)
            .expect("update of an absent element");
        if cluster < self.k && self.centers[cluster] == element {
            self.update_center(points, element, cluster);
        } else {
            self.update_non_center(points, element, cluster);
        }
    }

    /// A grown non-center either still fits its cluster, or goes through a
    /// plain remove-and-insert.
    fn update_non_center(&mut self, points: &[Trajectory], element: u32, cluster: usize) {
        if cluster < self.k {
            let d = points[element as usize].distance(&points[self.centers[cluster] as usize]);
            if d <= self.radius {
                return;
            }
        }
        self.clusters.remove(element);
        self.insert(points, element);
    }

    /// A grown center is still *legit* if no other center moved within the
    /// radius guess of it. A legit center keeps its cluster but re-checks
    /// every member and then pulls in overflow elements that drifted into
    /// range; a center that is no longer legit forces a restart.
    fn update_center(&mut self, points: &[Trajectory], element: u32, cluster: usize) {
        if self.is_legit_center(points, element, cluster) {
            self.recheck_members(points, element, cluster);
            self.absorb_overflow(points, element, cluster);
        } else {
            self.restart_at(points, element, cluster);
        }
    }

    fn is_legit_center(&self, points: &[Trajectory], element: u32, cluster: usize) -> bool {
        let point = &points[element as usize];
        for (i, &center) in self.centers.iter().enumerate() {
            if i != cluster && point.distance(&points[center as usize]) <= self.radius {
                return false;
            }
        }
        true
    }

    /// Re-inserts every member of `cluster` that is no longer within the
    /// radius of its center.
    fn recheck_members(&mut self, points: &[Trajectory], center: u32, cluster: usize) {
        let mut i = 0;
        while i < self.clusters.card(cluster) {
            let member = self.clusters.elements(cluster)[i];
            if member == center {
                i += 1;
                continue;
            }
            let d = points[center as usize].distance(&points[member as usize]);
            if d > self.radius {
                // The swap-removal moves another member into position i.
                self.clusters.remove(member);
                self.insert(points, member);
            } else {
                i += 1;
            }
        }
    }

    /// Moves overflow elements that are now within range of `center` into
    /// its cluster.
    fn absorb_overflow(&mut self, points: &[Trajectory], center: u32, cluster: usize) {
        let mut i = 0;
        while i < self.clusters.card(self.k) {
            let element = self.clusters.elements(self.k)[i];
            let d = points[center as usize].distance(&points[element as usize]);
            if d <= self.radius {
                self.clusters.remove(element);
                self.clusters.add(element, cluster);
                if d > self.true_rad[cluster] {
                    self.true_rad[cluster] = d;
                }
            } else {
                i += 1;
            }
        }
    }

    /// Tears down `cluster` and everything after it, re-inserts the
    /// survivors in shuffled order and finally the grown trajectory itself.
    fn restart_at(&mut self, points: &[Trajectory], element: u32, cluster: usize) {
        self.clusters.remove(element);
        self.centers.truncate(cluster);
        self.true_rad.truncate(cluster);
        let mut scratch = mem::take(&mut self.scratch);
        scratch.clear();
        self.clusters.drain_from(cluster, &mut scratch);
        scratch.shuffle(&mut self.rng);
        for &survivor in &scratch {
            self.insert(points, survivor);
        }
        self.scratch = scratch;
        self.insert(points, element);
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use crate::core::point::GeoPoint;

    use super::*;

    fn trajectories(buffers: &[&[(f64, f64)]]) -> Vec<Trajectory> {
        buffers
            .iter()
            .map(|coords| {
                Trajectory::new(coords.iter().map(|&(x, y)| GeoPoint::new(x, y)).collect())
            })
            .collect()
    }

    fn level(k: usize, radius: f64, nb: usize) -> TrajectoryLevel {
        TrajectoryLevel::new(k, radius, nb, ChaCha8Rng::seed_from_u64(5))
    }

    #[test]
    fn test_add_mirrors_greedy_placement() {
        let mut points = trajectories(&[&[(0., 0.)], &[(0.4, 0.)], &[(10., 0.)]]);
        let mut level = level(2, 1., points.len());
        for e in 0..3u32 {
            points[e as usize].reveal();
            level.insert(&points, e);
        }
        assert_eq!(level.centers(), &[0, 2]);
        assert_eq!(level.cluster_of(1), Some(0));
        assert!(level.is_feasible());
    }

    #[test]
    fn test_update_within_radius_is_a_no_op() {
        let mut points = trajectories(&[&[(0., 0.)], &[(0., 0.), (0.2, 0.)]]);
        let mut level = level(2, 1., points.len());
        points[0].reveal();
        level.insert(&points, 0);
        points[1].reveal();
        level.insert(&points, 1);
        assert_eq!(level.cluster_of(1), Some(0));

        points[1].reveal();
        level.update(&points, 1);
        assert_eq!(level.cluster_of(1), Some(0));
        assert_eq!(level.centers(), &[0]);
    }

    #[test]
    fn test_update_drifts_member_out() {
        let mut points = trajectories(&[&[(0., 0.), (1.5, 0.)], &[(0., 0.), (1.5, 0.)]]);
        let mut level = level(1, 1., points.len());
        points[0].reveal();
        level.insert(&points, 0);
        points[1].reveal();
        level.insert(&points, 1);

        // Trajectory 1 reveals a far point: out of cluster 0 and, with k = 1,
        // into the overflow bucket.
        points[1].reveal();
        level.update(&points, 1);
        assert_eq!(level.cluster_of(1), Some(1));
        assert!(!level.is_feasible());

        // Center 0 then reveals the same far point and covers 1 again.
        points[0].reveal();
        level.update(&points, 0);
        assert_eq!(level.cluster_of(1), Some(0));
        assert!(level.is_feasible());
    }

    #[test]
    fn test_update_center_still_legit_keeps_centers() {
        let mut points = trajectories(&[&[(0., 0.), (2., 0.)], &[(2., 0.)]]);
        let mut level = level(2, 1., points.len());
        points[0].reveal();
        level.insert(&points, 0);
        points[1].reveal();
        level.insert(&points, 1);
        assert_eq!(level.centers(), &[0, 1]);

        // Growing trajectory 0 toward 1 does not bring the whole of 0 within
        // the radius of 1, so both centers stand.
        points[0].reveal();
        level.update(&points, 0);
        assert_eq!(level.centers(), &[0, 1]);
        assert!(level.is_feasible());
    }

    #[test]
    fn test_update_center_no_longer_legit_restarts() {
        let mut points = trajectories(&[&[(0., 0.), (2., 0.)], &[(2., 0.), (0.1, 0.)]]);
        let mut level = level(2, 1., points.len());
        points[0].reveal();
        level.insert(&points, 0);
        points[1].reveal();
        level.insert(&points, 1);
        points[0].reveal();
        level.update(&points, 0);
        assert_eq!(level.centers(), &[0, 1]);

        // Trajectory 1 now covers trajectory 0 point for point: it stops
        // being a legitimate center and folds into cluster 0.
        points[1].reveal();
        level.update(&points, 1);
        assert_eq!(level.centers(), &[0]);
        assert_eq!(level.cluster_of(1), Some(0));
        assert!(level.is_feasible());
    }
}
