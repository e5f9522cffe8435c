//! One ladder level of the sliding-window algorithm: insert-only k-center
//! where points expire after a fixed time window.
//!
//! Two structures live side by side. The *attractor ring* is maintained on
//! every insertion: up to k+1 cluster seeds in FIFO order, each remembering
//! the newest point it attracted. The *final clustering* is recomputed lazily
//! by [`SlidingLevel::compute_centers`] from the attractors plus the orphans,
//! the still-alive representatives of attractors that have expired.

use crate::core::point::{Metric, TimestampedPoint};

#[derive(Debug)]
pub struct SlidingLevel {
    k: usize,
    radius: f64,
    /// Attractor ancestor of every element seen so far.
    elements: Vec<u32>,
    /// FIFO ring of attractors, `first_attr` the oldest, `attr_nb` live.
    attr: Vec<Option<u32>>,
    /// Newest point attracted by each ring slot.
    repr: Vec<Option<u32>>,
    first_attr: usize,
    attr_nb: usize,
    /// Alive points whose attractor expired, with the expired attractor each
    /// one came from. One slot more than the ring can hold, to absorb the
    /// transient at the moment of rotation.
    orphans: Vec<Option<u32>>,
    parents: Vec<Option<u32>>,
    /// The lazily computed clustering; `cluster_nb == k + 1` marks the level
    /// infeasible for the current window.
    centers: Vec<u32>,
    cluster_nb: usize,
    /// Final center of every attractor (by ring slot) and orphan (by orphan
    /// slot, offset k+1).
    sp_points: Vec<u32>,
    first_point: u32,
    last_point: u32,
}

impl SlidingLevel {
    pub fn new(k: usize, radius: f64, nb_points: usize) -> Self {
        SlidingLevel {
            k,
            radius,
            elements: vec![0; nb_points],
            attr: vec![None; k + 1],
            repr: vec![None; k + 1],
            first_attr: 0,
            attr_nb: 0,
            orphans: vec![None; k + 2],
            parents: vec![None; k + 2],
            centers: vec![0; k + 1],
            cluster_nb: 0,
            sp_points: vec![0; 2 * k + 3],
            first_point: 0,
            last_point: 0,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Oldest alive element index.
    pub fn first_point(&self) -> u32 {
        self.first_point
    }

    /// One past the newest element index.
    pub fn last_point(&self) -> u32 {
        self.last_point
    }

    /// Number of alive points in the current window.
    pub fn window_len(&self) -> u32 {
        self.last_point - self.first_point
    }

    /// Cluster count of the last [`SlidingLevel::compute_centers`] pass.
    pub fn nb_clusters(&self) -> usize {
        self.cluster_nb
    }

    pub fn is_feasible(&self) -> bool {
        self.attr_nb <= self.k && self.cluster_nb <= self.k
    }

    /// Feeds the next point of the stream. Points must arrive in
    /// non-decreasing `in_date` order and `element` must be the next index.
    pub fn insert(&mut self, points: &[TimestampedPoint], element: u32) {
        self.last_point = element + 1;
        while self.first_point <= element
            && points[element as usize].in_date >= points[self.first_point as usize].exp_date
        {
            self.first_point += 1;
        }
        self.remove_expired();
        let mut best: Option<(usize, f64)> = None;
        for i in 0..self.attr_nb {
            let index = (self.first_attr + i) % (self.k + 1);
            let attractor = self.attr[index].expect("live ring slot is empty");
            let d = points[element as usize].distance(&points[attractor as usize]);
            if d <= self.radius && best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((index, d));
            }
        }
        match best {
            None => self.add_cluster(element),
            Some((index, _)) => {
                self.elements[element as usize] =
                    self.attr[index].expect("live ring slot is empty");
                self.repr[index] = Some(element);
            }
        }
    }

    fn remove_expired(&mut self) {
        self.remove_expired_orphans(self.first_point);
        while self.attr_nb > 0 {
            let index = self.first_attr;
            let attractor = self.attr[index].expect("live ring slot is empty");
            if attractor >= self.first_point {
                break;
            }
            let orphan = self.repr[index].expect("live ring slot is empty");
            self.attr[index] = None;
            self.repr[index] = None;
            self.first_attr = (self.first_attr + 1) % (self.k + 1);
            self.attr_nb -= 1;
            if orphan >= self.first_point {
                self.create_orphan(attractor, orphan, false);
            }
        }
    }

    fn remove_expired_orphans(&mut self, first_point: u32) {
        for i in 0..self.k + 2 {
            if self.orphans[i].map_or(false, |orphan| orphan < first_point) {
                self.orphans[i] = None;
                self.parents[i] = None;
            }
        }
    }

    /// Remembers `orphan` as the survivor of the expired attractor `parent`.
    ///
    /// `sweep_on_full` allows one sweep of orphans older than the current
    /// oldest attractor when every slot is taken; outside of attractor
    /// rotation the slots cannot run out.
    fn create_orphan(&mut self, parent: u32, orphan: u32, sweep_on_full: bool) {
        if parent == orphan {
            return;
        }
        if let Some(slot) = self.orphans.iter().position(Option::is_none) {
            self.orphans[slot] = Some(orphan);
            self.parents[slot] = Some(parent);
            return;
        }
        assert!(sweep_on_full, "orphan slots exhausted");
        let oldest = self.attr[self.first_attr].expect("live ring slot is empty");
        self.remove_expired_orphans(oldest);
        let slot = self
            .orphans
            .iter()
            .position(Option::is_none)
            .expect("orphan slots exhausted");
        self.orphans[slot] = Some(orphan);
        self.parents[slot] = Some(parent);
    }

    /// Seeds a new attractor around `element`, rotating the oldest one out
    /// when the ring is full.
    fn add_cluster(&mut self, element: u32) {
        if self.attr_nb > self.k {
            let index = self.first_attr;
            let orphan = self.repr[index].expect("live ring slot is empty");
            let parent = self.attr[index].expect("live ring slot is empty");
            self.attr[index] = None;
            self.repr[index] = None;
            self.first_attr = (self.first_attr + 1) % (self.k + 1);
            self.attr_nb -= 1;
            self.create_orphan(parent, orphan, true);
        }
        if self.attr_nb + 1 > self.k {
            let oldest = self.attr[self.first_attr].expect("live ring slot is empty");
            self.remove_expired_orphans(oldest);
        }
        self.elements[element as usize] = element;
        let index = (self.first_attr + self.attr_nb) % (self.k + 1);
        self.attr[index] = Some(element);
        self.repr[index] = Some(element);
        self.attr_nb += 1;
        assert!(self.attr_nb <= self.k + 1);
    }

    /// Rebuilds the final clustering for the current window: the attractors
    /// seed the centers in FIFO order, then every live orphan either joins a
    /// center within the radius or becomes one. A (k+1)-th center marks the
    /// level infeasible.
    pub fn compute_centers(&mut self, points: &[TimestampedPoint]) {
        self.cluster_nb = 0;
        if self.attr_nb > self.k {
            return;
        }
        for i in 0..self.attr_nb {
            let index = (self.first_attr + i) % (self.k + 1);
            let attractor = self.attr[index].expect("live ring slot is empty");
            self.centers[self.cluster_nb] = attractor;
            self.cluster_nb += 1;
            self.sp_points[index] = attractor;
        }
        for i in 0..self.k + 2 {
            if let Some(orphan) = self.orphans[i] {
                if self.assign_orphan(points, orphan, i + self.k + 1) {
                    self.centers[self.cluster_nb] = orphan;
                    self.cluster_nb = self.k + 1;
                    return;
                }
            }
        }
    }

    /// Returns true when the orphan cannot be absorbed without a (k+1)-th
    /// center.
    fn assign_orphan(&mut self, points: &[TimestampedPoint], orphan: u32, sp_index: usize) -> bool {
        for i in 0..self.cluster_nb {
            let d = points[orphan as usize].distance(&points[self.centers[i] as usize]);
            if d <= self.radius {
                self.sp_points[sp_index] = self.centers[i];
                return false;
            }
        }
        if self.cluster_nb == self.k {
            return true;
        }
        self.centers[self.cluster_nb] = orphan;
        self.cluster_nb += 1;
        self.sp_points[sp_index] = orphan;
        false
    }

    /// Cluster index of an alive element in the last computed clustering.
    ///
    /// # Panics
    ///
    /// If the element's ancestor chain does not resolve to a live center,
    /// which would mean the expiry bookkeeping is broken.
    pub fn find_cluster(&self, element: u32) -> usize {
        let parent = self.elements[element as usize];
        for i in 0..self.cluster_nb {
            if self.centers[i] == parent {
                return i;
            }
        }
        for i in 0..self.k + 2 {
            if self.orphans[i].is_some() && self.parents[i] == Some(parent) {
                let center = self.sp_points[self.k + 1 + i];
                for j in 0..self.cluster_nb {
                    if self.centers[j] == center {
                        return j;
                    }
                }
                panic!("orphan of {parent} resolved to a stale center");
            }
        }
        panic!("element {element} has no live ancestor");
    }

    /// Exact radius of the last computed clustering over the alive window.
    pub fn true_radius(&self, points: &[TimestampedPoint]) -> f64 {
        let mut max = 0.;
        for element in self.first_point..self.last_point {
            let cluster = self.find_cluster(element);
            let d = points[element as usize].distance(&points[self.centers[cluster] as usize]);
            if d > max {
                max = d;
            }
        }
        max
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use crate::core::point::GeoPoint;

    use super::*;

    fn stream(window: u32, coords: &[(u32, f64, f64)]) -> Vec<TimestampedPoint> {
        coords
            .iter()
            .map(|&(date, x, y)| TimestampedPoint::new(GeoPoint::new(x, y), date, window))
            .collect()
    }

    #[test]
    fn test_expiry_promotes_representative_to_orphan() {
        // Window of 10: by the time the third point arrives the first one is
        // out, taking its attractor with it.
        let points = stream(10, &[(0, 0., 0.), (5, 0.5, 0.), (11, 0.3, 0.)]);
        let mut level = SlidingLevel::new(2, 1., points.len());
        for e in 0..points.len() as u32 {
            level.insert(&points, e);
            level.compute_centers(&points);
        }
        assert_eq!(level.first_point(), 1);
        assert_eq!(level.window_len(), 2);
        // Point 1 survived its attractor and is absorbed by the new center.
        assert!(level.is_feasible());
        assert_eq!(level.nb_clusters(), 1);
        assert_eq!(level.find_cluster(1), 0);
        assert_eq!(level.find_cluster(2), 0);
        assert!(approx_eq!(f64, level.true_radius(&points), 0.2));
    }

    #[test]
    fn test_window_holds_no_expired_point() {
        let points = stream(
            3,
            &[(0, 0., 0.), (1, 5., 0.), (2, 10., 0.), (4, 15., 0.), (6, 20., 0.)],
        );
        let mut level = SlidingLevel::new(2, 1., points.len());
        for e in 0..points.len() as u32 {
            level.insert(&points, e);
            level.compute_centers(&points);
            let newest = points[e as usize].in_date;
            if level.is_feasible() {
                for alive in level.first_point()..level.last_point() {
                    assert!(points[alive as usize].exp_date > newest);
                    let c = level.find_cluster(alive);
                    assert!(c < level.nb_clusters());
                }
            }
        }
    }

    #[test]
    fn test_too_many_spread_points_is_infeasible() {
        let points = stream(
            1000,
            &[(0, 0., 0.), (1, 10., 0.), (2, 20., 0.), (3, 30., 0.)],
        );
        let mut level = SlidingLevel::new(2, 1., points.len());
        for e in 0..points.len() as u32 {
            level.insert(&points, e);
        }
        level.compute_centers(&points);
        assert!(!level.is_feasible());
    }

    #[test]
    fn test_attractor_rotation_keeps_ring_bounded() {
        // A long stream of mutually distant points with a short window: the
        // ring keeps rotating and the bound k+1 must never break (insert
        // asserts on it).
        let coords = (0..30)
            .map(|i| (2 * i, 10. * f64::from(i), 0.))
            .collect::<Vec<_>>();
        let points = stream(7, &coords);
        let mut level = SlidingLevel::new(2, 1., points.len());
        for e in 0..points.len() as u32 {
            level.insert(&points, e);
            level.compute_centers(&points);
        }
        // Window of 7 with one point every 2 ticks: at most 4 alive, one
        // cluster each, which overflows k = 2.
        assert!(!level.is_feasible());
    }

    #[test]
    fn test_nearest_attractor_wins() {
        let points = stream(100, &[(0, 0., 0.), (1, 10., 0.), (2, 9.2, 0.)]);
        let mut level = SlidingLevel::new(2, 1., points.len());
        for e in 0..points.len() as u32 {
            level.insert(&points, e);
        }
        level.compute_centers(&points);
        // Point 2 is within the radius of attractor 1 only.
        assert_eq!(level.find_cluster(2), level.find_cluster(1));
        assert_ne!(level.find_cluster(2), level.find_cluster(0));
    }
}
