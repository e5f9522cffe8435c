//! One ladder level of the fully-adversarial algorithm: greedy k-center at a
//! fixed radius guess, with a randomised restart when a center is deleted.

use std::mem;

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::core::point::Metric;
use crate::core::set::SetCollection;
use crate::utils::helpers;

/// Greedy clustering state at one radius guess.
///
/// Clusters `0..nb` each have a center; set `k` is the overflow bucket for
/// elements that fit no cluster once all `k` centers exist. The level is
/// feasible exactly when the overflow bucket is empty.
#[derive(Debug)]
pub struct DynamicLevel {
    k: usize,
    radius: f64,
    centers: Vec<u32>,
    /// Running maximum distance from each center to its members. Only grows
    /// on insertion; deletions never shrink it.
    true_rad: Vec<f64>,
    clusters: SetCollection,
    scratch: Vec<u32>,
    rng: ChaCha8Rng,
}

impl DynamicLevel {
    /// A fresh level over elements `0..nb_points`.
    ///
    /// `cluster_size` pre-sizes each cluster's element array.
    pub fn new(k: usize, radius: f64, nb_points: usize, cluster_size: usize, rng: ChaCha8Rng) -> Self {
        DynamicLevel {
            k,
            radius,
            centers: Vec::with_capacity(k + 1),
            true_rad: Vec::with_capacity(k),
            clusters: SetCollection::new(k + 1, cluster_size, nb_points),
            scratch: Vec::with_capacity(nb_points),
            rng,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// The radius guess this level runs at.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Number of clusters currently open.
    pub fn nb_clusters(&self) -> usize {
        self.centers.len()
    }

    pub fn centers(&self) -> &[u32] {
        &self.centers
    }

    pub fn contains(&self, element: u32) -> bool {
        self.clusters.contains(element)
    }

    pub fn cluster_of(&self, element: u32) -> Option<usize> {
        self.clusters.set_of(element)
    }

    /// Whether every element sits in one of the k clusters.
    pub fn is_feasible(&self) -> bool {
        self.clusters.card(self.k) == 0
    }

    /// The largest recorded center-to-member distance, an upper bound on the
    /// current clustering radius.
    pub fn true_radius(&self) -> f64 {
        if self.true_rad.is_empty() {
            0.
        } else {
            helpers::arg_max(&self.true_rad).1
        }
    }

    /// Places `element` in the first cluster whose center is within the
    /// radius guess, or opens a new cluster around it, or parks it in the
    /// overflow bucket once all k centers exist.
    pub fn insert<P: Metric>(&mut self, points: &[P], element: u32) {
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

    /// Removes `element`. Deleting a center tears down its cluster and every
    /// later one, then re-inserts the survivors in a shuffled order; the
    /// shuffle is what keeps an adversarial deletion trace from steering the
    /// level into a persistently bad clustering.
    pub fn delete<P: Metric>(&mut self, points: &[P], element: u32) {
        let cluster = self
            .clusters
            .set_of(element)
            .expect("delete of an absent element");
        self.clusters.remove(element);
        if cluster < self.k && self.centers[cluster] == element {
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
        }
    }
}
