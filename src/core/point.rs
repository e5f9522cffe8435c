//! The point types the engines cluster and the distances between them.
//!
//! All engines address points by index into one backing array owned by the
//! driver; the types here are the payloads of that array. Distances are plain
//! `f64` and every payload implements [`Metric`].

/// A distance function over a payload type.
///
/// A `Metric` must be symmetric, non-negative and zero on identical inputs;
/// the engines additionally rely on the triangle inequality when comparing a
/// point against cluster centers.
pub trait Metric {
    /// Returns the distance between `self` and `other`.
    fn distance(&self, other: &Self) -> f64;
}

/// A GPS coordinate pair, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        GeoPoint { longitude, latitude }
    }

    /// Same coordinates converted from degrees to radians, as needed by
    /// [`GeoPoint::great_circle`].
    pub fn to_radians(self) -> Self {
        GeoPoint {
            longitude: self.longitude.to_radians(),
            latitude: self.latitude.to_radians(),
        }
    }

    /// Planar distance with the longitude treated as a toroidal coordinate:
    /// two points 359 degrees apart are one degree from each other.
    pub fn euclidean(&self, other: &Self) -> f64 {
        let d_lat = self.latitude - other.latitude;
        let d_lon = (self.longitude - other.longitude).abs();
        let d_lon = d_lon.min(360. - d_lon);
        (d_lat * d_lat + d_lon * d_lon).sqrt()
    }

    /// Spherical distance between two points given in radians, in radians on
    /// the unit sphere.
    pub fn great_circle(&self, other: &Self) -> f64 {
        (self.latitude.sin() * other.latitude.sin()
            + self.latitude.cos() * other.latitude.cos() * (self.longitude - other.longitude).cos())
        .acos()
    }
}

impl Metric for GeoPoint {
    fn distance(&self, other: &Self) -> f64 {
        self.euclidean(other)
    }
}

/// A [`GeoPoint`] with an arrival date and the date its window expires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestampedPoint {
    pub point: GeoPoint,
    pub in_date: u32,
    pub exp_date: u32,
}

impl TimestampedPoint {
    /// A point arriving at `in_date` that stays alive for `window` time units.
    pub fn new(point: GeoPoint, in_date: u32, window: u32) -> Self {
        TimestampedPoint {
            point,
            in_date,
            exp_date: in_date + window,
        }
    }
}

impl Metric for TimestampedPoint {
    fn distance(&self, other: &Self) -> f64 {
        self.point.euclidean(&other.point)
    }
}

/// A polyline of geo-points that grows one point at a time.
///
/// The whole buffer is read at import time; `len` is the prefix revealed so
/// far and only that prefix takes part in distance computations. Update
/// queries grow the prefix, never the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    points: Vec<GeoPoint>,
    len: usize,
}

impl Trajectory {
    /// Wraps a fully-read point buffer as a trajectory with an empty prefix.
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Trajectory { points, len: 0 }
    }

    /// The revealed prefix.
    pub fn active(&self) -> &[GeoPoint] {
        &self.points[..self.len]
    }

    /// Total buffer capacity, fixed at import.
    pub fn capacity(&self) -> usize {
        self.points.len()
    }

    /// Reveals the next buffered point and returns the index it was appended
    /// at, so 0 means the trajectory was empty until now.
    ///
    /// # Panics
    ///
    /// If the buffer is already fully revealed.
    pub fn reveal(&mut self) -> usize {
        assert!(self.len < self.points.len(), "trajectory buffer exhausted");
        self.len += 1;
        self.len - 1
    }
}

/// One direction of the Hausdorff distance: the largest distance from a point
/// of `a` to its nearest point of `b`.
///
/// Points of `a` whose nearest neighbour is already known to lie under the
/// running maximum cannot change the result, so the inner scan abandons them
/// as soon as any distance drops below it.
fn directed_hausdorff(a: &[GeoPoint], b: &[GeoPoint]) -> f64 {
    let mut cmax = 0.;
    'points: for p in a {
        let mut cmin = f64::INFINITY;
        for q in b {
            let d = p.euclidean(q);
            if d < cmax {
                continue 'points;
            }
            if d < cmin {
                cmin = d;
            }
        }
        if cmin > cmax {
            cmax = cmin;
        }
    }
    cmax
}

impl Metric for Trajectory {
    /// Symmetric Hausdorff distance over the revealed prefixes, with the raw
    /// degree coordinates fed straight into the planar metric.
    fn distance(&self, other: &Self) -> f64 {
        let h_ab = directed_hausdorff(self.active(), other.active());
        let h_ba = directed_hausdorff(other.active(), self.active());
        h_ab.max(h_ba)
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    #[test]
    fn test_euclidean() {
        let a = GeoPoint::new(0., 0.);
        let b = GeoPoint::new(3., 4.);
        assert!(approx_eq!(f64, a.euclidean(&b), 5.));
        assert!(approx_eq!(f64, a.euclidean(&a), 0.));
        assert!(approx_eq!(f64, a.euclidean(&b), b.euclidean(&a)));
    }

    #[test]
    fn test_euclidean_wraps_longitude() {
        let a = GeoPoint::new(359.5, 0.);
        let b = GeoPoint::new(0.5, 0.);
        assert!(approx_eq!(f64, a.euclidean(&b), 1.));
    }

    #[test]
    fn test_great_circle() {
        let a = GeoPoint::new(0., 0.).to_radians();
        let b = GeoPoint::new(90., 0.).to_radians();
        assert!(approx_eq!(f64, a.great_circle(&b), std::f64::consts::FRAC_PI_2, epsilon = 1e-9));
    }

    #[test]
    fn test_trajectory_reveal() {
        let mut t = Trajectory::new(vec![GeoPoint::new(0., 0.), GeoPoint::new(1., 0.)]);
        assert!(t.active().is_empty());
        assert_eq!(t.reveal(), 0);
        assert_eq!(t.reveal(), 1);
        assert_eq!(t.active().len(), 2);
        assert_eq!(t.capacity(), 2);
    }

    fn trajectory(coords: &[(f64, f64)]) -> Trajectory {
        let mut t = Trajectory::new(coords.iter().map(|&(x, y)| GeoPoint::new(x, y)).collect());
        for _ in 0..coords.len() {
            t.reveal();
        }
        t
    }

    #[test]
    fn test_hausdorff() {
        let a = trajectory(&[(0., 0.), (1., 0.)]);
        let b = trajectory(&[(0., 0.), (1., 0.), (1., 2.)]);
        // Every point of `a` lies on `b`, but (1, 2) is two away from `a`.
        assert!(approx_eq!(f64, a.distance(&b), 2.));
        assert!(approx_eq!(f64, b.distance(&a), 2.));
        assert!(approx_eq!(f64, a.distance(&a), 0.));
    }

    #[test]
    fn test_hausdorff_prune_keeps_exact_value() {
        // The early-out must not inflate the result: the second point of `a`
        // is close to the tail of `b`, visited after the scan has already
        // seen larger distances.
        let a = trajectory(&[(0., 0.), (10., 0.)]);
        let b = trajectory(&[(0., 1.), (10., 1.)]);
        assert!(approx_eq!(f64, a.distance(&b), 1.));
    }
}
