//! The worker-pool trajectory driver.
//!
//! One query at a time is broadcast across the ladder: every worker claims
//! its own levels, applies the query, and the barrier at the end of the
//! sweep hands control back to the driver before the log record is written.
//! Levels are partitioned exclusively between workers, so no per-level
//! locking is needed; queries stay strictly serialised.

use std::time::Instant;

use rayon::prelude::*;

use crate::core::point::Trajectory;
use crate::driver::report;
use crate::engine::trajectory::TrajectoryLevel;
use crate::error::{Error, Result};
use crate::io::log::{LogSink, TimeSink};
use crate::io::query::{Query, QueryKind, QueryProvider};
use crate::utils::helpers;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Debug)]
pub struct ParallelTrajectoryDriver {
    levels: Vec<TrajectoryLevel>,
    pool: rayon::ThreadPool,
    nb_points: u32,
}

impl ParallelTrajectoryDriver {
    pub fn new(
        k: usize,
        eps: f64,
        d_min: f64,
        d_max: f64,
        nb_points: usize,
        nb_threads: usize,
        seed: u64,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(nb_threads)
            .build()
            .map_err(|e| Error::InvalidArgument(format!("cannot build worker pool: {e}")))?;
        let levels = helpers::ladder_radii(eps, d_min, d_max)
            .into_iter()
            .enumerate()
            .map(|(i, radius)| {
                let rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
                TrajectoryLevel::new(k, radius, nb_points, rng)
            })
            .collect::<Vec<_>>();
        log::info!(
            "parallel trajectory ladder with {} levels on {nb_threads} workers",
            levels.len()
        );
        Ok(ParallelTrajectoryDriver {
            levels,
            pool,
            nb_points: 0,
        })
    }

    pub fn levels(&self) -> &[TrajectoryLevel] {
        &self.levels
    }

    pub fn nb_points(&self) -> u32 {
        self.nb_points
    }

    pub fn smallest_feasible(&self) -> Option<usize> {
        self.levels.iter().position(TrajectoryLevel::is_feasible)
    }

    /// Applies one query to every level on the pool and waits for the sweep
    /// to finish.
    pub fn apply(&mut self, points: &[Trajectory], query: Query) {
        if query.kind == QueryKind::Add {
            self.nb_points += 1;
        }
        let levels = &mut self.levels;
        self.pool.install(|| {
            levels.par_iter_mut().for_each(|level| match query.kind {
                QueryKind::Add => level.insert(points, query.index),
                QueryKind::Update => level.update(points, query.index),
                QueryKind::Remove => unreachable!("trajectory streams carry no removals"),
            });
        });
        log::debug!("{} {}", query.kind.key(), query.index);
    }

    fn write_log(&self, sink: &mut LogSink, query: Query) -> Result<()> {
        let chosen = self
            .smallest_feasible()
            .ok_or(Error::AllLevelsInfeasible(query.index))?;
        let level = &self.levels[chosen];
        let true_radius = sink.is_long().then(|| level.true_radius());
        sink.record(
            query.kind.key(),
            query.index,
            self.nb_points,
            chosen,
            level.radius(),
            true_radius,
            level.nb_clusters(),
        )
    }

    pub fn run(
        &mut self,
        points: &mut [Trajectory],
        queries: &mut QueryProvider,
        mut log: Option<&mut LogSink>,
        mut times: Option<&mut TimeSink>,
    ) -> Result<()> {
        while let Some(index) = queries.next_index()? {
            // The reveal happens once, before the fan-out; workers only read.
            let kind = if points[index as usize].reveal() >= 1 {
                QueryKind::Update
            } else {
                QueryKind::Add
            };
            let query = Query { kind, index };
            let start = Instant::now();
            self.apply(points, query);
            if let Some(times) = times.as_deref_mut() {
                times.record(start.elapsed())?;
            }
            if let Some(log) = log.as_deref_mut() {
                report(self.write_log(log, query))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::core::point::GeoPoint;
    use crate::driver::TrajectoryDriver;

    use super::*;

    fn trajectories() -> Vec<Trajectory> {
        vec![
            Trajectory::new(vec![GeoPoint::new(0., 0.), GeoPoint::new(0.2, 0.)]),
            Trajectory::new(vec![GeoPoint::new(0., 0.), GeoPoint::new(0.1, 0.)]),
            Trajectory::new(vec![GeoPoint::new(10., 0.), GeoPoint::new(10.3, 0.)]),
        ]
    }

    fn query_file(indices: &[u32]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for &index in indices {
            file.write_all(&index.to_le_bytes()).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parallel_matches_serial_ladder() {
        let queries = [0u32, 1, 2, 1, 0, 2];

        let mut serial_points = trajectories();
        let file = query_file(&queries);
        let mut provider = QueryProvider::open(file.path()).unwrap();
        let mut serial = TrajectoryDriver::new(2, 1., 1., 8., serial_points.len(), 42);
        serial
            .run(&mut serial_points, &mut provider, None, None)
            .unwrap();

        let mut parallel_points = trajectories();
        let file = query_file(&queries);
        let mut provider = QueryProvider::open(file.path()).unwrap();
        let mut parallel =
            ParallelTrajectoryDriver::new(2, 1., 1., 8., parallel_points.len(), 3, 42).unwrap();
        parallel
            .run(&mut parallel_points, &mut provider, None, None)
            .unwrap();

        // Same seeds, same queries, exclusive level partition: the two
        // ladders must agree level by level.
        assert_eq!(serial.nb_points(), parallel.nb_points());
        assert_eq!(serial.smallest_feasible(), parallel.smallest_feasible());
        for (s, p) in serial.levels().iter().zip(parallel.levels().iter()) {
            assert_eq!(s.centers(), p.centers());
            assert_eq!(s.nb_clusters(), p.nb_clusters());
        }
    }

    #[test]
    fn test_single_worker_pool_runs() {
        let mut points = trajectories();
        let file = query_file(&[0, 1, 2]);
        let mut provider = QueryProvider::open(file.path()).unwrap();
        let mut driver = ParallelTrajectoryDriver::new(2, 1., 1., 8., points.len(), 1, 7).unwrap();
        driver.run(&mut points, &mut provider, None, None).unwrap();
        assert_eq!(driver.nb_points(), 3);
        assert!(driver.smallest_feasible().is_some());
    }
}
