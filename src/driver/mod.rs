//! The ladder drivers: one clustering instance per radius guess, one query
//! fanned out to all of them, and the smallest feasible guess answering.

pub mod parallel;

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::point::{Metric, TimestampedPoint, Trajectory};
use crate::engine::dynamic::DynamicLevel;
use crate::engine::packed::PackedGroup;
use crate::engine::sliding::SlidingLevel;
use crate::engine::trajectory::TrajectoryLevel;
use crate::error::{Error, Result};
use crate::io::log::{LogSink, TimeSink};
use crate::io::query::{Query, QueryKind, QueryProvider};
use crate::utils::helpers;

/// Reports a per-query infeasibility without stopping the run; anything else
/// propagates.
fn report(outcome: Result<()>) -> Result<()> {
    match outcome {
        Err(Error::AllLevelsInfeasible(element)) => {
            log::error!("no feasible radius found after query on element {element}");
            Ok(())
        }
        other => other,
    }
}

/// The fully-adversarial ladder over GPS points.
#[derive(Debug)]
pub struct DynamicDriver {
    levels: Vec<DynamicLevel>,
    nb_points: u32,
}

impl DynamicDriver {
    pub fn new(
        k: usize,
        eps: f64,
        d_min: f64,
        d_max: f64,
        nb_points: usize,
        cluster_size: Option<usize>,
        seed: u64,
    ) -> Self {
        let cluster_size = cluster_size.unwrap_or(nb_points);
        let levels = helpers::ladder_radii(eps, d_min, d_max)
            .into_iter()
            .enumerate()
            .map(|(i, radius)| {
                let rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
                DynamicLevel::new(k, radius, nb_points, cluster_size, rng)
            })
            .collect::<Vec<_>>();
        log::info!("adversarial ladder with {} levels", levels.len());
        DynamicDriver {
            levels,
            nb_points: 0,
        }
    }

    pub fn levels(&self) -> &[DynamicLevel] {
        &self.levels
    }

    pub fn nb_points(&self) -> u32 {
        self.nb_points
    }

    pub fn contains(&self, element: u32) -> bool {
        self.levels[0].contains(element)
    }

    /// Index of the smallest feasible level, if any.
    pub fn smallest_feasible(&self) -> Option<usize> {
        self.levels.iter().position(DynamicLevel::is_feasible)
    }

    pub fn apply<P: Metric>(&mut self, points: &[P], query: Query) {
        match query.kind {
            QueryKind::Add => {
                self.nb_points += 1;
                for level in &mut self.levels {
                    level.insert(points, query.index);
                }
            }
            QueryKind::Remove => {
                self.nb_points -= 1;
                for level in &mut self.levels {
                    level.delete(points, query.index);
                }
            }
            QueryKind::Update => unreachable!("GPS streams carry no updates"),
        }
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

    /// Drains the query stream, applying each query to every level.
    pub fn run<P: Metric>(
        &mut self,
        points: &[P],
        queries: &mut QueryProvider,
        mut log: Option<&mut LogSink>,
        mut times: Option<&mut TimeSink>,
    ) -> Result<()> {
        while let Some(query) = queries.next_query(|e| self.contains(e))? {
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

/// The packed ladder: groups of levels sharing one lookup forest each.
#[derive(Debug)]
pub struct PackedDriver {
    groups: Vec<PackedGroup>,
    nb_points: u32,
}

impl PackedDriver {
    pub fn new(k: usize, eps: f64, d_min: f64, d_max: f64, nb_points: usize, seed: u64) -> Self {
        let nb_levels_total = helpers::ladder_len(eps, d_min, d_max);
        let nb_groups = (std::f64::consts::LN_2 / (1. + eps).ln()).floor().max(1.) as usize;
        let spare = nb_levels_total % nb_groups;
        let per_group = nb_levels_total / nb_groups;
        let mut base = d_min;
        let mut groups = Vec::with_capacity(nb_groups);
        for i in 0..nb_groups {
            let nb_levels = per_group + usize::from(i < spare);
            let rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
            groups.push(PackedGroup::new(k, base, nb_levels, nb_points, rng));
            base *= 1. + eps;
        }
        log::info!(
            "packed ladder with {nb_levels_total} levels in {nb_groups} groups"
        );
        PackedDriver {
            groups,
            nb_points: 0,
        }
    }

    pub fn groups(&self) -> &[PackedGroup] {
        &self.groups
    }

    pub fn nb_points(&self) -> u32 {
        self.nb_points
    }

    pub fn contains(&self, element: u32) -> bool {
        self.groups[0].contains(element)
    }

    /// The `(group, level-in-group)` pair with the smallest level among all
    /// feasible groups; earlier groups win ties, so the pair is also the one
    /// with the smallest flat ladder index.
    pub fn smallest_feasible(&self) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (group_index, group) in self.groups.iter().enumerate() {
            if let Some(level) = group.smallest_valid_level() {
                if level < group.nb_levels() && best.map_or(true, |(_, b)| level < b) {
                    best = Some((group_index, level));
                }
            }
        }
        best
    }

    pub fn apply<P: Metric>(&mut self, points: &[P], query: Query) {
        match query.kind {
            QueryKind::Add => {
                self.nb_points += 1;
                for group in &mut self.groups {
                    group.insert(points, query.index);
                }
            }
            QueryKind::Remove => {
                self.nb_points -= 1;
                for group in &mut self.groups {
                    group.delete(points, query.index);
                }
            }
            QueryKind::Update => unreachable!("GPS streams carry no updates"),
        }
        log::debug!("{} {}", query.kind.key(), query.index);
    }

    fn write_log<P: Metric>(&self, points: &[P], sink: &mut LogSink, query: Query) -> Result<()> {
        let (group_index, level) = self
            .smallest_feasible()
            .ok_or(Error::AllLevelsInfeasible(query.index))?;
        let group = &self.groups[group_index];
        let true_radius = sink.is_long().then(|| group.true_radius(points, level));
        sink.record(
            query.kind.key(),
            query.index,
            self.nb_points,
            level * self.groups.len() + group_index,
            group.radius(level),
            true_radius,
            group.nb_clusters(level),
        )
    }

    pub fn run<P: Metric>(
        &mut self,
        points: &[P],
        queries: &mut QueryProvider,
        mut log: Option<&mut LogSink>,
        mut times: Option<&mut TimeSink>,
    ) -> Result<()> {
        while let Some(query) = queries.next_query(|e| self.contains(e))? {
            let start = Instant::now();
            self.apply(points, query);
            if let Some(times) = times.as_deref_mut() {
                times.record(start.elapsed())?;
            }
            if let Some(log) = log.as_deref_mut() {
                report(self.write_log(points, log, query))?;
            }
        }
        Ok(())
    }
}

/// The sliding-window ladder. There is no query file: the point stream is
/// the query stream, one insertion per point in arrival order.
#[derive(Debug)]
pub struct SlidingDriver {
    levels: Vec<SlidingLevel>,
}

impl SlidingDriver {
    pub fn new(k: usize, eps: f64, d_min: f64, d_max: f64, nb_points: usize) -> Self {
        let levels = helpers::ladder_radii(eps, d_min, d_max)
            .into_iter()
            .map(|radius| SlidingLevel::new(k, radius, nb_points))
            .collect::<Vec<_>>();
        log::info!("sliding ladder with {} levels", levels.len());
        SlidingDriver { levels }
    }

    pub fn levels(&self) -> &[SlidingLevel] {
        &self.levels
    }

    pub fn smallest_feasible(&self) -> Option<usize> {
        self.levels.iter().position(SlidingLevel::is_feasible)
    }

    fn write_log(
        &self,
        points: &[TimestampedPoint],
        sink: &mut LogSink,
        element: u32,
    ) -> Result<()> {
        let chosen = self
            .smallest_feasible()
            .ok_or(Error::AllLevelsInfeasible(element))?;
        let level = &self.levels[chosen];
        let true_radius = sink.is_long().then(|| level.true_radius(points));
        sink.record(
            'a',
            level.last_point() - 1,
            level.window_len(),
            chosen,
            level.radius(),
            true_radius,
            level.nb_clusters(),
        )
    }

    pub fn run(
        &mut self,
        points: &[TimestampedPoint],
        mut log: Option<&mut LogSink>,
        mut times: Option<&mut TimeSink>,
    ) -> Result<()> {
        for element in 0..points.len() as u32 {
            let start = Instant::now();
            for level in &mut self.levels {
                level.insert(points, element);
            }
            for level in &mut self.levels {
                level.compute_centers(points);
            }
            if let Some(times) = times.as_deref_mut() {
                times.record(start.elapsed())?;
            }
            if let Some(log) = log.as_deref_mut() {
                report(self.write_log(points, log, element))?;
            }
        }
        Ok(())
    }
}

/// The serial trajectory ladder. Every query reveals one buffered point of
/// its trajectory first: a first reveal is an insertion, any later one an
/// update.
#[derive(Debug)]
pub struct TrajectoryDriver {
    levels: Vec<TrajectoryLevel>,
    nb_points: u32,
}

impl TrajectoryDriver {
    pub fn new(k: usize, eps: f64, d_min: f64, d_max: f64, nb_points: usize, seed: u64) -> Self {
        let levels = helpers::ladder_radii(eps, d_min, d_max)
            .into_iter()
            .enumerate()
            .map(|(i, radius)| {
                let rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
                TrajectoryLevel::new(k, radius, nb_points, rng)
            })
            .collect::<Vec<_>>();
        log::info!("trajectory ladder with {} levels", levels.len());
        TrajectoryDriver {
            levels,
            nb_points: 0,
        }
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

    /// Reveals the next point of trajectory `index` and returns the query it
    /// induces.
    fn upgrade(points: &mut [Trajectory], index: u32) -> Query {
        let kind = if points[index as usize].reveal() >= 1 {
            QueryKind::Update
        } else {
            QueryKind::Add
        };
        Query { kind, index }
    }

    pub fn apply(&mut self, points: &[Trajectory], query: Query) {
        match query.kind {
            QueryKind::Add => {
                self.nb_points += 1;
                for level in &mut self.levels {
                    level.insert(points, query.index);
                }
            }
            QueryKind::Update => {
                for level in &mut self.levels {
                    level.update(points, query.index);
                }
            }
            QueryKind::Remove => unreachable!("trajectory streams carry no removals"),
        }
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
            let query = Self::upgrade(points, index);
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
