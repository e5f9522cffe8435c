//! Streaming metric k-center clustering.
//!
//! The crate maintains an approximate k-center clustering of a point stream
//! under insertions and deletions. It runs a *ladder* of clustering
//! instances at geometrically spaced radius guesses and always answers from
//! the smallest guess that currently needs at most k clusters, which keeps
//! the reported radius within a constant factor of the optimum.
//!
//! Four regimes share the ladder design: insert-only streams under a sliding
//! time window, fully-adversarial insert/delete streams over GPS points, the
//! same streams over a packed forest that amortises deletions across level
//! groups, and adversarial streams of growing trajectories under the
//! Hausdorff distance, optionally fanned out over a worker pool.

#![deny(clippy::correctness)]
#![warn(clippy::all, clippy::suspicious, clippy::perf)]

pub mod core;
pub mod driver;
pub mod engine;
pub mod error;
pub mod io;
pub mod utils;

pub use crate::{
    core::point::{GeoPoint, Metric, TimestampedPoint, Trajectory},
    core::set::SetCollection,
    driver::{
        parallel::ParallelTrajectoryDriver, DynamicDriver, PackedDriver, SlidingDriver,
        TrajectoryDriver,
    },
    error::{Error, Result},
    io::log::{LogSink, TimeSink},
    io::query::{Query, QueryKind, QueryProvider},
};

/// The current version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
