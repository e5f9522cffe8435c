//! Command-line front end for the streaming k-center ladders.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use rand::Rng;

use centerline::io::{log::LogSink, log::TimeSink, points, query::QueryProvider};
use centerline::utils::helpers;
use centerline::{
    DynamicDriver, PackedDriver, ParallelTrajectoryDriver, SlidingDriver, TrajectoryDriver,
};

/// Streaming k-center over point, window and trajectory streams.
///
/// Exactly one mode flag must be given. The positional arguments are
/// `k eps [window] d_min d_max points_file [query_file]`, where `window`
/// exists only in sliding mode and `query_file` in every other mode.
#[derive(Debug, Parser)]
#[command(name = "centerline", version)]
struct Args {
    /// Sliding-window mode: insert-only, points expire after the window.
    #[arg(short = 's')]
    sliding: bool,

    /// Fully-adversarial mode over GPS points.
    #[arg(short = 'm')]
    adversarial: bool,

    /// Packed fully-adversarial mode (levels grouped into lookup forests).
    #[arg(short = 'o')]
    packed: bool,

    /// Trajectory mode under the Hausdorff distance.
    #[arg(short = 'p')]
    trajectories: bool,

    /// Write a per-query log to this file.
    #[arg(short = 'l', value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Log the exact clustering radius too (long records).
    #[arg(short = 't')]
    long_log: bool,

    /// Write per-query wall-clock durations to this binary file.
    #[arg(short = 'u', value_name = "FILE")]
    time_file: Option<PathBuf>,

    /// Trajectory mode only: spread the ladder over this many workers.
    #[arg(short = 'n', value_name = "THREADS")]
    nb_threads: Option<usize>,

    /// Capacity hint for per-cluster storage in adversarial mode.
    #[arg(short = 'c', value_name = "SIZE")]
    cluster_size: Option<usize>,

    /// k eps [window] d_min d_max points_file [query_file]
    #[arg(value_name = "ARGS")]
    positionals: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Sliding,
    Adversarial,
    Packed,
    Trajectories,
}

/// The validated run configuration.
#[derive(Debug)]
struct Config {
    mode: Mode,
    k: usize,
    eps: f64,
    window: u32,
    d_min: f64,
    d_max: f64,
    points_path: PathBuf,
    queries_path: PathBuf,
}

impl Config {
    fn from_args(args: &Args) -> anyhow::Result<Self> {
        let mode = match (args.sliding, args.adversarial, args.packed, args.trajectories) {
            (true, false, false, false) => Mode::Sliding,
            (false, true, false, false) => Mode::Adversarial,
            (false, false, true, false) => Mode::Packed,
            (false, false, false, true) => Mode::Trajectories,
            _ => bail!("exactly one of -s, -m, -o, -p is required"),
        };
        let expected = if mode == Mode::Sliding { 6 } else { 7 };
        if args.positionals.len() != expected {
            bail!(
                "expected {expected} positional arguments: k eps {}d_min d_max points_file{}",
                if mode == Mode::Sliding { "window " } else { "" },
                if mode == Mode::Sliding { "" } else { " query_file" },
            );
        }
        let mut next = args.positionals.iter();
        let k: usize = next
            .next()
            .unwrap()
            .parse()
            .context("positive k required")?;
        if k == 0 {
            bail!("positive k required");
        }
        let eps: f64 = next
            .next()
            .unwrap()
            .parse()
            .context("positive eps required")?;
        let window = if mode == Mode::Sliding {
            let window = next
                .next()
                .unwrap()
                .parse()
                .context("positive window required")?;
            if window == 0 {
                bail!("positive window required");
            }
            window
        } else {
            0
        };
        let d_min: f64 = next.next().unwrap().parse().context("invalid d_min")?;
        let d_max: f64 = next.next().unwrap().parse().context("invalid d_max")?;
        helpers::check_bounds(eps, d_min, d_max)?;
        let points_path = PathBuf::from(next.next().unwrap());
        let queries_path = next.next().map(PathBuf::from).unwrap_or_default();
        Ok(Config {
            mode,
            k,
            eps,
            window,
            d_min,
            d_max,
            points_path,
            queries_path,
        })
    }
}

fn run(args: &Args, config: &Config) -> anyhow::Result<()> {
    let mut log_sink = args
        .log_file
        .as_ref()
        .map(|path| LogSink::create(path, args.long_log))
        .transpose()
        .context("cannot create the log file")?;
    let mut time_sink = args
        .time_file
        .as_ref()
        .map(TimeSink::create)
        .transpose()
        .context("cannot create the time log file")?;
    let seed: u64 = rand::thread_rng().gen();
    log::debug!("ladder seed {seed}");

    let (k, eps, d_min, d_max) = (config.k, config.eps, config.d_min, config.d_max);
    match config.mode {
        Mode::Sliding => {
            let points = points::import_timestamped_points(&config.points_path, config.window)?;
            let mut driver = SlidingDriver::new(k, eps, d_min, d_max, points.len());
            driver.run(&points, log_sink.as_mut(), time_sink.as_mut())?;
        }
        Mode::Adversarial => {
            let points = points::import_geo_points(&config.points_path)?;
            let mut queries = QueryProvider::open(&config.queries_path)?;
            let mut driver = DynamicDriver::new(
                k,
                eps,
                d_min,
                d_max,
                points.len(),
                args.cluster_size,
                seed,
            );
            driver.run(&points, &mut queries, log_sink.as_mut(), time_sink.as_mut())?;
        }
        Mode::Packed => {
            let points = points::import_geo_points(&config.points_path)?;
            let mut queries = QueryProvider::open(&config.queries_path)?;
            let mut driver = PackedDriver::new(k, eps, d_min, d_max, points.len(), seed);
            driver.run(&points, &mut queries, log_sink.as_mut(), time_sink.as_mut())?;
        }
        Mode::Trajectories => {
            let mut points = points::import_trajectories(&config.points_path)?;
            let mut queries = QueryProvider::open(&config.queries_path)?;
            match args.nb_threads {
                Some(nb_threads) => {
                    if nb_threads == 0 {
                        bail!("positive number of threads required for -n");
                    }
                    let mut driver = ParallelTrajectoryDriver::new(
                        k,
                        eps,
                        d_min,
                        d_max,
                        points.len(),
                        nb_threads,
                        seed,
                    )?;
                    driver.run(
                        &mut points,
                        &mut queries,
                        log_sink.as_mut(),
                        time_sink.as_mut(),
                    )?;
                }
                None => {
                    let mut driver =
                        TrajectoryDriver::new(k, eps, d_min, d_max, points.len(), seed);
                    driver.run(
                        &mut points,
                        &mut queries,
                        log_sink.as_mut(),
                        time_sink.as_mut(),
                    )?;
                }
            }
        }
    }

    if let Some(sink) = log_sink.as_mut() {
        sink.finish()?;
    }
    if let Some(sink) = time_sink.as_mut() {
        sink.finish()?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "k: {} eps: {} d_min: {} d_max: {}",
        config.k,
        config.eps,
        config.d_min,
        config.d_max
    );
    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
