//! Importers for the three on-disk point formats.
//!
//! All formats are line oriented and whitespace separated; parsing failures
//! report the file and the 1-based line they happened on.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::core::point::{GeoPoint, TimestampedPoint, Trajectory};
use crate::error::{Error, Result};

fn parse_f64(path: &Path, line_no: usize, token: Option<&str>, what: &str) -> Result<f64> {
    token
        .ok_or_else(|| Error::format(path, line_no, format!("missing {what}")))?
        .parse()
        .map_err(|_| Error::format(path, line_no, format!("invalid {what}")))
}

fn parse_u32(path: &Path, line_no: usize, token: Option<&str>, what: &str) -> Result<u32> {
    token
        .ok_or_else(|| Error::format(path, line_no, format!("missing {what}")))?
        .parse()
        .map_err(|_| Error::format(path, line_no, format!("invalid {what}")))
}

/// Reads a GPS points file: one `<id> <longitude> <latitude>` line per
/// point, the id ignored, coordinates in degrees.
pub fn import_geo_points(path: impl AsRef<Path>) -> Result<Vec<GeoPoint>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut points = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = line_no + 1;
        let mut tokens = line.split_whitespace();
        let _id = tokens
            .next()
            .ok_or_else(|| Error::format(path, line_no, "empty line"))?;
        let longitude = parse_f64(path, line_no, tokens.next(), "longitude")?;
        let latitude = parse_f64(path, line_no, tokens.next(), "latitude")?;
        points.push(GeoPoint::new(longitude, latitude));
    }
    log::info!("imported {} points from {}", points.len(), path.display());
    Ok(points)
}

/// Reads a sliding-window points file: `<in-date> <longitude> <latitude>`
/// lines in non-decreasing date order; every point expires `window` time
/// units after it arrives.
pub fn import_timestamped_points(
    path: impl AsRef<Path>,
    window: u32,
) -> Result<Vec<TimestampedPoint>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut points = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = line_no + 1;
        let mut tokens = line.split_whitespace();
        let in_date = parse_u32(path, line_no, tokens.next(), "date")?;
        let longitude = parse_f64(path, line_no, tokens.next(), "longitude")?;
        let latitude = parse_f64(path, line_no, tokens.next(), "latitude")?;
        points.push(TimestampedPoint::new(
            GeoPoint::new(longitude, latitude),
            in_date,
            window,
        ));
    }
    log::info!("imported {} points from {}", points.len(), path.display());
    Ok(points)
}

/// Reads a trajectory file.
///
/// The header line gives the trajectory count and the total point count;
/// each following line is `<id> <length> <lon>,<lat> ...` with the
/// coordinate pairs separated by commas or whitespace. Trajectories come
/// back with their buffers full and their revealed prefix empty.
pub fn import_trajectories(path: impl AsRef<Path>) -> Result<Vec<Trajectory>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();
    let header = lines
        .next()
        .ok_or_else(|| Error::format(path, 1, "empty file"))??;
    let mut tokens = header.split_whitespace();
    let nb_trajectories = parse_u32(path, 1, tokens.next(), "trajectory count")? as usize;
    let nb_points = parse_u32(path, 1, tokens.next(), "point count")? as usize;

    let mut trajectories = Vec::with_capacity(nb_trajectories);
    let mut total = 0usize;
    for (line_no, line) in lines.enumerate() {
        let line = line?;
        let line_no = line_no + 2;
        let mut tokens = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty());
        let _id = tokens
            .next()
            .ok_or_else(|| Error::format(path, line_no, "empty line"))?;
        let length = parse_u32(path, line_no, tokens.next(), "trajectory length")? as usize;
        let mut buffer = Vec::with_capacity(length);
        for _ in 0..length {
            let longitude = parse_f64(path, line_no, tokens.next(), "longitude")?;
            let latitude = parse_f64(path, line_no, tokens.next(), "latitude")?;
            buffer.push(GeoPoint::new(longitude, latitude));
        }
        total += length;
        trajectories.push(Trajectory::new(buffer));
    }
    if trajectories.len() != nb_trajectories || total != nb_points {
        return Err(Error::format(
            path,
            1,
            format!(
                "header declares {nb_trajectories} trajectories and {nb_points} points, \
                 file holds {} and {total}",
                trajectories.len()
            ),
        ));
    }
    log::info!(
        "imported {} trajectories ({} points) from {}",
        trajectories.len(),
        total,
        path.display()
    );
    Ok(trajectories)
}
