//! Builds a binary query file from a timestamped points file.
//!
//! Every input point emits, first, one query per older point that has
//! fallen out of the window (its deletion), then one query for the point
//! itself (its insertion). A readable copy of the indices goes to a side
//! file, and the maximum window population is printed at the end.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

use anyhow::{bail, Context};

fn main() -> anyhow::Result<()> {
    let args = std::env::args().collect::<Vec<_>>();
    if args.len() != 5 {
        bail!("usage: {} <points> <out> <out-readable> <duration>", args[0]);
    }
    let reader = BufReader::new(File::open(&args[1]).context("cannot open the points file")?);
    let mut out = BufWriter::new(File::create(&args[2]).context("cannot create the query file")?);
    let mut readable =
        BufWriter::new(File::create(&args[3]).context("cannot create the readable file")?);
    let duration: u64 = args[4].parse().context("positive duration required")?;

    let mut dates: Vec<u64> = Vec::new();
    let mut oldest = 0usize;
    let mut widest = 0usize;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let date: u64 = line
            .split_whitespace()
            .next()
            .with_context(|| format!("empty line {}", line_no + 1))?
            .parse()
            .with_context(|| format!("invalid date on line {}", line_no + 1))?;
        let current = dates.len();
        dates.push(date);
        widest = widest.max(current - oldest);
        while oldest < current && dates[oldest] + duration < date {
            out.write_all(&(oldest as u32).to_le_bytes())?;
            writeln!(readable, "{oldest}")?;
            oldest += 1;
        }
        out.write_all(&(current as u32).to_le_bytes())?;
        writeln!(readable, "{current}")?;
    }
    out.flush()?;
    readable.flush()?;
    println!("{widest}");
    Ok(())
}
