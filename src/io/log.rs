//! The per-query log sinks: the ASCII clustering log and the binary timing
//! log. Both are explicit values owned by the caller and threaded through
//! the drivers; diagnostics go through the `log` crate instead.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// ASCII log of the ladder's answer after each query.
///
/// Short records are `<op> <index> <nb_points> c<level> <radius> <clusters>`;
/// the long form inserts the exact clustering radius before the cluster
/// count.
#[derive(Debug)]
pub struct LogSink {
    out: BufWriter<File>,
    long: bool,
}

impl LogSink {
    pub fn create(path: impl AsRef<Path>, long: bool) -> Result<Self> {
        Ok(LogSink {
            out: BufWriter::new(File::create(path)?),
            long,
        })
    }

    /// Whether records carry the exact radius, which is the expensive part.
    pub fn is_long(&self) -> bool {
        self.long
    }

    /// Writes one record. `true_radius` must be `Some` exactly when the sink
    /// is long.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &mut self,
        op: char,
        index: u32,
        nb_points: u32,
        level: usize,
        radius: f64,
        true_radius: Option<f64>,
        clusters: usize,
    ) -> Result<()> {
        debug_assert_eq!(self.long, true_radius.is_some());
        match true_radius {
            Some(true_radius) => writeln!(
                self.out,
                "{op} {index} {nb_points} c{level} {radius:.6} {true_radius:.6} {clusters}"
            )?,
            None => writeln!(
                self.out,
                "{op} {index} {nb_points} c{level} {radius:.6} {clusters}"
            )?,
        }
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Binary log of per-query wall-clock durations, written as raw
/// little-endian `(seconds, microseconds)` pairs in buffered blocks.
#[derive(Debug)]
pub struct TimeSink {
    out: BufWriter<File>,
}

impl TimeSink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(TimeSink {
            out: BufWriter::new(File::create(path)?),
        })
    }

    pub fn record(&mut self, elapsed: Duration) -> Result<()> {
        self.out.write_all(&elapsed.as_secs().to_le_bytes())?;
        self.out
            .write_all(&u64::from(elapsed.subsec_micros()).to_le_bytes())?;
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_long_records() {
        let dir = tempfile::tempdir().unwrap();
        let short_path = dir.path().join("short.log");
        let mut sink = LogSink::create(&short_path, false).unwrap();
        sink.record('a', 3, 1, 0, 1.5, None, 1).unwrap();
        sink.record('d', 3, 0, 0, 1.5, None, 0).unwrap();
        sink.finish().unwrap();
        let text = std::fs::read_to_string(&short_path).unwrap();
        assert_eq!(text, "a 3 1 c0 1.500000 1\nd 3 0 c0 1.500000 0\n");

        let long_path = dir.path().join("long.log");
        let mut sink = LogSink::create(&long_path, true).unwrap();
        sink.record('u', 2, 5, 3, 2., Some(1.25), 4).unwrap();
        sink.finish().unwrap();
        let text = std::fs::read_to_string(&long_path).unwrap();
        assert_eq!(text, "u 2 5 c3 2.000000 1.250000 4\n");
    }

    #[test]
    fn test_time_records_are_fixed_width() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("times.bin");
        let mut sink = TimeSink::create(&path).unwrap();
        sink.record(Duration::new(2, 345_000)).unwrap();
        sink.record(Duration::new(0, 1_000)).unwrap();
        sink.finish().unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(u64::from_le_bytes(bytes[0..8].try_into().unwrap()), 2);
        assert_eq!(u64::from_le_bytes(bytes[8..16].try_into().unwrap()), 345);
        assert_eq!(u64::from_le_bytes(bytes[24..32].try_into().unwrap()), 1);
    }
}
