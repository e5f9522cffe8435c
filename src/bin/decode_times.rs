//! Turns a binary time log into readable `seconds microseconds` lines.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};

use anyhow::{bail, Context};

fn main() -> anyhow::Result<()> {
    let args = std::env::args().collect::<Vec<_>>();
    if args.len() != 3 {
        bail!("usage: {} <time-log> <out>", args[0]);
    }
    let mut reader = BufReader::new(File::open(&args[1]).context("cannot open the time log")?);
    let mut writer = BufWriter::new(File::create(&args[2]).context("cannot create the output")?);
    let mut record = [0u8; 16];
    loop {
        match reader.read_exact(&mut record) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let secs = u64::from_le_bytes(record[..8].try_into().unwrap());
        let micros = u64::from_le_bytes(record[8..].try_into().unwrap());
        writeln!(writer, "{secs} {micros}")?;
        println!("{secs} {micros}");
    }
    writer.flush()?;
    Ok(())
}
