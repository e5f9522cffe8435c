//! The binary query stream.
//!
//! A query file is a packed sequence of 32-bit little-endian element indices.
//! An index carries no operation of its own: the driver decides what it means
//! from the state it already holds (present element → removal, absent →
//! insertion; trajectory drivers upgrade insertions to updates).

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::Result;

/// What a raw query index turned out to mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Add,
    Remove,
    Update,
}

impl QueryKind {
    /// The single-letter tag used in log records.
    pub fn key(self) -> char {
        match self {
            QueryKind::Add => 'a',
            QueryKind::Remove => 'd',
            QueryKind::Update => 'u',
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Query {
    pub kind: QueryKind,
    pub index: u32,
}

/// Buffered reader over a binary query file.
#[derive(Debug)]
pub struct QueryProvider {
    reader: BufReader<File>,
}

impl QueryProvider {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(QueryProvider {
            reader: BufReader::new(File::open(path)?),
        })
    }

    /// The next raw element index, or `None` at the end of the stream. A
    /// trailing partial record is ignored.
    pub fn next_index(&mut self) -> Result<Option<u32>> {
        let mut buf = [0u8; 4];
        match self.reader.read_exact(&mut buf) {
            Ok(()) => Ok(Some(u32::from_le_bytes(buf))),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The next query, resolved against the driver's current state:
    /// a present element is removed, an absent one added.
    pub fn next_query(&mut self, is_present: impl FnOnce(u32) -> bool) -> Result<Option<Query>> {
        Ok(self.next_index()?.map(|index| Query {
            kind: if is_present(index) {
                QueryKind::Remove
            } else {
                QueryKind::Add
            },
            index,
        }))
    }
}
