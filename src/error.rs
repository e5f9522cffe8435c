//! Error kinds shared across the crate.

use std::path::PathBuf;

/// Convenience alias used by all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The failure modes of the clustering pipeline.
///
/// Success is expressed as `Ok(())`; there is no dedicated "no error" variant.
/// `AllLevelsInfeasible` is special: the drivers report it per query and keep
/// going, everything else aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A user-supplied argument was rejected during validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An underlying read, write, open or create failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An input file did not match the expected format.
    #[error("{path}: wrong format, incident occured line {line}: {message}")]
    FileFormat {
        /// File that failed to parse.
        path: PathBuf,
        /// 1-based line number of the offending line.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// Every level of the ladder holds more than k clusters.
    #[error("no feasible radius found after query on element {0}")]
    AllLevelsInfeasible(u32),
}

impl Error {
    /// Builds a `FileFormat` error for `path` at `line`.
    pub fn format(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Error::FileFormat {
            path: path.into(),
            line,
            message: message.into(),
        }
    }
}
