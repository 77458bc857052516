//! crates/logging-sink/src/error.rs
//! Errors raised while constructing handlers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to construct a handler or formatter.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The date format could not be parsed.
    #[error("invalid date format \"{format}\": {source}")]
    InvalidDateFormat {
        /// Format text as supplied.
        format: String,
        /// Parser error.
        #[source]
        source: time::error::InvalidFormatDescription,
    },
    /// A file handler was given an empty path.
    #[error("log file path is empty")]
    EmptyPath,
    /// The directory holding the log files could not be created.
    #[error("failed to create log directory {}: {source}", path.display())]
    Directory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
}
