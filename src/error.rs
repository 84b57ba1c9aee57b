//! The error type shared by every fallible operation in this crate.

use std::io;
use thiserror::Error;

/// Errors reported while loading data, describing a search, or running one.
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter or combination of parameters is not acceptable.
    #[error("configuration error: {0}")]
    Config(String),

    /// A data file could not be parsed.
    #[error("format error on line {line}: {message}")]
    Format {
        /// Line of the input where parsing stopped.
        line: u64,
        /// What was wrong with it.
        message: String,
    },

    /// A caller-supplied buffer has the wrong element type.
    #[error("type error: expected {expected} elements, found {found}")]
    Type {
        /// The element type that is accepted.
        expected: &'static str,
        /// The element type that was supplied.
        found: &'static str,
    },

    /// A caller-supplied buffer has the wrong shape or memory layout.
    #[error("layout error: {0}")]
    Layout(String),

    /// An observed symbol falls outside the declared number of bins.
    #[error("variable {variable} has symbol {symbol} at sample {sample}, but only {bins} bins")]
    Domain {
        /// The offending variable.
        variable: usize,
        /// The offending sample.
        sample: usize,
        /// The symbol found there.
        symbol: i8,
        /// The bin count of the matrix.
        bins: usize,
    },

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The worker pool for a search could not be started.
    #[error("could not start search workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    /// Create a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Format error.
    pub fn format(line: u64, message: impl Into<String>) -> Self {
        Self::Format {
            line,
            message: message.into(),
        }
    }

    /// Create a Layout error.
    pub fn layout(message: impl Into<String>) -> Self {
        Self::Layout(message.into())
    }
}

/// Result type for operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;
