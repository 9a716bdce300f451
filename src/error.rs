//! Crate-wide error type.
//!
//! Parsers never fail on malformed tool output; they degrade and record
//! diagnostics instead. The variants here cover misuse of the parser API and
//! failures of the surrounding CLI plumbing (I/O, config, patterns).

use std::path::PathBuf;

/// Errors raised by krazy2view.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid checker count {0}: at least one checker is required")]
    InvalidCheckerCount(usize),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Invalid report pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this error is a parser precondition violation.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
