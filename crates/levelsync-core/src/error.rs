//! Error types for levelsync-core

use thiserror::Error;

/// Wire-level error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Unexpected end of buffer: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: u64 },

    #[error("{0} trailing bytes after end of message")]
    TrailingBytes(usize),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
