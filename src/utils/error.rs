//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use crate::parser::schema::Location;
use thiserror::Error;

/// Errors that can occur while loading profiling data
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read profile: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Truncated marshal stream at byte {0}")]
    UnexpectedEof(usize),

    #[error("Unsupported marshal type code 0x{code:02x} at byte {offset}")]
    UnsupportedType { code: u8, offset: usize },

    #[error("Invalid marshal back-reference {index} at byte {offset}")]
    InvalidReference { index: usize, offset: usize },

    #[error("Invalid profile format: {0}")]
    InvalidFormat(String),

    #[error("Duplicate entry for {0}")]
    DuplicateLocation(Location),
}

/// Errors that can occur while reconstructing the call graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A caller named in edge data has no entry of its own.
    #[error("Malformed input: {callee} lists unknown caller {caller}")]
    MalformedInput { caller: Location, callee: Location },

    #[error("No root found: all {records} functions have incoming calls")]
    NoRoot { records: usize },
}

/// Errors raised by tree navigation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("{key} is not a child of {parent}")]
    InvalidChildKey { parent: Location, key: Location },
}

/// Errors that can occur during flamegraph generation
#[derive(Error, Debug)]
pub enum FlamegraphError {
    #[error("Empty stack data")]
    EmptyStacks,

    #[error("Failed to render flamegraph: {0}")]
    RenderFailed(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to read file: {0}")]
    ReadFailed(std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
