//! Error types for the spicerig harness.
//!
//! This module provides a unified error type [`SpiceRigError`] that covers
//! all error conditions that can occur while building netlists, talking to
//! the external simulator, and parsing its output artifacts.
//!
//! A failed or timed-out simulator *run* is deliberately not an error: the
//! process runner contains those in a [`crate::result::RunResult`] so that
//! batch sweeps can continue past a single bad parameter value.

use std::path::Path;

use thiserror::Error;

/// Result type alias using [`SpiceRigError`].
pub type Result<T> = std::result::Result<T, SpiceRigError>;

/// Unified error type for all spicerig operations.
#[derive(Error, Debug)]
pub enum SpiceRigError {
    // ============ Artifact Parsing Errors ============
    /// A simulator output artifact did not have the expected structure.
    #[error("Failed to parse {artifact} file '{path}': {message}")]
    ParseError {
        /// Which artifact kind was being read ("raw", "log", "net")
        artifact: &'static str,
        path: String,
        message: String,
    },

    /// The binary payload disagrees with the header's declared layout.
    #[error(
        "Payload mismatch in raw file '{path}': expected {expected} bytes \
         ({points} points x {vars} variables), found {found}"
    )]
    PayloadMismatch {
        path: String,
        points: usize,
        vars: usize,
        expected: usize,
        found: usize,
    },

    // ============ I/O Errors ============
    /// Error reading a netlist or artifact file.
    #[error("Failed to read '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing a netlist file or creating the run directory.
    #[error("Failed to write '{path}': {source}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SpiceRigError {
    /// Create a parse error for a given artifact kind.
    pub fn parse(artifact: &'static str, path: &Path, message: impl Into<String>) -> Self {
        Self::ParseError {
            artifact,
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    /// Create a file-read error with path context.
    pub fn read(path: &Path, source: std::io::Error) -> Self {
        Self::FileReadError {
            path: path.display().to_string(),
            source,
        }
    }

    /// Create a file-write error with path context.
    pub fn write(path: &Path, source: std::io::Error) -> Self {
        Self::FileWriteError {
            path: path.display().to_string(),
            source,
        }
    }
}
