//! Error types for reading and writing JMOV containers.

use std::io;

use super::config::ConfigError;

/// Errors raised by [`VideoWriter`](super::VideoWriter) and [`VideoReader`](super::VideoReader).
#[derive(Debug, thiserror::Error)]
pub enum JmovError {
    #[error("Invalid container configuration: {0}")]
    Configuration(#[from] ConfigError),
    #[error("Append mode is not supported; open the container in truncate mode")]
    UnsupportedMode,
    #[error("Frame has {actual} samples, expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("Container handle is closed")]
    Closed,
    #[error("Malformed container: {0}")]
    Format(String),
    #[error("Frame index {index} out of range (container holds {frame_count} frames)")]
    IndexOutOfRange { index: u64, frame_count: u64 },
    #[error("End of stream reached")]
    EndOfStream,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias used throughout the container module.
pub type Result<T> = std::result::Result<T, JmovError>;
