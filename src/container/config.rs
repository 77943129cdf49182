//! Configuration types for creating JMOV containers.

use serde::{Deserialize, Serialize};

/// Largest number of axes a header can describe (`dimension_count` is a u8).
pub const MAX_DIMENSIONS: usize = u8::MAX as usize;

/// Immutable properties of a container, fixed when its header is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Per-axis extents of every frame, e.g. `[height, width, channels]`.
    pub shape: Vec<u32>,
    /// Nominal frames per second.
    pub frame_rate: u32,
}

impl ContainerConfig {
    pub fn new(shape: impl Into<Vec<u32>>, frame_rate: u32) -> Self {
        Self {
            shape: shape.into(),
            frame_rate,
        }
    }

    /// Number of samples (bytes) in one frame.
    ///
    /// Returns `None` when the product of `shape` does not fit in `usize`.
    pub fn frame_byte_length(&self) -> Option<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d as usize))
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shape.is_empty() {
            return Err(ConfigError::EmptyShape);
        }
        if self.shape.len() > MAX_DIMENSIONS {
            return Err(ConfigError::TooManyDimensions(self.shape.len()));
        }
        if let Some(axis) = self.shape.iter().position(|&d| d == 0) {
            return Err(ConfigError::ZeroExtent { axis });
        }
        if self.frame_rate == 0 {
            return Err(ConfigError::InvalidFrameRate);
        }
        if self.frame_byte_length().is_none() {
            return Err(ConfigError::FrameTooLarge);
        }
        Ok(())
    }
}

/// How the target file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenMode {
    /// Create the file, or truncate an existing one, and write a fresh header.
    #[default]
    Truncate,
    /// Continue appending to an existing container. Not implemented.
    Append,
}

/// Options controlling how a [`VideoWriter`](super::VideoWriter) touches the disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WriterOptions {
    #[serde(default)]
    pub mode: OpenMode,
    /// Call `sync_data` after the frame bytes and after the count rewrite.
    #[serde(default)]
    pub sync: bool,
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Shape must have at least one dimension")]
    EmptyShape,
    #[error("Shape has {0} dimensions, at most 255 are supported")]
    TooManyDimensions(usize),
    #[error("Shape extent on axis {axis} must be positive")]
    ZeroExtent { axis: usize },
    #[error("Frame rate must be positive")]
    InvalidFrameRate,
    #[error("Frame byte length overflows the address space")]
    FrameTooLarge,
}
