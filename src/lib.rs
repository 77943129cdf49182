//! JMOV - Minimal container for uncompressed 8-bit raster frame sequences.
//!
//! A JMOV file stores frames of identical shape (e.g. `[height, width, 3]`
//! video frames) with a frame rate, and can be read back by index or in
//! sequence while it is still being written.
//!
//! # Architecture
//!
//! - `container`: Header format, [`VideoWriter`] and [`VideoReader`]
//! - `persist`: Saving named values as JSON, independent of the format
//!
//! # Example
//!
//! ```rust,no_run
//! use jmov::{ContainerConfig, VideoReader, VideoWriter};
//!
//! let mut writer = VideoWriter::create("gradient.jmov", ContainerConfig::new([2, 2], 30))?;
//! writer.append(&[1u8, 2, 3, 4])?;
//! writer.close()?;
//!
//! let mut reader = VideoReader::open("gradient.jmov")?;
//! for frame in reader.frames() {
//!     println!("{:?}", frame?.into_array()?);
//! }
//! # Ok::<(), jmov::JmovError>(())
//! ```

pub mod container;
pub mod persist;

#[cfg(test)]
mod test_util;

// Re-export commonly used types
pub use container::{
    ConfigError, ContainerConfig, ContainerHeader, Frame, FrameData, JmovError, VideoReader,
    VideoWriter, WriterOptions,
};
