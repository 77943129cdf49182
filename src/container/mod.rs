//! JMOV container reading and writing.
//!
//! A container holds a sequence of same-shaped frames of unsigned 8-bit
//! samples, stored uncompressed after a small header.
//!
//! # File Format
//!
//! All integers are little-endian:
//!
//! ```text
//! Header (13 + 4 * dimension_count bytes):
//!   Dimension count: u8
//!   Frame count: u64      (offset 1, rewritten after every append)
//!   Frame rate: u32
//!   Shape: u32 * dimension_count
//!
//! Frame records (frame_count * frame_byte_length bytes):
//!   Each frame is product(shape) u8 samples, row-major
//! ```
//!
//! Bytes after the last counted frame are ignored by readers, so an
//! interrupted append leaves the container readable.

mod config;
mod error;
mod format;
mod frame;
mod reader;
mod writer;

pub use config::{ConfigError, ContainerConfig, MAX_DIMENSIONS, OpenMode, WriterOptions};
pub use error::{JmovError, Result};
pub use format::{
    ContainerHeader, EXTENSION, FIXED_HEADER_SIZE, FRAME_COUNT_OFFSET, with_canonical_extension,
};
pub use frame::{Frame, FrameData};
pub use reader::{FrameIterator, VideoReader};
pub use writer::{FrameSink, VideoWriter};
