//! Binary format definitions for JMOV containers.

use std::ffi::OsString;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use super::config::ContainerConfig;
use super::error::{JmovError, Result};

/// Canonical file extension for JMOV containers.
pub const EXTENSION: &str = "jmov";

/// Byte offset of the `frame_count` field, rewritten after every append.
pub const FRAME_COUNT_OFFSET: u64 = 1;

/// Size of the fixed part of the header: dimension_count(1) + frame_count(8) + frame_rate(4).
pub const FIXED_HEADER_SIZE: usize = 13;

/// Container header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Number of frames currently stored.
    pub frame_count: u64,
    /// Nominal frames per second.
    pub frame_rate: u32,
    /// Per-axis extents of every frame.
    pub shape: Vec<u32>,
}

impl ContainerHeader {
    /// Build an empty header from a validated configuration.
    pub fn from_config(config: &ContainerConfig) -> Self {
        Self {
            frame_count: 0,
            frame_rate: config.frame_rate,
            shape: config.shape.clone(),
        }
    }

    pub fn dimension_count(&self) -> usize {
        self.shape.len()
    }

    /// Size of the header on disk.
    pub fn header_byte_length(&self) -> usize {
        FIXED_HEADER_SIZE + 4 * self.shape.len()
    }

    /// Size of one frame record (product of `shape`).
    pub fn frame_byte_length(&self) -> usize {
        self.shape.iter().map(|&d| d as usize).product()
    }

    /// Byte offset of frame `index` from the start of the file.
    pub fn frame_offset(&self, index: u64) -> u64 {
        self.header_byte_length() as u64 + index * self.frame_byte_length() as u64
    }

    /// Shape as `usize` extents, ready for array construction.
    pub fn dims(&self) -> Vec<usize> {
        self.shape.iter().map(|&d| d as usize).collect()
    }

    /// Write header to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let dimension_count = u8::try_from(self.shape.len()).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} dimensions do not fit in a JMOV header", self.shape.len()),
            )
        })?;
        w.write_all(&[dimension_count])?;
        w.write_all(&self.frame_count.to_le_bytes())?;
        w.write_all(&self.frame_rate.to_le_bytes())?;
        for extent in &self.shape {
            w.write_all(&extent.to_le_bytes())?;
        }
        Ok(())
    }

    /// Read and validate a header from input.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let mut fixed = [0u8; FIXED_HEADER_SIZE];
        read_header_bytes(r, &mut fixed)?;

        let dimension_count = fixed[0] as usize;
        if dimension_count == 0 {
            return Err(JmovError::Format("dimension count is zero".into()));
        }
        let frame_count = u64::from_le_bytes([
            fixed[1], fixed[2], fixed[3], fixed[4], fixed[5], fixed[6], fixed[7], fixed[8],
        ]);
        let frame_rate = u32::from_le_bytes([fixed[9], fixed[10], fixed[11], fixed[12]]);

        let mut raw_shape = vec![0u8; dimension_count * 4];
        read_header_bytes(r, &mut raw_shape)?;
        let shape: Vec<u32> = raw_shape
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        if let Some(axis) = shape.iter().position(|&d| d == 0) {
            return Err(JmovError::Format(format!("shape extent on axis {axis} is zero")));
        }
        let fits = shape
            .iter()
            .try_fold(1u64, |acc, &d| acc.checked_mul(d as u64))
            .is_some_and(|len| usize::try_from(len).is_ok());
        if !fits {
            return Err(JmovError::Format("frame byte length overflows".into()));
        }

        Ok(Self {
            frame_count,
            frame_rate,
            shape,
        })
    }
}

fn read_header_bytes<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            JmovError::Format("file is shorter than the container header".into())
        }
        _ => JmovError::Io(e),
    })
}

/// Ensure `path` carries the `.jmov` extension.
///
/// A different extension is kept and `.jmov` is appended after it, with a warning.
pub fn with_canonical_extension(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext == EXTENSION => path.to_path_buf(),
        ext => {
            if let Some(ext) = ext {
                log::warn!(
                    "File extension {:?} is not .{}, appending it to {}",
                    ext,
                    EXTENSION,
                    path.display()
                );
            }
            append_extension(path)
        }
    }
}

pub(crate) fn has_canonical_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == EXTENSION)
}

/// Append `.jmov` to the full file name, keeping any existing extension.
pub(crate) fn append_extension(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(EXTENSION);
    PathBuf::from(name)
}
