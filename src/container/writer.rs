//! Container writer: header creation and incremental frame appends.

use std::fs::File;
use std::io::{self, BufWriter, Cursor, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::config::{ContainerConfig, OpenMode, WriterOptions};
use super::error::{JmovError, Result};
use super::format::{ContainerHeader, FRAME_COUNT_OFFSET, with_canonical_extension};
use super::frame::FrameData;

/// Seekable destination for container bytes.
pub trait FrameSink: Write + Seek {
    /// Push written data to durable storage.
    fn sync_data(&self) -> io::Result<()>;
}

impl FrameSink for File {
    fn sync_data(&self) -> io::Result<()> {
        File::sync_data(self)
    }
}

impl FrameSink for Cursor<Vec<u8>> {
    fn sync_data(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes frames to a new JMOV container.
///
/// The on-disk frame count is rewritten after every append, so a
/// [`VideoReader`](super::VideoReader) opened at any moment sees only
/// complete frames.
///
/// Usage:
/// ```no_run
/// use jmov::{ContainerConfig, VideoWriter};
///
/// let mut writer = VideoWriter::create("capture", ContainerConfig::new([2, 2], 30))?;
/// writer.append(&[1u8, 2, 3, 4])?;
/// writer.close()?;
/// # Ok::<(), jmov::JmovError>(())
/// ```
///
/// Dropping the writer releases the file handle, so early returns through
/// `?` never leak it. An I/O error during [`append`](Self::append) closes
/// the writer: the stream position is unknown at that point and further
/// frames would land at the wrong offset.
#[derive(Debug)]
pub struct VideoWriter<S: FrameSink = File> {
    writer: Option<BufWriter<S>>,
    path: Option<PathBuf>,
    header: ContainerHeader,
    frame_byte_length: usize,
    sync: bool,
}

impl VideoWriter<File> {
    /// Create a container, truncating any existing file at the normalized path.
    pub fn create<P: AsRef<Path>>(path: P, config: ContainerConfig) -> Result<Self> {
        Self::create_with(path, config, WriterOptions::default())
    }

    /// Create a container with explicit options.
    pub fn create_with<P: AsRef<Path>>(
        path: P,
        config: ContainerConfig,
        options: WriterOptions,
    ) -> Result<Self> {
        let path = with_canonical_extension(path.as_ref());
        config.validate()?;

        if options.mode == OpenMode::Append {
            return Err(JmovError::UnsupportedMode);
        }

        let file = File::create(&path)?;
        Self::start(file, Some(path), &config, options.sync)
    }
}

impl<S: FrameSink> VideoWriter<S> {
    /// Write a container into any seekable sink, e.g. an in-memory `Cursor`.
    pub fn from_sink(sink: S, config: ContainerConfig) -> Result<Self> {
        config.validate()?;
        Self::start(sink, None, &config, false)
    }

    fn start(sink: S, path: Option<PathBuf>, config: &ContainerConfig, sync: bool) -> Result<Self> {
        let header = ContainerHeader::from_config(config);
        let frame_byte_length = header.frame_byte_length();

        let mut writer = BufWriter::new(sink);
        header.write_to(&mut writer)?;
        writer.flush()?;
        if sync {
            writer.get_ref().sync_data()?;
        }

        let this = Self {
            writer: Some(writer),
            path,
            header,
            frame_byte_length,
            sync,
        };
        log::debug!(
            "Created {} (shape {:?}, {} fps, {} bytes/frame)",
            this.target(),
            this.header.shape,
            this.header.frame_rate,
            frame_byte_length
        );
        Ok(this)
    }

    /// Append one frame and publish the new frame count.
    ///
    /// Returns the number of frame bytes written.
    pub fn append<F: FrameData + ?Sized>(&mut self, frame: &F) -> Result<usize> {
        let writer = self.writer.as_mut().ok_or(JmovError::Closed)?;

        let actual = frame.sample_count();
        if actual != self.frame_byte_length {
            return Err(JmovError::ShapeMismatch {
                expected: self.frame_byte_length,
                actual,
            });
        }

        let frame_count = self.header.frame_count + 1;
        if let Err(e) = publish_frame(writer, &frame.samples(), frame_count, self.sync) {
            return Err(self.abandon(e));
        }
        self.header.frame_count = frame_count;

        log::trace!("Appended frame {} to {}", frame_count - 1, self.target());

        Ok(self.frame_byte_length)
    }

    /// Release the sink without flushing whatever a failed write left buffered.
    fn abandon(&mut self, error: io::Error) -> JmovError {
        if let Some(writer) = self.writer.take() {
            let _ = writer.into_parts();
        }
        log::error!(
            "Append to {} failed after {} frames, closing writer: {}",
            self.target(),
            self.header.frame_count,
            error
        );
        JmovError::Io(error)
    }

    /// Flush and release the sink. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            if self.sync {
                writer.get_ref().sync_data()?;
            }
            log::debug!(
                "Closed {} after {} frames",
                self.target(),
                self.header.frame_count
            );
        }
        Ok(())
    }

    /// Flush and hand back the underlying sink.
    pub fn into_inner(mut self) -> Result<S> {
        let writer = self.writer.take().ok_or(JmovError::Closed)?;
        writer
            .into_inner()
            .map_err(|e| JmovError::Io(e.into_error()))
    }

    pub fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Path the container was written to, including the canonical extension.
    ///
    /// `None` for writers built with [`from_sink`](Self::from_sink).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Number of frames appended and published so far.
    pub fn frame_count(&self) -> u64 {
        self.header.frame_count
    }

    pub fn frame_byte_length(&self) -> usize {
        self.frame_byte_length
    }

    fn target(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "in-memory sink".to_string(),
        }
    }
}

/// Write one frame record, then rewrite the count that covers it.
fn publish_frame<S: FrameSink>(
    writer: &mut BufWriter<S>,
    samples: &[u8],
    frame_count: u64,
    sync: bool,
) -> io::Result<()> {
    // Frame bytes must reach the sink before the count that covers them.
    writer.write_all(samples)?;
    writer.flush()?;
    if sync {
        writer.get_ref().sync_data()?;
    }

    writer.seek(SeekFrom::Start(FRAME_COUNT_OFFSET))?;
    writer.write_all(&frame_count.to_le_bytes())?;
    writer.flush()?;
    if sync {
        writer.get_ref().sync_data()?;
    }
    writer.seek(SeekFrom::End(0))?;
    Ok(())
}
