//! Container reader: header parsing, random access and sequential playback.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::error::{JmovError, Result};
use super::format::{
    ContainerHeader, FRAME_COUNT_OFFSET, append_extension, has_canonical_extension,
};
use super::frame::Frame;

/// Reads frames from a JMOV container.
///
/// Usage:
/// ```no_run
/// use jmov::VideoReader;
///
/// let mut reader = VideoReader::open("capture.jmov")?;
/// println!("{} frames at {} fps", reader.frame_count(), reader.frame_rate());
///
/// // Read a specific frame
/// let frame = reader.read_frame(0)?;
///
/// // Or iterate through all frames
/// for frame in reader.frames() {
///     let raster = frame?.into_array()?;
///     // Use raster...
/// }
/// # Ok::<(), jmov::JmovError>(())
/// ```
#[derive(Debug)]
pub struct VideoReader {
    reader: Option<BufReader<File>>,
    path: PathBuf,
    header: ContainerHeader,
    frame_byte_length: usize,
    header_byte_length: usize,
    /// Next frame returned by [`read_next`](Self::read_next).
    cursor: u64,
}

impl VideoReader {
    /// Open a container for reading.
    ///
    /// When `path` does not exist, the canonical `.jmov` extension is tried.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path = if path.exists() || has_canonical_extension(path) {
            path.to_path_buf()
        } else {
            append_extension(path)
        };

        let file = File::open(&path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let header = ContainerHeader::read_from(&mut reader)?;
        check_frames_present(&header, header.frame_count, file_len)?;

        log::debug!(
            "Opened {} ({} frames, shape {:?}, {} fps)",
            path.display(),
            header.frame_count,
            header.shape,
            header.frame_rate
        );

        Ok(Self {
            reader: Some(reader),
            path,
            frame_byte_length: header.frame_byte_length(),
            header_byte_length: header.header_byte_length(),
            header,
            cursor: 0,
        })
    }

    /// Read a frame: the one at `index`, or the next one in sequence when `None`.
    pub fn read(&mut self, index: Option<u64>) -> Result<Frame> {
        match index {
            Some(index) => self.read_frame(index),
            None => self.read_next(),
        }
    }

    /// Read a specific frame by index. The sequential cursor is not moved.
    pub fn read_frame(&mut self, index: u64) -> Result<Frame> {
        if self.reader.is_none() {
            return Err(JmovError::Closed);
        }
        if index >= self.header.frame_count {
            return Err(JmovError::IndexOutOfRange {
                index,
                frame_count: self.header.frame_count,
            });
        }
        self.load(index)
    }

    /// Read the frame at the cursor and advance it.
    pub fn read_next(&mut self) -> Result<Frame> {
        if self.reader.is_none() {
            return Err(JmovError::Closed);
        }
        if self.cursor >= self.header.frame_count {
            return Err(JmovError::EndOfStream);
        }
        let frame = self.load(self.cursor)?;
        self.cursor += 1;
        Ok(frame)
    }

    fn load(&mut self, index: u64) -> Result<Frame> {
        let reader = self.reader.as_mut().ok_or(JmovError::Closed)?;
        reader.seek(SeekFrom::Start(self.header.frame_offset(index)))?;

        let mut data = vec![0u8; self.frame_byte_length];
        reader.read_exact(&mut data).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                JmovError::Format(format!("frame {index} is truncated"))
            }
            _ => JmovError::Io(e),
        })?;

        Ok(Frame::new(index, self.header.dims(), data))
    }

    /// Iterate over all frames from the first, resetting the cursor.
    pub fn frames(&mut self) -> FrameIterator<'_> {
        self.cursor = 0;
        FrameIterator {
            reader: self,
            failed: false,
        }
    }

    /// Reset the cursor to the first frame.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Current cursor position.
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Re-read the on-disk frame count to pick up frames appended by a live writer.
    ///
    /// Returns the updated count, which never decreases.
    pub fn refresh(&mut self) -> Result<u64> {
        let reader = self.reader.as_mut().ok_or(JmovError::Closed)?;

        reader.seek(SeekFrom::Start(FRAME_COUNT_OFFSET))?;
        let mut buf8 = [0u8; 8];
        reader.read_exact(&mut buf8)?;
        let frame_count = u64::from_le_bytes(buf8);

        if frame_count > self.header.frame_count {
            let file_len = reader.get_ref().metadata()?.len();
            check_frames_present(&self.header, frame_count, file_len)?;
            log::trace!(
                "{} grew from {} to {} frames",
                self.path.display(),
                self.header.frame_count,
                frame_count
            );
            self.header.frame_count = frame_count;
        }
        Ok(self.header.frame_count)
    }

    /// Release the file handle. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.reader.take().is_some() {
            log::debug!("Closed {}", self.path.display());
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn frame_count(&self) -> u64 {
        self.header.frame_count
    }

    pub fn frame_rate(&self) -> u32 {
        self.header.frame_rate
    }

    pub fn shape(&self) -> &[u32] {
        &self.header.shape
    }

    pub fn frame_byte_length(&self) -> usize {
        self.frame_byte_length
    }

    pub fn header_byte_length(&self) -> usize {
        self.header_byte_length
    }
}

fn check_frames_present(header: &ContainerHeader, frame_count: u64, file_len: u64) -> Result<()> {
    let required = frame_count
        .checked_mul(header.frame_byte_length() as u64)
        .and_then(|bytes| bytes.checked_add(header.header_byte_length() as u64));
    match required {
        Some(required) if required <= file_len => Ok(()),
        _ => Err(JmovError::Format(format!(
            "header claims {frame_count} frames but the file holds only {file_len} bytes"
        ))),
    }
}

impl<'a> IntoIterator for &'a mut VideoReader {
    type Item = Result<Frame>;
    type IntoIter = FrameIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames()
    }
}

/// Iterator over container frames.
///
/// Ends cleanly after the last frame; stops after the first error.
pub struct FrameIterator<'a> {
    reader: &'a mut VideoReader,
    failed: bool,
}

impl<'a> Iterator for FrameIterator<'a> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.cursor >= self.reader.frame_count() {
            return None;
        }

        let result = self.reader.read_next();
        self.failed = result.is_err();
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        remaining_hint(self.reader.frame_count().saturating_sub(self.reader.cursor))
    }
}

// Frame counts are u64; the exact length only fits usize on 64-bit targets.
#[cfg(target_pointer_width = "64")]
impl<'a> ExactSizeIterator for FrameIterator<'a> {}

fn remaining_hint(remaining: u64) -> (usize, Option<usize>) {
    match usize::try_from(remaining) {
        Ok(n) => (n, Some(n)),
        Err(_) => (usize::MAX, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ContainerConfig, VideoWriter};
    use ndarray::array;
    use proptest::prelude::*;
    use std::fs::{self, OpenOptions};
    use std::io::Write;
    use tempfile::tempdir;

    fn write_container(path: &Path, shape: &[u32], frames: &[Vec<u8>]) -> PathBuf {
        let mut writer = VideoWriter::create(path, ContainerConfig::new(shape, 30)).unwrap();
        for frame in frames {
            writer.append(frame).unwrap();
        }
        writer.close().unwrap();
        writer.path().unwrap().to_path_buf()
    }

    #[test]
    fn test_single_frame_scenario() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scenario.jmov");
        write_container(&path, &[2, 2], &[vec![1, 2, 3, 4]]);

        let mut reader = VideoReader::open(&path).unwrap();
        assert_eq!(reader.frame_count(), 1);
        assert_eq!(reader.frame_rate(), 30);
        assert_eq!(reader.shape(), &[2, 2]);

        let raster = reader.read(Some(0)).unwrap().into_array().unwrap();
        assert_eq!(raster, array![[1u8, 2], [3, 4]].into_dyn());

        let mut frames = reader.frames();
        assert_eq!(frames.size_hint(), (1, Some(1)));
        assert_eq!(frames.next().unwrap().unwrap().as_bytes(), &[1, 2, 3, 4]);
        assert!(frames.next().is_none());
    }

    #[test]
    fn test_multiple_frames_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("multi.jmov");
        let frames: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i * 10, i * 10 + 1, i * 10 + 2]).collect();
        write_container(&path, &[3], &frames);

        let mut reader = VideoReader::open(&path).unwrap();
        assert_eq!(reader.header_byte_length(), 17);
        assert_eq!(reader.frame_byte_length(), 3);

        // Indexed, out of order
        for i in [4u64, 0, 2, 1, 3] {
            let frame = reader.read_frame(i).unwrap();
            assert_eq!(frame.index(), i);
            assert_eq!(frame.as_bytes(), frames[i as usize].as_slice());
        }

        // Sequential
        for expected in &frames {
            assert_eq!(reader.read(None).unwrap().as_bytes(), expected.as_slice());
        }
        assert!(matches!(reader.read(None), Err(JmovError::EndOfStream)));
    }

    #[test]
    fn test_iteration_restarts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("restart.jmov");
        let frames = vec![vec![1u8, 1], vec![2, 2], vec![3, 3]];
        write_container(&path, &[2], &frames);

        let mut reader = VideoReader::open(&path).unwrap();
        reader.read_next().unwrap();
        reader.read_next().unwrap();
        assert_eq!(reader.position(), 2);

        let first: Vec<_> = reader.frames().map(|f| f.unwrap().into_bytes()).collect();
        assert_eq!(first, frames);

        let mut second = Vec::new();
        for frame in &mut reader {
            second.push(frame.unwrap().into_bytes());
        }
        assert_eq!(second, frames);
        assert_eq!(reader.position(), 3);

        reader.rewind();
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_explicit_index_keeps_cursor() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cursor.jmov");
        write_container(&path, &[1], &[vec![10], vec![20], vec![30]]);

        let mut reader = VideoReader::open(&path).unwrap();
        assert_eq!(reader.read(Some(2)).unwrap().as_bytes(), &[30]);
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read(None).unwrap().as_bytes(), &[10]);
        assert_eq!(reader.read(Some(0)).unwrap().as_bytes(), &[10]);
        assert_eq!(reader.read(None).unwrap().as_bytes(), &[20]);
    }

    #[test]
    fn test_boundaries() {
        let dir = tempdir().unwrap();

        let empty = write_container(&dir.path().join("empty.jmov"), &[2, 2], &[]);
        let mut reader = VideoReader::open(&empty).unwrap();
        assert_eq!(reader.frame_count(), 0);
        assert!(matches!(reader.read(None), Err(JmovError::EndOfStream)));
        assert!(matches!(
            reader.read(Some(0)),
            Err(JmovError::IndexOutOfRange {
                index: 0,
                frame_count: 0
            })
        ));
        assert_eq!(reader.frames().count(), 0);

        let two = write_container(&dir.path().join("two.jmov"), &[1], &[vec![1], vec![2]]);
        let mut reader = VideoReader::open(&two).unwrap();
        assert!(matches!(
            reader.read(Some(2)),
            Err(JmovError::IndexOutOfRange {
                index: 2,
                frame_count: 2
            })
        ));
        assert!(matches!(
            reader.read(Some(u64::MAX)),
            Err(JmovError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_closed_reader() {
        let dir = tempdir().unwrap();
        let path = write_container(&dir.path().join("closed.jmov"), &[1], &[vec![1]]);

        let mut reader = VideoReader::open(&path).unwrap();
        reader.close().unwrap();
        reader.close().unwrap();
        assert!(reader.is_closed());

        assert!(matches!(reader.read(Some(0)), Err(JmovError::Closed)));
        assert!(matches!(reader.read(None), Err(JmovError::Closed)));
        assert!(matches!(reader.refresh(), Err(JmovError::Closed)));

        let results: Vec<_> = reader.frames().collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(JmovError::Closed)));
    }

    #[test]
    fn test_count_visible_after_each_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("live.jmov");

        let mut writer = VideoWriter::create(&path, ContainerConfig::new([2, 3], 25)).unwrap();
        let mut follower = VideoReader::open(&path).unwrap();
        assert_eq!(follower.frame_count(), 0);

        for n in 1..=4u8 {
            writer.append(&[n; 6]).unwrap();

            let fresh = VideoReader::open(&path).unwrap();
            assert_eq!(fresh.frame_count(), u64::from(n));

            assert_eq!(follower.refresh().unwrap(), u64::from(n));
            let latest = follower.read_frame(u64::from(n) - 1).unwrap();
            assert_eq!(latest.as_bytes(), &[n; 6]);
        }
        writer.close().unwrap();
    }

    #[test]
    fn test_uncounted_trailing_bytes_are_ignored() {
        let dir = tempdir().unwrap();
        let path = write_container(&dir.path().join("trailing.jmov"), &[2], &[vec![5, 6]]);

        // A frame written without its count rewrite
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[7, 8]).unwrap();
        drop(file);

        let mut reader = VideoReader::open(&path).unwrap();
        assert_eq!(reader.frame_count(), 1);
        assert_eq!(reader.frames().count(), 1);
    }

    #[test]
    fn test_malformed_files() {
        let dir = tempdir().unwrap();

        let short = dir.path().join("short.jmov");
        fs::write(&short, [2u8, 0, 0]).unwrap();
        assert!(matches!(
            VideoReader::open(&short),
            Err(JmovError::Format(_))
        ));

        let no_dims = dir.path().join("nodims.jmov");
        let mut bytes = vec![0u8];
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&30u32.to_le_bytes());
        fs::write(&no_dims, &bytes).unwrap();
        assert!(matches!(
            VideoReader::open(&no_dims),
            Err(JmovError::Format(_))
        ));

        let truncated = dir.path().join("truncated.jmov");
        let header = ContainerHeader {
            frame_count: 3,
            frame_rate: 30,
            shape: vec![4],
        };
        let mut bytes = Vec::new();
        header.write_to(&mut bytes).unwrap();
        bytes.extend_from_slice(&[0u8; 4]);
        fs::write(&truncated, &bytes).unwrap();
        assert!(matches!(
            VideoReader::open(&truncated),
            Err(JmovError::Format(_))
        ));
    }

    #[test]
    fn test_open_adds_extension() {
        let dir = tempdir().unwrap();
        write_container(&dir.path().join("clip"), &[1], &[vec![9]]);

        let reader = VideoReader::open(dir.path().join("clip")).unwrap();
        assert_eq!(reader.path(), dir.path().join("clip.jmov"));
        assert_eq!(reader.frame_count(), 1);

        let missing = VideoReader::open(dir.path().join("missing"));
        assert!(matches!(missing, Err(JmovError::Io(_))));
    }

    #[test]
    fn test_open_appends_extension_silently() {
        let dir = tempdir().unwrap();
        write_container(&dir.path().join("take.raw.jmov"), &[1], &[vec![9]]);

        let mut logger = crate::test_util::logger();

        let reader = VideoReader::open(dir.path().join("take.raw")).unwrap();
        assert_eq!(reader.path(), dir.path().join("take.raw.jmov"));

        let missing = VideoReader::open(dir.path().join("absent.avi"));
        assert!(matches!(missing, Err(JmovError::Io(_))));

        let warnings = crate::test_util::warnings(&mut logger);
        assert!(
            !warnings
                .iter()
                .any(|w| w.contains("take.raw") || w.contains("absent.avi")),
            "{warnings:?}"
        );
    }

    #[test]
    fn test_remaining_hint_never_truncates() {
        assert_eq!(remaining_hint(0), (0, Some(0)));
        assert_eq!(remaining_hint(42), (42, Some(42)));

        match usize::try_from(u64::MAX) {
            Ok(n) => assert_eq!(remaining_hint(u64::MAX), (n, Some(n))),
            Err(_) => assert_eq!(remaining_hint(u64::MAX), (usize::MAX, None)),
        }
    }

    fn container_strategy() -> impl Strategy<Value = (Vec<u32>, u32, Vec<Vec<u8>>)> {
        (prop::collection::vec(1u32..5, 1..4), 1u32..240).prop_flat_map(|(shape, fps)| {
            let len = shape.iter().product::<u32>() as usize;
            (
                Just(shape),
                Just(fps),
                prop::collection::vec(prop::collection::vec(any::<u8>(), len), 0..6),
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_frames_roundtrip((shape, fps, frames) in container_strategy()) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("prop.jmov");

            let mut writer = VideoWriter::create(&path, ContainerConfig::new(shape.clone(), fps)).unwrap();
            for frame in &frames {
                writer.append(frame).unwrap();
            }
            writer.close().unwrap();

            let mut reader = VideoReader::open(&path).unwrap();
            prop_assert_eq!(reader.frame_count(), frames.len() as u64);
            prop_assert_eq!(reader.frame_rate(), fps);
            prop_assert_eq!(reader.shape(), shape.as_slice());

            for (i, expected) in frames.iter().enumerate() {
                let frame = reader.read_frame(i as u64).unwrap();
                prop_assert_eq!(frame.as_bytes(), expected.as_slice());
            }

            let iterated: Vec<Vec<u8>> = reader
                .frames()
                .map(|f| f.unwrap().into_bytes())
                .collect();
            prop_assert_eq!(iterated, frames);
        }
    }
}
