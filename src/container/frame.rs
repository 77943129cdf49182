//! Frame buffers: what the writer accepts and what the reader hands back.

use std::borrow::Cow;

use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn};
use serde::Serialize;

use super::error::{JmovError, Result};

/// Anything that can be appended to a container as one frame.
///
/// Samples are taken in row-major (logical) order, so nested buffers and
/// arrays of any dimensionality flatten the same way.
pub trait FrameData {
    /// Total number of 8-bit samples.
    fn sample_count(&self) -> usize;

    /// Samples flattened in row-major order.
    fn samples(&self) -> Cow<'_, [u8]>;
}

impl FrameData for [u8] {
    fn sample_count(&self) -> usize {
        self.len()
    }

    fn samples(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl<const N: usize> FrameData for [u8; N] {
    fn sample_count(&self) -> usize {
        N
    }

    fn samples(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl FrameData for Vec<u8> {
    fn sample_count(&self) -> usize {
        self.len()
    }

    fn samples(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self)
    }
}

impl FrameData for Vec<Vec<u8>> {
    fn sample_count(&self) -> usize {
        self.iter().map(Vec::len).sum()
    }

    fn samples(&self) -> Cow<'_, [u8]> {
        Cow::Owned(self.concat())
    }
}

impl<S, D> FrameData for ArrayBase<S, D>
where
    S: Data<Elem = u8>,
    D: Dimension,
{
    fn sample_count(&self) -> usize {
        self.len()
    }

    fn samples(&self) -> Cow<'_, [u8]> {
        match self.as_slice() {
            Some(slice) => Cow::Borrowed(slice),
            // Non-standard layout (transposed, strided view)
            None => Cow::Owned(self.iter().copied().collect()),
        }
    }
}

impl FrameData for Frame {
    fn sample_count(&self) -> usize {
        self.data.len()
    }

    fn samples(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.data)
    }
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    index: u64,
    shape: Vec<usize>,
    data: Vec<u8>,
}

impl Frame {
    pub(crate) fn new(index: u64, shape: Vec<usize>, data: Vec<u8>) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { index, shape, data }
    }

    /// Position of this frame in its container.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flat row-major samples.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reshape the samples into an N-dimensional raster.
    pub fn into_array(self) -> Result<ArrayD<u8>> {
        let expected = self.shape.iter().product();
        let actual = self.data.len();
        ArrayD::from_shape_vec(IxDyn(&self.shape), self.data)
            .map_err(|_| JmovError::ShapeMismatch { expected, actual })
    }
}
