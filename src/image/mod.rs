//! Interleaved image views and owned buffers.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer of interleaved pixels
//! (`channels` samples per pixel) with an explicit stride. The stride counts
//! elements between the starts of consecutive rows, so a stride larger than
//! `width * channels` represents padded rows.

use crate::util::{AnchorDetError, AnchorDetResult};

#[cfg(feature = "image-io")]
pub mod io;
pub mod resize;

/// Borrowed interleaved image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width * channels`.
    pub fn from_slice(
        data: &'a [T],
        width: usize,
        height: usize,
        channels: usize,
    ) -> AnchorDetResult<Self> {
        let stride = width
            .checked_mul(channels)
            .ok_or(AnchorDetError::InvalidDimensions { width, height })?;
        Self::new(data, width, height, channels, stride)
    }

    /// Creates a view with an explicit stride.
    pub fn new(
        data: &'a [T],
        width: usize,
        height: usize,
        channels: usize,
        stride: usize,
    ) -> AnchorDetResult<Self> {
        let needed = required_len(width, height, channels, stride)?;
        if data.len() < needed {
            return Err(AnchorDetError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved samples per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the samples of pixel `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&'a [T]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = y
            .checked_mul(self.stride)?
            .checked_add(x.checked_mul(self.channels)?)?;
        self.data.get(start..start.checked_add(self.channels)?)
    }

    /// Returns a contiguous slice for row `y` with length `width * channels`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width * self.channels)?;
        self.data.get(start..end)
    }
}

/// Owned contiguous interleaved `u8` image.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: usize,
}

impl OwnedImage {
    /// Creates an owned image from a contiguous buffer of exactly
    /// `width * height * channels` samples.
    pub fn new(data: Vec<u8>, width: usize, height: usize, channels: usize) -> AnchorDetResult<Self> {
        let stride = width
            .checked_mul(channels)
            .ok_or(AnchorDetError::InvalidDimensions { width, height })?;
        let needed = required_len(width, height, channels, stride)?;
        if data.len() < needed {
            return Err(AnchorDetError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(AnchorDetError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Creates an image filled with a constant sample value.
    pub fn filled(width: usize, height: usize, channels: usize, value: u8) -> AnchorDetResult<Self> {
        let len = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(channels))
            .ok_or(AnchorDetError::InvalidDimensions { width, height })?;
        Self::new(vec![value; len], width, height, channels)
    }

    /// Copies a (possibly strided) view into a contiguous buffer.
    pub fn from_view(view: ImageView<'_, u8>) -> AnchorDetResult<Self> {
        let row_len = view.width() * view.channels();
        let mut data = Vec::with_capacity(row_len * view.height());
        for y in 0..view.height() {
            let row = view.row(y).ok_or(AnchorDetError::IndexOutOfBounds {
                index: y,
                len: view.height(),
                context: "row",
            })?;
            data.extend_from_slice(row);
        }
        Self::new(data, view.width(), view.height(), view.channels())
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            channels: self.channels,
            stride: self.width * self.channels,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved samples per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the contiguous sample buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the image and returns its sample buffer.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

fn required_len(
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
) -> AnchorDetResult<usize> {
    if width == 0 || height == 0 || channels == 0 {
        return Err(AnchorDetError::InvalidDimensions { width, height });
    }
    let row_len = width
        .checked_mul(channels)
        .ok_or(AnchorDetError::InvalidDimensions { width, height })?;
    if stride < row_len {
        return Err(AnchorDetError::InvalidStride { row_len, stride });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_len))
        .ok_or(AnchorDetError::InvalidDimensions { width, height })?;
    Ok(needed)
}
