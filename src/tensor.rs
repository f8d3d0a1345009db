//! Borrowed views of raw network output tensors.
//!
//! Output heads use the `(batch, height, width, channels)` layout with
//! row-major strides derived from the declared dims. The last dimension packs
//! `num_anchors * detect_dim` values per grid cell.

use crate::util::{AnchorDetError, AnchorDetResult};

/// Borrowed 4-D `f32` tensor in NHWC layout.
#[derive(Copy, Clone, Debug)]
pub struct TensorView<'a> {
    data: &'a [f32],
    dims: [usize; 4],
    strides: [usize; 4],
}

impl<'a> TensorView<'a> {
    /// Creates a view over `data` with dims `[batch, height, width, channels]`.
    pub fn new(data: &'a [f32], dims: [usize; 4]) -> AnchorDetResult<Self> {
        if dims.iter().any(|&d| d == 0) {
            return Err(AnchorDetError::InvalidDimensions {
                width: dims[2],
                height: dims[1],
            });
        }
        let needed = dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or(AnchorDetError::InvalidDimensions {
                width: dims[2],
                height: dims[1],
            })?;
        if data.len() < needed {
            return Err(AnchorDetError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        let strides = [dims[1] * dims[2] * dims[3], dims[2] * dims[3], dims[3], 1];
        Ok(Self {
            data,
            dims,
            strides,
        })
    }

    /// Returns `[batch, height, width, channels]`.
    pub fn dims(&self) -> [usize; 4] {
        self.dims
    }

    /// Returns element strides for each dimension.
    pub fn strides(&self) -> [usize; 4] {
        self.strides
    }

    /// Returns the batch size.
    pub fn batch(&self) -> usize {
        self.dims[0]
    }

    /// Returns the grid height.
    pub fn height(&self) -> usize {
        self.dims[1]
    }

    /// Returns the grid width.
    pub fn width(&self) -> usize {
        self.dims[2]
    }

    /// Returns the channel count.
    pub fn channels(&self) -> usize {
        self.dims[3]
    }

    /// Returns the element at `(n, h, w, c)` if it is within bounds.
    pub fn get(&self, n: usize, h: usize, w: usize, c: usize) -> Option<f32> {
        if n >= self.dims[0] || h >= self.dims[1] || w >= self.dims[2] || c >= self.dims[3] {
            return None;
        }
        let idx = n * self.strides[0] + h * self.strides[1] + w * self.strides[2] + c;
        self.data.get(idx).copied()
    }

    /// Returns all values of batch item `n`.
    pub fn item(&self, n: usize) -> Option<&'a [f32]> {
        if n >= self.dims[0] {
            return None;
        }
        let start = n.checked_mul(self.strides[0])?;
        self.data.get(start..start.checked_add(self.strides[0])?)
    }
}

/// Owned output tensor, e.g. loaded from a dump.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedTensor {
    data: Vec<f32>,
    dims: [usize; 4],
}

impl OwnedTensor {
    /// Creates an owned tensor, validating the buffer against `dims`.
    pub fn new(data: Vec<f32>, dims: [usize; 4]) -> AnchorDetResult<Self> {
        TensorView::new(&data, dims)?;
        Ok(Self { data, dims })
    }

    /// Returns a borrowed view.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            data: &self.data,
            dims: self.dims,
            strides: [
                self.dims[1] * self.dims[2] * self.dims[3],
                self.dims[2] * self.dims[3],
                self.dims[3],
                1,
            ],
        }
    }

    /// Returns the declared dims.
    pub fn dims(&self) -> [usize; 4] {
        self.dims
    }

    /// Returns the backing buffer.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}
