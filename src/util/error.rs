//! Error types for anchordet.

use thiserror::Error;

/// Result alias for anchordet operations.
pub type AnchorDetResult<T> = std::result::Result<T, AnchorDetError>;

/// Errors that can occur while running the detection pipeline.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AnchorDetError {
    /// Source or target geometry cannot be letterboxed.
    #[error("invalid geometry: {src_width}x{src_height} -> {dst_width}x{dst_height}")]
    InvalidGeometry {
        src_width: usize,
        src_height: usize,
        dst_width: usize,
        dst_height: usize,
    },
    /// An image or tensor dimension is zero or overflows.
    #[error("invalid dimensions: width={width}, height={height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the packed row length.
    #[error("invalid stride: row length {row_len} exceeds stride {stride}")]
    InvalidStride { row_len: usize, stride: usize },
    /// Backing buffer is shorter than the declared shape requires.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Pipeline configuration is rejected at construction.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },
    /// A detection head cannot be decoded with its anchor table.
    #[error("malformed head {head}: {channels} channels, expected {expected}")]
    MalformedHead {
        head: usize,
        channels: usize,
        expected: usize,
    },
    /// An index is outside the valid range.
    #[error("{context} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// Image decoding failed.
    #[cfg(feature = "image-io")]
    #[error("image io: {reason}")]
    ImageIo { reason: String },
}
