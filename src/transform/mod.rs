//! Letterbox geometry between source images and the network input.
//!
//! A letterbox scales the source uniformly by
//! `scale = min(dst_w / src_w, dst_h / src_h)`, rounds the scaled size to the
//! nearest pixel and centers it in the destination with constant padding.
//! Padding splits as `floor(slack / 2)` before and the remainder after, so
//! odd slack puts the extra pixel on the right or bottom.

mod letterbox;
mod normalize;
mod unmap;

pub use letterbox::{letterbox_u8, LetterboxedImage};
pub use normalize::{normalize_nchw, NormalizeParams};
pub use unmap::Unmap;

use crate::util::{AnchorDetError, AnchorDetResult};

/// Pixel offsets added around the resized image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Padding {
    pub left: usize,
    pub right: usize,
    pub top: usize,
    pub bottom: usize,
}

impl Padding {
    /// Returns true when no padding is applied on any side.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Forward scale-and-pad mapping from a source image to the network input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letterbox {
    scale: f32,
    padding: Padding,
    src_width: usize,
    src_height: usize,
    dst_width: usize,
    dst_height: usize,
    resized_width: usize,
    resized_height: usize,
}

impl Letterbox {
    /// Computes the letterbox mapping for a source and target geometry.
    ///
    /// Equal source and target dimensions produce the identity mapping.
    pub fn compute(
        src_width: usize,
        src_height: usize,
        dst_width: usize,
        dst_height: usize,
    ) -> AnchorDetResult<Self> {
        if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
            return Err(AnchorDetError::InvalidGeometry {
                src_width,
                src_height,
                dst_width,
                dst_height,
            });
        }
        if src_width == dst_width && src_height == dst_height {
            return Self::identity(src_width, src_height);
        }

        let scale_x = dst_width as f64 / src_width as f64;
        let scale_y = dst_height as f64 / src_height as f64;
        let scale = scale_x.min(scale_y);

        let resized_width = ((scale * src_width as f64).round() as usize).clamp(1, dst_width);
        let resized_height = ((scale * src_height as f64).round() as usize).clamp(1, dst_height);

        let left = (dst_width - resized_width) / 2;
        let top = (dst_height - resized_height) / 2;
        let padding = Padding {
            left,
            right: dst_width - resized_width - left,
            top,
            bottom: dst_height - resized_height - top,
        };

        Ok(Self {
            scale: scale as f32,
            padding,
            src_width,
            src_height,
            dst_width,
            dst_height,
            resized_width,
            resized_height,
        })
    }

    /// Returns the no-op mapping for an image already at network size.
    pub fn identity(width: usize, height: usize) -> AnchorDetResult<Self> {
        if width == 0 || height == 0 {
            return Err(AnchorDetError::InvalidGeometry {
                src_width: width,
                src_height: height,
                dst_width: width,
                dst_height: height,
            });
        }
        Ok(Self {
            scale: 1.0,
            padding: Padding::default(),
            src_width: width,
            src_height: height,
            dst_width: width,
            dst_height: height,
            resized_width: width,
            resized_height: height,
        })
    }

    /// Returns the uniform scale factor.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Returns the padding around the resized image.
    pub fn padding(&self) -> Padding {
        self.padding
    }

    /// Returns the source image size `(width, height)`.
    pub fn src_size(&self) -> (usize, usize) {
        (self.src_width, self.src_height)
    }

    /// Returns the network input size `(width, height)`.
    pub fn dst_size(&self) -> (usize, usize) {
        (self.dst_width, self.dst_height)
    }

    /// Returns the size of the resized image before padding.
    pub fn resized_size(&self) -> (usize, usize) {
        (self.resized_width, self.resized_height)
    }

    /// Returns true when the mapping neither scales nor pads.
    pub fn is_identity(&self) -> bool {
        self.padding.is_zero()
            && self.src_width == self.dst_width
            && self.src_height == self.dst_height
    }

    /// Maps a source-image point into network-input coordinates.
    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x * self.scale + self.padding.left as f32,
            y * self.scale + self.padding.top as f32,
        )
    }
}
