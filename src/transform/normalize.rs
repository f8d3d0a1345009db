//! Conversion of interleaved `u8` pixels into planar `f32` network input.

use crate::image::ImageView;
use crate::util::{AnchorDetError, AnchorDetResult};

/// Per-channel affine normalization `value * scale[c] + bias[c]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizeParams {
    /// Multiplier per channel (up to four channels).
    pub scale: [f32; 4],
    /// Offset per channel, added after scaling.
    pub bias: [f32; 4],
    /// Emit channels in reverse order (RGB <-> BGR).
    pub reverse_channels: bool,
}

impl Default for NormalizeParams {
    fn default() -> Self {
        Self {
            scale: [1.0 / 255.0; 4],
            bias: [0.0; 4],
            reverse_channels: false,
        }
    }
}

/// Converts an interleaved HWC image into a planar CHW `f32` buffer.
pub fn normalize_nchw(
    image: ImageView<'_, u8>,
    params: &NormalizeParams,
) -> AnchorDetResult<Vec<f32>> {
    let channels = image.channels();
    if channels > 4 {
        return Err(AnchorDetError::InvalidConfig {
            reason: "normalization supports at most four channels",
        });
    }
    let width = image.width();
    let height = image.height();
    let plane = width * height;
    let mut out = vec![0.0f32; plane * channels];

    for y in 0..height {
        let row = image.row(y).ok_or(AnchorDetError::IndexOutOfBounds {
            index: y,
            len: height,
            context: "row",
        })?;
        for x in 0..width {
            let px = &row[x * channels..(x + 1) * channels];
            for (c, &value) in px.iter().enumerate() {
                let dst_c = if params.reverse_channels {
                    channels - 1 - c
                } else {
                    c
                };
                out[dst_c * plane + y * width + x] =
                    f32::from(value) * params.scale[c] + params.bias[c];
            }
        }
    }

    Ok(out)
}
