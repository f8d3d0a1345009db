//! Bilinear resampling for interleaved `u8` images.
//!
//! Destination pixel centers are mapped with half-pixel alignment:
//! `src = (dst + 0.5) * (src_size / dst_size) - 0.5`, clamped to the valid
//! source range. Each channel is interpolated independently and rounded to
//! the nearest integer before clamping to `[0, 255]`.

use crate::image::{ImageView, OwnedImage};
use crate::util::{AnchorDetError, AnchorDetResult};

/// Resizes an interleaved image to `dst_width x dst_height` using bilinear
/// sampling. Returns an exact copy when the size is unchanged.
pub fn resize_bilinear_u8(
    src: ImageView<'_, u8>,
    dst_width: usize,
    dst_height: usize,
) -> AnchorDetResult<OwnedImage> {
    if dst_width == 0 || dst_height == 0 {
        return Err(AnchorDetError::InvalidDimensions {
            width: dst_width,
            height: dst_height,
        });
    }
    if dst_width == src.width() && dst_height == src.height() {
        return OwnedImage::from_view(src);
    }

    let channels = src.channels();
    let xs = axis_taps(src.width(), dst_width);
    let ys = axis_taps(src.height(), dst_height);

    let mut out = OwnedImage::filled(dst_width, dst_height, channels, 0)?;
    let dst_row_len = dst_width * channels;
    let data = out.data_mut();

    for (y, tap_y) in ys.iter().enumerate() {
        let row0 = src.row(tap_y.i0).ok_or(AnchorDetError::IndexOutOfBounds {
            index: tap_y.i0,
            len: src.height(),
            context: "row",
        })?;
        let row1 = src.row(tap_y.i1).ok_or(AnchorDetError::IndexOutOfBounds {
            index: tap_y.i1,
            len: src.height(),
            context: "row",
        })?;
        let dst_row = &mut data[y * dst_row_len..(y + 1) * dst_row_len];

        for (x, tap_x) in xs.iter().enumerate() {
            let a0 = tap_x.i0 * channels;
            let a1 = tap_x.i1 * channels;
            for c in 0..channels {
                let top = f32::from(row0[a0 + c]) * (1.0 - tap_x.frac)
                    + f32::from(row0[a1 + c]) * tap_x.frac;
                let bottom = f32::from(row1[a0 + c]) * (1.0 - tap_x.frac)
                    + f32::from(row1[a1 + c]) * tap_x.frac;
                let value = top * (1.0 - tap_y.frac) + bottom * tap_y.frac;
                dst_row[x * channels + c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    Ok(out)
}

#[derive(Clone, Copy, Debug)]
struct Tap {
    i0: usize,
    i1: usize,
    frac: f32,
}

fn axis_taps(src_len: usize, dst_len: usize) -> Vec<Tap> {
    let ratio = src_len as f32 / dst_len as f32;
    let max = (src_len - 1) as f32;
    (0..dst_len)
        .map(|d| {
            let s = ((d as f32 + 0.5) * ratio - 0.5).clamp(0.0, max);
            let i0 = s.floor() as usize;
            let i1 = (i0 + 1).min(src_len - 1);
            Tap {
                i0,
                i1,
                frac: s - i0 as f32,
            }
        })
        .collect()
}
