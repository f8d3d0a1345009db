//! Aspect-preserving resize and centered padding to the network input size.

use crate::image::resize::resize_bilinear_u8;
use crate::image::{ImageView, OwnedImage};
use crate::trace::{trace_event, trace_span};
use crate::transform::Letterbox;
use crate::util::{AnchorDetError, AnchorDetResult};

/// A letterboxed network input together with its mapping.
#[derive(Clone, Debug)]
pub struct LetterboxedImage {
    /// Resized and padded image at network size.
    pub image: OwnedImage,
    /// Mapping needed to bring detections back to the source image.
    pub letterbox: Letterbox,
}

/// Resizes `src` preserving aspect ratio and pads it to
/// `dst_width x dst_height` with `fill`, centered.
///
/// An image already at the target size is copied unchanged with an identity
/// mapping.
pub fn letterbox_u8(
    src: ImageView<'_, u8>,
    dst_width: usize,
    dst_height: usize,
    fill: u8,
) -> AnchorDetResult<LetterboxedImage> {
    let letterbox = Letterbox::compute(src.width(), src.height(), dst_width, dst_height)?;
    let _span = trace_span!(
        "letterbox",
        src_width = src.width(),
        src_height = src.height(),
        dst_width = dst_width,
        dst_height = dst_height
    )
    .entered();

    if letterbox.is_identity() {
        return Ok(LetterboxedImage {
            image: OwnedImage::from_view(src)?,
            letterbox,
        });
    }

    let (resized_width, resized_height) = letterbox.resized_size();
    let resized = resize_bilinear_u8(src, resized_width, resized_height)?;

    let channels = src.channels();
    let mut image = OwnedImage::filled(dst_width, dst_height, channels, fill)?;
    let pad = letterbox.padding();
    let dst_row_len = dst_width * channels;
    let src_row_len = resized_width * channels;
    let data = image.data_mut();
    let resized_view = resized.view();
    for y in 0..resized_height {
        let row = resized_view.row(y).ok_or(AnchorDetError::IndexOutOfBounds {
            index: y,
            len: resized_height,
            context: "row",
        })?;
        let start = (y + pad.top) * dst_row_len + pad.left * channels;
        data[start..start + src_row_len].copy_from_slice(row);
    }

    trace_event!(
        "letterbox_padding",
        left = pad.left,
        right = pad.right,
        top = pad.top,
        bottom = pad.bottom
    );
    Ok(LetterboxedImage { image, letterbox })
}
