//! Convenience helpers for loading images via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{ImageView, OwnedImage};
use crate::util::{AnchorDetError, AnchorDetResult};
use std::path::Path;

/// Creates a borrowed view from an RGB image buffer.
pub fn view_from_rgb_image(img: &image::RgbImage) -> AnchorDetResult<ImageView<'_, u8>> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    ImageView::from_slice(img.as_raw(), width, height, 3)
}

/// Creates an owned three-channel image from a dynamic image.
pub fn owned_from_dynamic_image(img: &image::DynamicImage) -> AnchorDetResult<OwnedImage> {
    let rgb = img.to_rgb8();
    let width = rgb.width() as usize;
    let height = rgb.height() as usize;
    OwnedImage::new(rgb.into_raw(), width, height, 3)
}

/// Loads an image from disk and converts it to an owned RGB image.
pub fn load_rgb_image<P: AsRef<Path>>(path: P) -> AnchorDetResult<OwnedImage> {
    let img = image::open(path).map_err(|err| AnchorDetError::ImageIo {
        reason: err.to_string(),
    })?;
    owned_from_dynamic_image(&img)
}

/// Reads only the header of an image file and returns `(width, height)`.
pub fn image_dimensions<P: AsRef<Path>>(path: P) -> AnchorDetResult<(usize, usize)> {
    let (width, height) = image::image_dimensions(path).map_err(|err| AnchorDetError::ImageIo {
        reason: err.to_string(),
    })?;
    Ok((width as usize, height as usize))
}

/// Converts an owned RGB image back into an `image` buffer for saving.
pub fn to_rgb_image(img: &OwnedImage) -> AnchorDetResult<image::RgbImage> {
    if img.channels() != 3 {
        return Err(AnchorDetError::InvalidConfig {
            reason: "expected a three-channel image",
        });
    }
    let width = img.width() as u32;
    let height = img.height() as u32;
    image::RgbImage::from_raw(width, height, img.data().to_vec()).ok_or(
        AnchorDetError::BufferTooSmall {
            needed: img.width() * img.height() * 3,
            got: img.data().len(),
        },
    )
}
