//! Loading pixel images through the `image` crate.
//!
//! Available when the `image-io` feature is enabled. Decoded images become
//! three-channel [`MultiImage`]s with values in `[0, 1]`.

use crate::image::MultiImage;
use crate::util::{SlideDetError, SlideDetResult};
use std::path::Path;

/// Converts an 8-bit RGB buffer.
pub fn multi_from_rgb_image(img: &image::RgbImage) -> MultiImage {
    let width = img.width() as usize;
    let height = img.height() as usize;
    MultiImage::from_fn(width, height, 3, |x, y, k| {
        f64::from(img.get_pixel(x as u32, y as u32)[k]) / 255.0
    })
}

/// Converts any decoded image to RGB first.
pub fn multi_from_dynamic_image(img: &image::DynamicImage) -> MultiImage {
    multi_from_rgb_image(&img.to_rgb8())
}

/// Loads an image from disk.
pub fn load_rgb_image<P: AsRef<Path>>(path: P) -> SlideDetResult<MultiImage> {
    let img = image::open(path).map_err(|err| SlideDetError::ImageIo {
        reason: err.to_string(),
    })?;
    Ok(multi_from_dynamic_image(&img))
}
