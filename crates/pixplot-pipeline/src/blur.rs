//! Optional Gaussian smoothing before thresholding.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`]. A light blur rounds
//! off single-pixel jaggies along stroke edges, which shortens traced
//! contours and lets simplification remove more points.

use image::{GrayImage, Luma};

use crate::grayscale::IntensityImage;

/// Blur the intensity plane of `image`. Alpha is left untouched.
///
/// Non-positive sigma values return the image unchanged, since
/// `imageproc`'s underlying function panics on `sigma <= 0.0`.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur(image: &IntensityImage, sigma: f32) -> IntensityImage {
    if sigma <= 0.0 {
        return image.clone();
    }

    let gray = GrayImage::from_fn(image.width, image.height, |x, y| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let value = image.intensity(x, y).round().clamp(0.0, 255.0) as u8;
        Luma([value])
    });
    let blurred = imageproc::filter::gaussian_blur_f32(&gray, sigma);

    IntensityImage {
        width: image.width,
        height: image.height,
        luma: blurred.pixels().map(|p| f32::from(p.0[0])).collect(),
        alpha: image.alpha.clone(),
    }
}
