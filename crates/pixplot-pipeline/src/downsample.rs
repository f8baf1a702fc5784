//! Area-averaging downsampling to a maximum working resolution.
//!
//! Reduces the intensity image so the longest axis is at most
//! `max_dimension`. Each output pixel is the mean of the block of source
//! pixels it covers ([`image::imageops::thumbnail`]), so thin dark
//! strokes fade to gray instead of vanishing as they would with
//! nearest-neighbor sampling.
//!
//! Intensity is averaged premultiplied by alpha so transparent pixels
//! do not drag the average toward whatever color they happen to store.
//! Both planes go through a 16-bit `LumaA` buffer.
//!
//! Images already at or below the limit are returned unchanged; the
//! image is never upscaled.

use image::{ImageBuffer, LumaA};

use crate::grayscale::IntensityImage;

/// Premultiplied intensity and alpha, both scaled to the full `u16` range.
type PremultipliedImage = ImageBuffer<LumaA<u16>, Vec<u16>>;

const FULL: f32 = 65_535.0;

/// Output dimensions for an image of `width`x`height` whose longest axis
/// must not exceed `max_dimension`.
///
/// The scale factor is `min(max/width, max/height, 1.0)`. Results are
/// rounded to the nearest pixel and never drop below 1.
#[must_use]
pub fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width == 0 || height == 0 || width.max(height) <= max_dimension {
        return (width, height);
    }
    let max = f64::from(max_dimension);
    let scale = (max / f64::from(width)).min(max / f64::from(height)).min(1.0);
    let scaled = |len: u32| {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n = (f64::from(len) * scale).round() as u32;
        n.clamp(1, max_dimension)
    };
    (scaled(width), scaled(height))
}

/// Downsample so the longest axis is at most `max_dimension` pixels.
///
/// Returns the (possibly unchanged) image and whether downsampling was
/// actually applied.
#[must_use]
pub fn downsample(image: &IntensityImage, max_dimension: u32) -> (IntensityImage, bool) {
    let (w, h) = target_dimensions(image.width, image.height, max_dimension);
    if (w, h) == (image.width, image.height) {
        return (image.clone(), false);
    }
    (area_average(image, w, h), true)
}

/// Resample `image` to exactly `new_width`x`new_height` by area averaging.
///
/// Intended for reduction; both targets must be non-zero and no larger
/// than the source.
#[must_use]
pub fn area_average(image: &IntensityImage, new_width: u32, new_height: u32) -> IntensityImage {
    let reduced = image::imageops::thumbnail(&premultiply(image), new_width, new_height);

    let (luma, alpha) = reduced
        .pixels()
        .map(|p| {
            let [weighted, coverage] = p.0;
            let luma = if coverage > 0 {
                let ratio = f32::from(weighted) / f32::from(coverage);
                (ratio * 255.0).clamp(0.0, 255.0)
            } else {
                0.0
            };
            (luma, f32::from(coverage) / FULL)
        })
        .unzip();

    IntensityImage {
        width: new_width,
        height: new_height,
        luma,
        alpha,
    }
}

fn premultiply(image: &IntensityImage) -> PremultipliedImage {
    ImageBuffer::from_fn(image.width, image.height, |x, y| {
        let alpha = image.alpha(x, y).clamp(0.0, 1.0);
        let luma = (image.intensity(x, y) / 255.0).clamp(0.0, 1.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let quantize = |v: f32| (v * FULL).round() as u16;
        LumaA([quantize(luma * alpha), quantize(alpha)])
    })
}
