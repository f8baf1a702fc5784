//! Binary thresholding: intensity image to foreground mask.
//!
//! Dark-on-light is the default convention: a pixel is foreground when
//! its intensity is at or below the threshold. Inverted polarity makes
//! pixels strictly brighter than the threshold foreground instead.
//!
//! Transparent pixels are background under either polarity.

use crate::grayscale::IntensityImage;
use crate::types::{BinaryMask, PipelineError};

/// Alpha coverage below which a pixel is treated as background.
pub const ALPHA_EPSILON: f32 = 0.05;

/// Threshold an intensity image into a [`BinaryMask`].
///
/// Intensities are rounded to the nearest integer before comparison so
/// floating-point noise from luminance weighting cannot flip a pixel
/// sitting exactly on the threshold.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the image has a zero
/// dimension.
pub fn threshold(
    image: &IntensityImage,
    threshold: u8,
    invert: bool,
) -> Result<BinaryMask, PipelineError> {
    let cutoff = f32::from(threshold);
    BinaryMask::from_fn(image.width(), image.height(), |x, y| {
        if image.alpha(x, y) < ALPHA_EPSILON {
            return false;
        }
        let intensity = image.intensity(x, y).round();
        if invert {
            intensity > cutoff
        } else {
            intensity <= cutoff
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(luma: &[f32], alpha: &[f32]) -> IntensityImage {
        IntensityImage {
            width: u32::try_from(luma.len()).unwrap(),
            height: 1,
            luma: luma.to_vec(),
            alpha: alpha.to_vec(),
        }
    }

    #[test]
    fn dark_pixels_are_foreground() {
        let img = row(&[0.0, 127.0, 128.0, 129.0, 255.0], &[1.0; 5]);
        let mask = threshold(&img, 128, false).unwrap();
        let fg: Vec<bool> = (0..5).map(|x| mask.get(x, 0)).collect();
        assert_eq!(fg, [true, true, true, false, false]);
    }

    #[test]
    fn inverted_polarity_selects_bright_pixels() {
        let img = row(&[0.0, 128.0, 129.0, 255.0], &[1.0; 4]);
        let mask = threshold(&img, 128, true).unwrap();
        let fg: Vec<bool> = (0..4).map(|x| mask.get(x, 0)).collect();
        assert_eq!(fg, [false, false, true, true]);
    }

    #[test]
    fn transparent_pixels_are_background() {
        let img = row(&[0.0, 0.0, 255.0], &[0.0, 1.0, 0.01]);
        assert!(!threshold(&img, 128, false).unwrap().get(0, 0));
        assert!(threshold(&img, 128, false).unwrap().get(1, 0));
        assert!(!threshold(&img, 128, true).unwrap().get(2, 0));
    }

    #[test]
    fn rounding_absorbs_luminance_noise() {
        let img = row(&[128.000_01, 127.999_99], &[1.0; 2]);
        let mask = threshold(&img, 128, false).unwrap();
        assert!(mask.get(0, 0));
        assert!(mask.get(1, 0));
    }

    #[test]
    fn threshold_zero_keeps_only_black() {
        let img = row(&[0.0, 1.0], &[1.0; 2]);
        let mask = threshold(&img, 0, false).unwrap();
        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 0));
    }
}
