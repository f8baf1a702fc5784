//! Image decoding and intensity conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces an
//! [`IntensityImage`]: one luminance plane plus the alpha coverage that
//! downsampling and thresholding need to treat transparent pixels as
//! background.

use image::DynamicImage;

use crate::types::PipelineError;

/// Rec.601 luminance weights for red, green and blue.
const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

/// Single-channel intensity image with alpha coverage.
///
/// `luma` holds intensities in `0.0..=255.0`; `alpha` holds coverage in
/// `0.0..=1.0`. Both planes are row-major with `width * height` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityImage {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) luma: Vec<f32>,
    pub(crate) alpha: Vec<f32>,
}

impl IntensityImage {
    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Intensity at `(x, y)`, `0.0` (black) to `255.0` (white).
    #[must_use]
    pub fn intensity(&self, x: u32, y: u32) -> f32 {
        self.luma[self.index(x, y)]
    }

    /// Alpha coverage at `(x, y)`, `0.0` (transparent) to `1.0` (opaque).
    #[must_use]
    pub fn alpha(&self, x: u32, y: u32) -> f32 {
        self.alpha[self.index(x, y)]
    }

    const fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Decode raw image bytes.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    Ok(image::load_from_memory(bytes)?)
}

/// Convert a decoded image to intensity plus alpha.
///
/// Color sources use the Rec.601 weighting
/// `0.299*R + 0.587*G + 0.114*B`; images without an alpha channel are
/// fully opaque.
#[must_use = "returns the intensity image"]
pub fn to_intensity(image: &DynamicImage) -> IntensityImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut luma = Vec::with_capacity(rgba.len() / 4);
    let mut alpha = Vec::with_capacity(rgba.len() / 4);

    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let y = LUMA_WEIGHTS[2].mul_add(
            f32::from(b),
            LUMA_WEIGHTS[0].mul_add(f32::from(r), LUMA_WEIGHTS[1] * f32::from(g)),
        );
        luma.push(y.clamp(0.0, 255.0));
        alpha.push(f32::from(a) / 255.0);
    }

    IntensityImage {
        width,
        height,
        luma,
        alpha,
    }
}
