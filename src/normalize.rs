//! Input normalization: arbitrary upload to a fixed square canvas.

use crate::error::{EditError, Result};
use crate::request::RawImageInput;
use image::imageops::FilterType;
use image::{GenericImageView, Rgb, RgbImage};
use std::io::Cursor;

/// Edge length of the normalized square canvas, in pixels.
///
/// This is the fixed geometry the external edit service operates on; the
/// mask and the requested output size are derived from it.
pub const TARGET_EDGE: u32 = 1024;

/// Upper bound on a single input dimension, as a decode-bomb guard.
const MAX_INPUT_DIMENSION: u32 = 8192;

/// A room photo normalized to exactly [`TARGET_EDGE`]×[`TARGET_EDGE`].
///
/// The input is center-cropped to its shorter side and scaled edge-to-edge
/// onto an opaque white canvas; any source alpha is flattened against white.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    image: RgbImage,
}

impl NormalizedImage {
    /// Canvas width in pixels. Always [`TARGET_EDGE`].
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Canvas height in pixels. Always [`TARGET_EDGE`].
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encodes the canvas as PNG bytes for staging.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buffer, image::ImageFormat::Png)
            .map_err(|e| EditError::Staging(std::io::Error::other(e.to_string())))?;
        Ok(buffer.into_inner())
    }
}

/// Decodes the upload and normalizes it to the fixed square geometry.
///
/// Fails with [`EditError::Decode`] when the payload is not a decodable
/// raster image or carries absurd dimensions.
pub fn normalize(input: &RawImageInput) -> Result<NormalizedImage> {
    let decoded = image::load_from_memory(&input.bytes)
        .map_err(|e| EditError::Decode(e.to_string()))?;

    let (width, height) = decoded.dimensions();
    validate_dimensions(width, height)?;

    // Center-crop the longer dimension down to the shorter side. Content
    // outside the centered square is discarded.
    let side = width.min(height);
    let cropped = decoded.crop_imm((width - side) / 2, (height - side) / 2, side, side);

    // Scale edge-to-edge onto the target canvas, then flatten any alpha
    // against opaque white.
    let scaled = cropped
        .resize_exact(TARGET_EDGE, TARGET_EDGE, FilterType::Lanczos3)
        .to_rgba8();

    let mut canvas = RgbImage::from_pixel(TARGET_EDGE, TARGET_EDGE, Rgb([255, 255, 255]));
    for (x, y, pixel) in scaled.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        let blend = |src: u8| -> u8 { ((src as u32 * alpha + 255 * (255 - alpha)) / 255) as u8 };
        canvas.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }

    Ok(NormalizedImage { image: canvas })
}

fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(EditError::Decode("image has a zero dimension".into()));
    }
    if width > MAX_INPUT_DIMENSION || height > MAX_INPUT_DIMENSION {
        return Err(EditError::Decode(format!(
            "image too large: {width}x{height} (max edge {MAX_INPUT_DIMENSION})"
        )));
    }
    Ok(())
}
