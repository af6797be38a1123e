//! Edit mask synthesis.
//!
//! The mask tells the external service which pixels it may repaint: opaque
//! white over the editable band, fully transparent everywhere else.

use crate::error::{EditError, Result};
use image::{Rgba, RgbaImage};
use std::io::Cursor;

/// Fraction of the canvas height, measured from the bottom, that the service
/// may edit. Product constant, not user-configurable.
pub const EDITABLE_BAND_FRACTION: f64 = 0.30;

/// A same-size companion to the normalized image marking the editable band.
#[derive(Debug, Clone)]
pub struct EditMask {
    image: RgbaImage,
    band_start: u32,
}

impl EditMask {
    /// Mask width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Mask height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// First row (top-down) of the editable band.
    pub fn band_start(&self) -> u32 {
        self.band_start
    }

    /// Returns true if the pixel at `(x, y)` is editable.
    pub fn is_editable(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y).0[3] == 255
    }

    /// Encodes the mask as PNG bytes for staging.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buffer, image::ImageFormat::Png)
            .map_err(|e| EditError::Staging(std::io::Error::other(e.to_string())))?;
        Ok(buffer.into_inner())
    }
}

/// Builds the edit mask for a canvas of the given dimensions.
///
/// Pure function of the dimensions: a fully transparent canvas with an
/// opaque white rectangle spanning the full width and the bottom
/// [`EDITABLE_BAND_FRACTION`] of the height. A row is editable exactly when
/// `y >= height * 0.7`, so the band never creeps above the 70% line when
/// the fraction does not divide the height evenly.
pub fn synthesize(width: u32, height: u32) -> EditMask {
    let band_rows = (height as f64 * EDITABLE_BAND_FRACTION).floor() as u32;
    let band_start = height - band_rows;

    let mut image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    for y in band_start..height {
        for x in 0..width {
            image.put_pixel(x, y, Rgba([255, 255, 255, 255]));
        }
    }

    EditMask { image, band_start }
}
