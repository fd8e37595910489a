// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decoding, fitting and encoding of page surfaces and
// uploaded pictures using the `image` crate.

use folio_core::error::{FolioError, Result};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::{debug, instrument};

/// Wraps one in-memory image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, so calls
/// chain:
///
/// ```ignore
/// let jpeg = ImageProcessor::from_rgba(surface)
///     .flatten(Rgba([255, 255, 255, 255]))
///     .to_jpeg_bytes(90)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode encoded bytes (JPEG, PNG, TIFF, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data)
            .map_err(|err| FolioError::ImageError(format!("failed to decode image: {}", err)))?;
        debug!(width = img.width(), height = img.height(), "Image decoded from bytes");
        Ok(Self { image: img })
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Wrap a rendered page surface.
    pub fn from_rgba(surface: RgbaImage) -> Self {
        Self {
            image: DynamicImage::ImageRgba8(surface),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Shrink to fit within `max_width` x `max_height`, preserving aspect
    /// ratio. Images already inside the box are returned unchanged.
    pub fn fit_within(self, max_width: u32, max_height: u32) -> Self {
        if self.width() <= max_width && self.height() <= max_height {
            return self;
        }
        let resized = self
            .image
            .resize(max_width, max_height, image::imageops::FilterType::Lanczos3);
        debug!(new_w = resized.width(), new_h = resized.height(), "Image fitted");
        Self { image: resized }
    }

    /// Composite onto an opaque background, dropping the alpha channel.
    pub fn flatten(self, background: Rgba<u8>) -> Self {
        let rgba = self.image.to_rgba8();
        let mut base = RgbaImage::from_pixel(rgba.width(), rgba.height(), background);
        image::imageops::overlay(&mut base, &rgba, 0, 0);
        Self {
            image: DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(base).to_rgb8()),
        }
    }

    // -- Output ---------------------------------------------------------------

    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        encode_to_format(&self.image, ImageFormat::Png)
    }

    /// Encode as JPEG with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(|err| FolioError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| FolioError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_png;

    #[test]
    fn jpeg_output_is_decodable() {
        let surface = RgbaImage::from_pixel(40, 20, Rgba([200, 10, 10, 255]));
        let jpeg = ImageProcessor::from_rgba(surface).to_jpeg_bytes(90).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let decoded = ImageProcessor::from_bytes(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 20));
    }

    #[test]
    fn flatten_fills_transparent_pixels() {
        let clear = ImageProcessor::from_bytes(&sample_png(2, 2, [0, 0, 0, 0])).unwrap();
        let flat = clear.flatten(Rgba([255, 255, 255, 255])).into_dynamic().to_rgb8();
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn fit_within_keeps_aspect_ratio() {
        let wide = ImageProcessor::from_rgba(RgbaImage::new(400, 200)).fit_within(100, 100);
        assert_eq!((wide.width(), wide.height()), (100, 50));
        let small = ImageProcessor::from_rgba(RgbaImage::new(10, 10)).fit_within(100, 100);
        assert_eq!(small.width(), 10);
    }

    #[test]
    fn garbage_is_an_image_error() {
        assert!(matches!(
            ImageProcessor::from_bytes(b"not an image"),
            Err(FolioError::ImageError(_))
        ));
    }
}
