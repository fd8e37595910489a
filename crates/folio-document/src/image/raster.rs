// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster decoding for image-to-PDF conversion.

use folio_core::error::{FolioError, Result};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;
use tracing::debug;

use crate::traits::RasterDecoder;

/// Decodes JPEG, PNG and TIFF uploads with the `image` crate.
///
/// Multi-page TIFF files yield their first page only.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageRasterDecoder;

impl RasterDecoder for ImageRasterDecoder {
    fn decode_frames(&self, data: &[u8]) -> Result<Vec<DynamicImage>> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|err| FolioError::ImageError(format!("cannot read image header: {}", err)))?;
        let format = reader.format();
        let image = reader
            .decode()
            .map_err(|err| FolioError::ImageError(format!("failed to decode image: {}", err)))?;
        debug!(
            tiff = format == Some(ImageFormat::Tiff),
            width = image.width(),
            height = image.height(),
            "Raster decoded"
        );
        Ok(vec![image])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_png;

    #[test]
    fn decodes_a_single_frame() {
        let frames = ImageRasterDecoder.decode_frames(&sample_png(8, 6, [1, 2, 3, 255])).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!((frames[0].width(), frames[0].height()), (8, 6));
    }

    #[test]
    fn decodes_tiff() {
        let image = DynamicImage::ImageRgb8(image::RgbImage::new(5, 7));
        let mut tiff = Cursor::new(Vec::new());
        image.write_to(&mut tiff, ImageFormat::Tiff).unwrap();
        let frames = ImageRasterDecoder.decode_frames(tiff.get_ref()).unwrap();
        assert_eq!(frames[0].height(), 7);
    }

    #[test]
    fn rejects_unknown_data() {
        assert!(ImageRasterDecoder.decode_frames(b"nope").is_err());
    }
}
