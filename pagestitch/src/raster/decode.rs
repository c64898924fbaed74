//! Tile decoding.
//!
//! A loaded tile is decoded under size limits, flattened to RGB and re-encoded
//! as JPEG at a fixed quality. The re-encoded form is what the compositor
//! keeps in memory until the page is drawn.

use super::CompositeError;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageReader, Limits, RgbImage};
use std::io::Cursor;

/// Default lossy re-encode quality (0.75).
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Default maximum accepted tile width or height.
pub const DEFAULT_MAX_TILE_DIMENSION: u32 = 16384;

/// A tile after decoding and re-encoding.
#[derive(Debug, Clone)]
pub struct DecodedTile {
    pub source_key: String,
    pub width: u32,
    pub height: u32,
    /// JPEG bytes at the decoder's quality
    pub jpeg: Vec<u8>,
}

impl DecodedTile {
    /// Expands the stored JPEG back into pixels.
    pub fn to_rgb(&self) -> Result<RgbImage, CompositeError> {
        let image = image::load_from_memory_with_format(&self.jpeg, image::ImageFormat::Jpeg)
            .map_err(|e| CompositeError::TileDecode {
                source_key: self.source_key.clone(),
                reason: format!("re-encoded tile unreadable: {}", e),
            })?;
        Ok(image.to_rgb8())
    }
}

/// Decodes raw tile bytes with bounded dimensions.
#[derive(Debug, Clone, Copy)]
pub struct TileDecoder {
    quality: u8,
    max_dimension: u32,
}

impl Default for TileDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY, DEFAULT_MAX_TILE_DIMENSION)
    }
}

impl TileDecoder {
    /// Quality is clamped to 1..=100.
    pub fn new(quality: u8, max_dimension: u32) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            max_dimension: max_dimension.max(1),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Decodes `bytes` and re-encodes them as JPEG.
    pub fn decode(&self, source_key: &str, bytes: &[u8]) -> Result<DecodedTile, CompositeError> {
        let fail = |reason: String| CompositeError::TileDecode {
            source_key: source_key.to_string(),
            reason,
        };

        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_dimension);
        limits.max_image_height = Some(self.max_dimension);

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| fail(format!("unreadable image data: {}", e)))?;
        reader.limits(limits);
        let image = reader
            .decode()
            .map_err(|e| fail(format!("decode failed: {}", e)))?;

        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(fail("image has no pixels".to_string()));
        }

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.quality)
            .encode_image(&rgb)
            .map_err(|e| fail(format!("re-encode failed: {}", e)))?;

        Ok(DecodedTile {
            source_key: source_key.to_string(),
            width,
            height,
            jpeg,
        })
    }
}
