//! Band compositing.
//!
//! A page is a fixed-size canvas split into `slots` horizontal bands. Band `i`
//! spans rows `[i * H / S, (i + 1) * H / S)`, so integer division never leaves
//! a gap. Each tile is stretched to the full page width and its band height;
//! aspect ratio is not preserved.

use super::{CompositeError, DecodedTile};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// Default composited page width in pixels.
pub const DEFAULT_PAGE_WIDTH_PX: u32 = 1240;

/// Default composited page height in pixels.
pub const DEFAULT_PAGE_HEIGHT_PX: u32 = 1752;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Canvas geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub width_px: u32,
    pub height_px: u32,
    pub slots: usize,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            width_px: DEFAULT_PAGE_WIDTH_PX,
            height_px: DEFAULT_PAGE_HEIGHT_PX,
            slots: crate::observer::DEFAULT_SLOTS_PER_PAGE,
        }
    }
}

impl PageLayout {
    /// Top row and height of band `slot`.
    pub fn band(&self, slot: usize) -> (u32, u32) {
        let slots = self.slots.max(1) as u64;
        let height = self.height_px as u64;
        let top = slot as u64 * height / slots;
        let bottom = (slot as u64 + 1) * height / slots;
        (top as u32, (bottom - top) as u32)
    }
}

/// A composited page raster.
#[derive(Debug, Clone)]
pub struct OutputPage {
    pub page_index: u32,
    pub raster: RgbImage,
}

/// Draws decoded tiles (in slot order) into one page canvas.
pub fn composite_page(
    page_index: u32,
    tiles: &[DecodedTile],
    layout: PageLayout,
) -> Result<OutputPage, CompositeError> {
    if tiles.len() != layout.slots {
        return Err(CompositeError::Internal(format!(
            "page {} has {} decoded tiles, expected {}",
            page_index,
            tiles.len(),
            layout.slots
        )));
    }

    let mut canvas = RgbImage::from_pixel(layout.width_px, layout.height_px, BACKGROUND);
    for (slot, tile) in tiles.iter().enumerate() {
        let (top, band_height) = layout.band(slot);
        if band_height == 0 || layout.width_px == 0 {
            continue;
        }
        let pixels = tile.to_rgb()?;
        let scaled = imageops::resize(&pixels, layout.width_px, band_height, FilterType::Triangle);
        imageops::replace(&mut canvas, &scaled, 0, top as i64);
    }

    Ok(OutputPage {
        page_index,
        raster: canvas,
    })
}
