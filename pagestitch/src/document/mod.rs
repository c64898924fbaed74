//! Output documents.
//!
//! The pipeline writes composited pages through a [`DocumentSink`] obtained
//! from a [`DocumentFactory`]. The sink owns the page format; the pipeline
//! only adds pages, places one image per page and saves.

mod pdf;

pub use pdf::{PdfDocument, PdfDocumentFactory};

use image::RgbImage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Output sink failures.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The sink could not be created
    #[error("document encoder unavailable: {0}")]
    Unavailable(String),

    /// An image or page could not be encoded
    #[error("failed to encode document content: {0}")]
    Encode(String),

    /// The finished document could not be written
    #[error("failed to save {path}: {reason}")]
    Save { path: PathBuf, reason: String },
}

/// Unit of page dimensions and placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    #[default]
    Pt,
    Mm,
    In,
}

impl Unit {
    /// Converts a length in this unit to PDF points.
    pub fn to_points(self, value: f32) -> f32 {
        match self {
            Unit::Pt => value,
            Unit::Mm => value * 72.0 / 25.4,
            Unit::In => value * 72.0,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Unit::Pt => "pt",
            Unit::Mm => "mm",
            Unit::In => "in",
        };
        f.write_str(s)
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pt" => Ok(Unit::Pt),
            "mm" => Ok(Unit::Mm),
            "in" => Ok(Unit::In),
            other => Err(format!("unknown unit '{}' (expected pt, mm or in)", other)),
        }
    }
}

/// Page size handed to the sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFormat {
    pub width: f32,
    pub height: f32,
    pub unit: Unit,
}

/// A4 in points.
pub const A4: PageFormat = PageFormat {
    width: 595.28,
    height: 841.89,
    unit: Unit::Pt,
};

impl Default for PageFormat {
    fn default() -> Self {
        A4
    }
}

impl PageFormat {
    pub fn width_pt(&self) -> f32 {
        self.unit.to_points(self.width)
    }

    pub fn height_pt(&self) -> f32 {
        self.unit.to_points(self.height)
    }

    /// A placement covering the whole page.
    pub fn full_page(&self) -> Placement {
        Placement {
            x: 0.0,
            y: 0.0,
            width: self.width,
            height: self.height,
        }
    }
}

/// How page images are embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// JPEG at the requested quality
    #[default]
    Jpeg,
    /// Uncompressed 8-bit RGB
    Raw,
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Jpeg => f.write_str("jpeg"),
            ImageFormat::Raw => f.write_str("raw"),
        }
    }
}

impl FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "raw" => Ok(ImageFormat::Raw),
            other => Err(format!("unknown image format '{}' (expected jpeg or raw)", other)),
        }
    }
}

/// Image rectangle in page units, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A document being written.
pub trait DocumentSink: Send + 'static {
    /// Starts a new, empty page.
    fn add_page(&mut self) -> Result<(), DocumentError>;

    /// Draws `raster` onto the current page.
    fn add_image(
        &mut self,
        raster: &RgbImage,
        format: ImageFormat,
        placement: Placement,
        quality: u8,
    ) -> Result<(), DocumentError>;

    /// Pages added so far.
    fn page_count(&self) -> usize;

    /// Writes the document to `path`.
    fn save(self, path: &Path) -> Result<(), DocumentError>
    where
        Self: Sized;
}

/// Creates sinks for a page format.
pub trait DocumentFactory: Send + Sync + 'static {
    type Sink: DocumentSink;

    fn create(&self, format: PageFormat) -> Result<Self::Sink, DocumentError>;
}
