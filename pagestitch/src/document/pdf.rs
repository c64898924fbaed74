//! PDF output built with `lopdf`.
//!
//! Pages are buffered as (content operations, image resources) and the page
//! tree is materialized when the document is saved. Images are embedded as
//! XObjects: JPEG rasters with `DCTDecode`, raw rasters as plain RGB.

use super::{DocumentError, DocumentFactory, DocumentSink, ImageFormat, PageFormat, Placement};
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

struct PendingPage {
    operations: Vec<Operation>,
    images: Vec<(String, ObjectId)>,
}

/// A PDF under construction.
pub struct PdfDocument {
    doc: Document,
    format: PageFormat,
    pages: Vec<PendingPage>,
    image_count: usize,
}

impl PdfDocument {
    pub fn new(format: PageFormat) -> Self {
        Self {
            doc: Document::with_version("1.5"),
            format,
            pages: Vec::new(),
            image_count: 0,
        }
    }

    fn image_object(
        raster: &RgbImage,
        format: ImageFormat,
        quality: u8,
    ) -> Result<Stream, DocumentError> {
        let (width, height) = raster.dimensions();
        let mut dict = Dictionary::from_iter([
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(width as i64)),
            ("Height", Object::Integer(height as i64)),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
        ]);

        let data = match format {
            ImageFormat::Jpeg => {
                let mut jpeg = Vec::new();
                JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100))
                    .encode_image(raster)
                    .map_err(|e| DocumentError::Encode(format!("JPEG encoding failed: {}", e)))?;
                dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
                jpeg
            }
            ImageFormat::Raw => raster.as_raw().clone(),
        };

        let mut stream = Stream::new(dict, data);
        stream.allows_compression = false;
        Ok(stream)
    }

    fn finish(mut self) -> Result<Document, DocumentError> {
        let pages_id = self.doc.new_object_id();
        let media_box = Object::Array(vec![
            Object::Real(0.0),
            Object::Real(0.0),
            Object::Real(self.format.width_pt()),
            Object::Real(self.format.height_pt()),
        ]);

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in std::mem::take(&mut self.pages) {
            let content = Content {
                operations: page.operations,
            };
            let bytes = content
                .encode()
                .map_err(|e| DocumentError::Encode(format!("page content: {}", e)))?;
            let content_id = self.doc.add_object(Stream::new(Dictionary::new(), bytes));

            let xobjects = Dictionary::from_iter(
                page.images
                    .into_iter()
                    .map(|(name, id)| (name, Object::Reference(id))),
            );
            let resources = Dictionary::from_iter([("XObject", Object::Dictionary(xobjects))]);

            let page_id = self.doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
                ("Resources", Object::Dictionary(resources)),
                ("MediaBox", media_box.clone()),
            ]));
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        let pages = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ]);
        self.doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));
        Ok(self.doc)
    }
}

impl DocumentSink for PdfDocument {
    fn add_page(&mut self) -> Result<(), DocumentError> {
        self.pages.push(PendingPage {
            operations: Vec::new(),
            images: Vec::new(),
        });
        Ok(())
    }

    fn add_image(
        &mut self,
        raster: &RgbImage,
        format: ImageFormat,
        placement: Placement,
        quality: u8,
    ) -> Result<(), DocumentError> {
        if self.pages.is_empty() {
            return Err(DocumentError::Encode("image added before any page".to_string()));
        }

        let stream = Self::image_object(raster, format, quality)?;
        let image_id = self.doc.add_object(stream);
        self.image_count += 1;
        let name = format!("Im{}", self.image_count);

        // Placements are top-left based; PDF user space starts bottom-left.
        let unit = self.format.unit;
        let width = unit.to_points(placement.width);
        let height = unit.to_points(placement.height);
        let x = unit.to_points(placement.x);
        let y = self.format.height_pt() - unit.to_points(placement.y) - height;

        let Some(page) = self.pages.last_mut() else {
            return Err(DocumentError::Encode("no current page".to_string()));
        };
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0.0f32.into(),
                    0.0f32.into(),
                    height.into(),
                    x.into(),
                    y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ]);
        page.images.push((name, image_id));
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn save(self, path: &Path) -> Result<(), DocumentError> {
        let save_error = |reason: String| DocumentError::Save {
            path: path.to_path_buf(),
            reason,
        };

        let page_count = self.pages.len();
        let mut doc = self.finish()?;
        let file = File::create(path).map_err(|e| save_error(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        doc.save_to(&mut writer)
            .map_err(|e| save_error(e.to_string()))?;
        writer.flush().map_err(|e| save_error(e.to_string()))?;

        debug!(path = %path.display(), pages = page_count, "PDF saved");
        Ok(())
    }
}

/// Creates [`PdfDocument`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfDocumentFactory;

impl DocumentFactory for PdfDocumentFactory {
    type Sink = PdfDocument;

    fn create(&self, format: PageFormat) -> Result<PdfDocument, DocumentError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(format.width) || !valid(format.height) {
            return Err(DocumentError::Unavailable(format!(
                "invalid page format {}x{} {}",
                format.width, format.height, format.unit
            )));
        }
        Ok(PdfDocument::new(format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Unit, A4};
    use image::Rgb;
    use tempfile::TempDir;

    fn raster(color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(31, 44, Rgb(color))
    }

    fn write_pdf(format: ImageFormat, pages: usize) -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.pdf");
        let mut pdf = PdfDocumentFactory.create(A4).unwrap();
        for i in 0..pages {
            pdf.add_page().unwrap();
            pdf.add_image(&raster([i as u8 * 40, 0, 0]), format, A4.full_page(), 75)
                .unwrap();
        }
        assert_eq!(pdf.page_count(), pages);
        pdf.save(&path).unwrap();
        (dir, path)
    }

    #[test]
    fn test_saved_pdf_has_pages() {
        let (_dir, path) = write_pdf(ImageFormat::Jpeg, 3);

        let doc = lopdf::Document::load(&path).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_jpeg_images_use_dct() {
        let (_dir, path) = write_pdf(ImageFormat::Jpeg, 1);

        let doc = lopdf::Document::load(&path).unwrap();
        let dct = doc.objects.values().any(|obj| match obj {
            Object::Stream(s) => matches!(
                s.dict.get(b"Filter"),
                Ok(Object::Name(name)) if name == b"DCTDecode"
            ),
            _ => false,
        });
        assert!(dct);
    }

    #[test]
    fn test_raw_images_are_uncompressed_rgb() {
        let (_dir, path) = write_pdf(ImageFormat::Raw, 1);

        let doc = lopdf::Document::load(&path).unwrap();
        let raw_len = doc.objects.values().find_map(|obj| match obj {
            Object::Stream(s)
                if matches!(s.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Image") =>
            {
                Some(s.content.len())
            }
            _ => None,
        });
        assert_eq!(raw_len, Some(31 * 44 * 3));
    }

    #[test]
    fn test_image_before_page_rejected() {
        let mut pdf = PdfDocument::new(A4);
        let result = pdf.add_image(&raster([0, 0, 0]), ImageFormat::Jpeg, A4.full_page(), 75);
        assert!(matches!(result, Err(DocumentError::Encode(_))));
    }

    #[test]
    fn test_invalid_format_unavailable() {
        let format = PageFormat {
            width: 0.0,
            height: 10.0,
            unit: Unit::Mm,
        };
        assert!(matches!(
            PdfDocumentFactory.create(format),
            Err(DocumentError::Unavailable(_))
        ));
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let mut pdf = PdfDocument::new(A4);
        pdf.add_page().unwrap();
        let result = pdf.save(&dir.path().join("missing").join("out.pdf"));
        assert!(matches!(result, Err(DocumentError::Save { .. })));
    }
}
