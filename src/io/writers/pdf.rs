//! Image-only PDF assembly: one full-page grayscale JPEG per page.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, info};

use crate::error::{Error, Result};

const POINTS_PER_INCH: f32 = 72.0;

/// Page edge length in PDF points for `pixels` rendered at `dpi`.
pub fn pixels_to_points(pixels: usize, dpi: u32) -> f32 {
    pixels as f32 / dpi.max(1) as f32 * POINTS_PER_INCH
}

pub struct PdfAssembler {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfAssembler {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append a page showing `jpeg` (DCT-encoded 8-bit gray) edge to edge.
    pub fn add_jpeg_page(&mut self, jpeg: Vec<u8>, cols: usize, rows: usize, dpi: u32) -> Result<()> {
        if cols == 0 || rows == 0 {
            return Err(Error::Processing("cannot place an empty page image".to_string()));
        }
        let (width, height) = (pixels_to_points(cols, dpi), pixels_to_points(rows, dpi));
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => cols as i64,
                "Height" => rows as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false);
        let image_id = self.doc.add_object(image);

        let content = format!("q {:.4} 0 0 {:.4} 0 0 cm /Im0 Do Q", width, height);
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.into_bytes()));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0_i64.into(), 0_i64.into(), Object::Real(width), Object::Real(height)],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        self.kids.push(page_id.into());
        debug!(
            "PDF page {}: {}x{} px -> {:.1}x{:.1} pt",
            self.kids.len(),
            cols,
            rows,
            width,
            height
        );
        Ok(())
    }

    /// Write the document to `writer`, consuming the assembler.
    pub fn write_to<W: Write>(mut self, writer: &mut W) -> Result<()> {
        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids,
            "Count" => count,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.save_to(writer)?;
        Ok(())
    }

    /// Write the document to `path`; returns the file size in bytes.
    pub fn save(self, path: &Path) -> Result<u64> {
        let count = self.page_count();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        let size = std::fs::metadata(path)?.len();
        info!("Wrote {} pages to {} ({} bytes)", count, path.display(), size);
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::writers::jpeg::encode_gray_jpeg;

    #[test]
    fn test_points_from_dpi() {
        assert_eq!(pixels_to_points(300, 300), 72.0);
        assert_eq!(pixels_to_points(150, 300), 36.0);
    }

    #[test]
    fn test_written_pdf_loads_with_all_pages() {
        let mut pdf = PdfAssembler::new();
        for (cols, rows) in [(30, 40), (20, 40)] {
            let jpeg = encode_gray_jpeg(&vec![200u8; cols * rows], cols, rows, 80).unwrap();
            pdf.add_jpeg_page(jpeg, cols, rows, 300).unwrap();
        }
        assert_eq!(pdf.page_count(), 2);

        let mut bytes = Vec::new();
        pdf.write_to(&mut bytes).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let loaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(loaded.get_pages().len(), 2);
    }

    #[test]
    fn test_empty_image_rejected() {
        let mut pdf = PdfAssembler::new();
        assert!(pdf.add_jpeg_page(Vec::new(), 0, 10, 300).is_err());
    }
}
