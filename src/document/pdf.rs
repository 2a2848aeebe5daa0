//! PDF document assembly
//!
//! Builds the object tree with lopdf: one image XObject per placed bitmap,
//! one content stream per page drawing its images, and a flat page tree.

use std::path::Path;

use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::{ExportError, Result};

use super::assembler::{DocumentAssembler, DocumentBackend, PageFormat, PageRect, MM_TO_PT};

struct PdfPage {
    format: PageFormat,
    images: Vec<(ObjectId, PageRect)>,
}

/// PDF built page by page in memory
pub struct PdfDocument {
    doc: Document,
    pages: Vec<PdfPage>,
}

impl PdfDocument {
    pub fn new(format: PageFormat) -> Self {
        Self {
            doc: Document::with_version("1.5"),
            pages: vec![PdfPage {
                format,
                images: Vec::new(),
            }],
        }
    }

    fn image_stream(image: &RgbImage) -> Stream {
        let (width, height) = image.dimensions();
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
            },
            image.as_raw().clone(),
        )
    }

    /// Content stream drawing every image of a page. PDF space starts bottom-left.
    fn page_content(page: &PdfPage) -> Result<Vec<u8>> {
        let page_height = page.format.height_pt();
        let mut operations = Vec::with_capacity(page.images.len() * 4);

        for (index, (_, rect)) in page.images.iter().enumerate() {
            let w = rect.width_mm * MM_TO_PT;
            let h = rect.height_mm * MM_TO_PT;
            let x = rect.x_mm * MM_TO_PT;
            let y = page_height - rect.y_mm * MM_TO_PT - h;
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![w.into(), 0_i64.into(), 0_i64.into(), h.into(), x.into(), y.into()],
            ));
            operations.push(Operation::new("Do", vec![Object::Name(image_name(index).into_bytes())]));
            operations.push(Operation::new("Q", vec![]));
        }

        Ok(Content { operations }.encode()?)
    }

    fn finish(&mut self) -> Result<()> {
        let pages_id = self.doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());

        for page in &self.pages {
            let content = Self::page_content(page)?;
            let content_id = self.doc.add_object(Stream::new(dictionary! {}, content));

            let mut xobjects = lopdf::Dictionary::new();
            for (index, (image_id, _)) in page.images.iter().enumerate() {
                xobjects.set(image_name(index), *image_id);
            }

            let media_box: Vec<Object> = vec![
                0_i64.into(),
                0_i64.into(),
                page.format.width_pt().into(),
                page.format.height_pt().into(),
            ];
            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => xobjects,
                },
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        self.doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();
        Ok(())
    }
}

fn image_name(index: usize) -> String {
    format!("Im{}", index)
}

impl DocumentAssembler for PdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn add_page(&mut self, format: PageFormat) {
        self.pages.push(PdfPage {
            format,
            images: Vec::new(),
        });
    }

    fn add_image(&mut self, image: &RgbImage, rect: PageRect) -> Result<()> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ExportError::Raster("empty image".to_string()));
        }
        let image_id = self.doc.add_object(Self::image_stream(image));
        let page = self.pages.last_mut().ok_or(ExportError::NoPage)?;
        page.images.push((image_id, rect));
        Ok(())
    }

    fn save(mut self: Box<Self>, path: &Path) -> Result<()> {
        self.finish()?;
        self.doc.save(path)?;
        debug!("Wrote {} page(s) to {}", self.pages.len(), path.display());
        Ok(())
    }
}

/// Creates [`PdfDocument`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfBackend;

impl DocumentBackend for PdfBackend {
    fn new_document(&self, format: PageFormat) -> Box<dyn DocumentAssembler> {
        Box::new(PdfDocument::new(format))
    }
}
