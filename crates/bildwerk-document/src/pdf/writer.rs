// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF assembler — one placed image per page using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: each page is a `PdfPage` holding a
// `Vec<Op>`, images are registered on the document as XObjects, and the
// whole document is serialised once by `PdfDocument::save()`.

use bildwerk_core::error::{BildwerkError, RecordError};
use chrono::{DateTime, Utc};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

use crate::image::surface::RasterSurface;
use crate::layout::{PIXELS_PER_INCH, PageGeometry};

/// Document title embedded in the PDF /Info dictionary.
const DEFAULT_TITLE: &str = "Bildwerk Images";

/// Name offered to the user for a document assembled at `at`.
pub fn suggested_filename(at: DateTime<Utc>) -> String {
    format!("images_{}.pdf", at.timestamp_millis())
}

/// Flattened pixels and their placement, ready to become a page.
///
/// Building one is the expensive half of adding a page; appending it to the
/// assembler is cheap.
pub struct PreparedPage {
    raw: RawImage,
    geometry: PageGeometry,
}

impl PreparedPage {
    /// Flatten `surface` to RGB (transparency over white) for embedding.
    pub fn new(surface: &RasterSurface, geometry: PageGeometry) -> Result<Self, RecordError> {
        let rgb = surface.to_rgb_on_white();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        if width == 0 || height == 0 {
            return Err(RecordError::Layout("cannot embed an empty raster".into()));
        }

        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width,
            height,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        Ok(Self { raw, geometry })
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }
}

/// Accumulates pages and serialises them into one document.
///
/// Only prepared pages are held until `finish`; the printpdf document is
/// built there, so an assembler can move between threads.
pub struct PdfAssembler {
    title: String,
    pages: Vec<PreparedPage>,
}

impl PdfAssembler {
    pub fn new() -> Self {
        Self::with_title(DEFAULT_TITLE)
    }

    pub fn with_title(title: &str) -> Self {
        Self {
            title: title.to_string(),
            pages: Vec::new(),
        }
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Append a page containing `surface` placed according to `geometry`.
    #[instrument(skip_all, fields(page = self.pages.len() + 1, width = surface.width(), height = surface.height()))]
    pub fn add_page(
        &mut self,
        surface: &RasterSurface,
        geometry: &PageGeometry,
    ) -> Result<(), RecordError> {
        let page = PreparedPage::new(surface, *geometry)?;
        self.append(page);
        Ok(())
    }

    /// Append a page prepared elsewhere (typically on a blocking thread).
    pub fn append(&mut self, page: PreparedPage) {
        let geometry = page.geometry;
        self.pages.push(page);
        debug!(
            page = self.pages.len(),
            x_mm = geometry.x_mm,
            y_mm = geometry.y_mm,
            w_mm = geometry.image_width_mm,
            h_mm = geometry.image_height_mm,
            "image placed on page"
        );
    }

    /// Serialise the document. A document needs at least one page.
    #[instrument(skip(self), fields(pages = self.pages.len()))]
    pub fn finish(self) -> Result<Vec<u8>, BildwerkError> {
        let Self { title, pages } = self;
        if pages.is_empty() {
            return Err(BildwerkError::PdfError("document has no pages".into()));
        }

        let page_count = pages.len();
        let mut document = PdfDocument::new(&title);
        let pdf_pages: Vec<PdfPage> = pages
            .into_iter()
            .map(|PreparedPage { raw, geometry }| {
                let xobject_id = document.add_image(&raw);

                // printpdf places the image's bottom-left corner; the layout
                // measures from the top.
                let ops = vec![Op::UseXobject {
                    id: xobject_id,
                    transform: XObjectTransform {
                        translate_x: Some(Mm(geometry.x_mm).into_pt()),
                        translate_y: Some(Mm(geometry.bottom_offset_mm()).into_pt()),
                        scale_x: Some(geometry.scale),
                        scale_y: Some(geometry.scale),
                        dpi: Some(PIXELS_PER_INCH),
                        rotate: None,
                    },
                }];
                PdfPage::new(Mm(geometry.page_width_mm), Mm(geometry.page_height_mm), ops)
            })
            .collect();
        document.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = document.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "printpdf reported warnings");
        }

        info!(pages = page_count, bytes = bytes.len(), "PDF assembled");
        Ok(bytes)
    }
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self::new()
    }
}
