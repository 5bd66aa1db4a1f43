// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page layout engine — fit a raster onto a page, preserving aspect ratio.
//
// All physical units are millimetres. Pixels convert at 96 DPI. The vertical
// offset is measured from the top edge of the page; the PDF assembler turns
// it into a bottom-left coordinate with `PageGeometry::bottom_offset_mm`.

use bildwerk_core::AppConfig;
use bildwerk_core::error::RecordError;
use bildwerk_core::types::{PageOrientation, PaperSize};

/// Millimetres per pixel at 96 DPI.
pub const MM_PER_PX: f32 = 0.264583;

/// Resolution pixels are assumed to have when converted to physical units.
pub const PIXELS_PER_INCH: f32 = 96.0;

/// Default margin between image and page edge.
pub const DEFAULT_MARGIN_MM: f32 = 1.0;

/// Physical page the images are fitted onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSpec {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
    /// Additional shrink applied after fitting, in (0, 1].
    pub shrink_factor: f32,
}

impl PageSpec {
    pub fn new(paper: PaperSize, orientation: PageOrientation) -> Self {
        let (width_mm, height_mm) = paper.oriented_mm(orientation);
        Self {
            width_mm,
            height_mm,
            margin_mm: DEFAULT_MARGIN_MM,
            shrink_factor: 1.0,
        }
    }

    /// A4 with the default margin.
    pub fn a4(orientation: PageOrientation) -> Self {
        Self::new(PaperSize::A4, orientation)
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            margin_mm: config.margin_mm,
            shrink_factor: config.shrink_factor,
            ..Self::new(config.paper_size, config.page_orientation)
        }
    }

    /// Printable area `(width, height)` inside the margins.
    pub fn printable_mm(&self) -> (f32, f32) {
        (
            self.width_mm - 2.0 * self.margin_mm,
            self.height_mm - 2.0 * self.margin_mm,
        )
    }
}

/// Placement of one image on one page, recomputed for every image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    /// Rendered image size.
    pub image_width_mm: f32,
    pub image_height_mm: f32,
    /// Factor applied to the natural (96 DPI) size.
    pub scale: f32,
    /// Offset of the image's left edge from the page's left edge.
    pub x_mm: f32,
    /// Offset of the image's top edge from the page's top edge.
    pub y_mm: f32,
}

impl PageGeometry {
    /// Distance of the image's bottom edge from the page's bottom edge.
    pub fn bottom_offset_mm(&self) -> f32 {
        self.page_height_mm - self.y_mm - self.image_height_mm
    }
}

/// Compute where a `width_px` x `height_px` raster goes on `page`.
pub fn fit(page: &PageSpec, width_px: u32, height_px: u32) -> Result<PageGeometry, RecordError> {
    if width_px == 0 || height_px == 0 {
        return Err(RecordError::Layout(format!(
            "raster has no area ({width_px}x{height_px} px)"
        )));
    }

    let (avail_w, avail_h) = page.printable_mm();
    if avail_w <= 0.0 || avail_h <= 0.0 {
        return Err(RecordError::Layout(format!(
            "margin of {} mm leaves no printable area",
            page.margin_mm
        )));
    }

    let natural_w = width_px as f32 * MM_PER_PX;
    let natural_h = height_px as f32 * MM_PER_PX;
    let scale = (avail_w / natural_w).min(avail_h / natural_h) * page.shrink_factor;

    let image_width_mm = natural_w * scale;
    let image_height_mm = natural_h * scale;

    Ok(PageGeometry {
        page_width_mm: page.width_mm,
        page_height_mm: page.height_mm,
        margin_mm: page.margin_mm,
        image_width_mm,
        image_height_mm,
        scale,
        x_mm: (page.width_mm - image_width_mm) / 2.0,
        y_mm: (page.height_mm - image_height_mm) / 2.0,
    })
}
