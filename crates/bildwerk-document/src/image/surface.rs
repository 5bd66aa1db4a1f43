// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster surface — a decoded pixel grid that lives for one record.

use image::{ColorType, DynamicImage, Rgb, RgbImage};

/// A decoded image, already clamped to the decoder's maximum dimension.
///
/// Produced by the `SafeDecoder`, possibly replaced by the rotation engine
/// and consumed by the PDF assembler.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: DynamicImage,
}

impl RasterSurface {
    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Pixel format of the underlying buffer.
    pub fn pixel_format(&self) -> ColorType {
        self.image.color()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the surface and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Flatten to 8-bit RGB, compositing any transparency over white paper.
    pub fn to_rgb_on_white(&self) -> RgbImage {
        if !self.image.color().has_alpha() {
            return self.image.to_rgb8();
        }

        let rgba = self.image.to_rgba8();
        RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let [r, g, b, a] = rgba.get_pixel(x, y).0;
            let alpha = u32::from(a);
            let blend = |channel: u8| -> u8 {
                ((u32::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255) as u8
            };
            Rgb([blend(r), blend(g), blend(b)])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn transparent_pixels_become_white() {
        let mut rgba = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        let surface = RasterSurface::from_dynamic(DynamicImage::ImageRgba8(rgba));

        let rgb = surface.to_rgb_on_white();
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [10, 20, 30]);
    }

    #[test]
    fn opaque_surface_keeps_its_pixels() {
        let rgb = RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]));
        let surface = RasterSurface::from_dynamic(DynamicImage::ImageRgb8(rgb));
        assert_eq!(surface.dimensions(), (3, 2));
        assert_eq!(surface.pixel_format(), ColorType::Rgb8);
        assert_eq!(surface.to_rgb_on_white().get_pixel(2, 1).0, [1, 2, 3]);
    }
}
