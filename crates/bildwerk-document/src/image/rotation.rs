// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rotation engine — exact quarter turns, clockwise, no resampling.

use bildwerk_core::error::RecordError;
use bildwerk_core::types::Rotation;
use image::{DynamicImage, RgbaImage, imageops};
use tracing::debug;

use super::surface::RasterSurface;

/// Dimensions of `(width, height)` after applying `rotation`.
pub fn rotated_dimensions(width: u32, height: u32, rotation: Rotation) -> (u32, u32) {
    if rotation.swaps_axes() {
        (height, width)
    } else {
        (width, height)
    }
}

/// Rotate a surface clockwise about its centre.
///
/// `Deg0` hands the input back untouched. Otherwise the destination buffer is
/// sized first and the pixels are copied into it.
pub fn rotate(surface: RasterSurface, rotation: Rotation) -> Result<RasterSurface, RecordError> {
    if rotation == Rotation::Deg0 {
        return Ok(surface);
    }

    let (width, height) = rotated_dimensions(surface.width(), surface.height(), rotation);
    let source = surface.into_dynamic().into_rgba8();
    let mut target = RgbaImage::new(width, height);

    let drawn = match rotation {
        Rotation::Deg90 => imageops::rotate90_in(&source, &mut target),
        Rotation::Deg180 => imageops::rotate180_in(&source, &mut target),
        Rotation::Deg270 => imageops::rotate270_in(&source, &mut target),
        Rotation::Deg0 => Ok(()),
    };
    drawn.map_err(|err| RecordError::Internal(format!("rotation failed: {err}")))?;

    debug!(degrees = rotation.degrees(), width, height, "surface rotated");
    Ok(RasterSurface::from_dynamic(DynamicImage::ImageRgba8(target)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 3x2 surface with a red marker in the top-left corner.
    fn marked() -> RasterSurface {
        let mut image = RgbaImage::from_pixel(3, 2, Rgba([0, 0, 0, 255]));
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        RasterSurface::from_dynamic(DynamicImage::ImageRgba8(image))
    }

    fn marker_at(surface: &RasterSurface) -> (u32, u32) {
        let rgba = surface.as_dynamic().to_rgba8();
        rgba.enumerate_pixels()
            .find(|(_, _, p)| p.0 == [255, 0, 0, 255])
            .map(|(x, y, _)| (x, y))
            .expect("marker pixel")
    }

    #[test]
    fn zero_rotation_is_identity() {
        let rotated = rotate(marked(), Rotation::Deg0).expect("rotate");
        assert_eq!(rotated.dimensions(), (3, 2));
        assert_eq!(marker_at(&rotated), (0, 0));
    }

    #[test]
    fn quarter_turns_swap_axes() {
        let quarter = rotate(marked(), Rotation::Deg90).expect("rotate");
        assert_eq!(quarter.dimensions(), (2, 3));
        // Clockwise: the top-left corner moves to the top-right.
        assert_eq!(marker_at(&quarter), (1, 0));

        let three_quarter = rotate(marked(), Rotation::Deg270).expect("rotate");
        assert_eq!(three_quarter.dimensions(), (2, 3));
        assert_eq!(marker_at(&three_quarter), (0, 2));
    }

    #[test]
    fn half_turn_keeps_dimensions() {
        let half = rotate(marked(), Rotation::Deg180).expect("rotate");
        assert_eq!(half.dimensions(), (3, 2));
        assert_eq!(marker_at(&half), (2, 1));
    }

    #[test]
    fn four_quarter_turns_restore_the_original() {
        let mut surface = marked();
        for _ in 0..4 {
            surface = rotate(surface, Rotation::Deg90).expect("rotate");
        }
        assert_eq!(surface.dimensions(), (3, 2));
        assert_eq!(marker_at(&surface), (0, 0));
    }

    #[test]
    fn two_half_turns_are_identity() {
        let once = rotate(marked(), Rotation::Deg180).expect("rotate");
        let twice = rotate(once, Rotation::Deg180).expect("rotate");
        assert_eq!(twice.as_dynamic().to_rgba8(), marked().as_dynamic().to_rgba8());
    }
}
