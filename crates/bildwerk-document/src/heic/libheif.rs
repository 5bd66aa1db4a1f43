// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// libheif-backed HEIC transcoder.

use std::io::Cursor;

use bildwerk_core::error::CapabilityError;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};
use tracing::{debug, instrument};

use super::{HeicTranscoder, TargetFormat, TranscodeOutput};

/// Decodes the primary image of a HEIF container and re-encodes it as JPEG.
#[derive(Debug, Default)]
pub struct LibheifTranscoder;

impl LibheifTranscoder {
    pub fn new() -> Self {
        Self
    }

    /// Primary image as tightly packed RGB rows.
    fn decode_rgb(bytes: &[u8]) -> Result<(Vec<u8>, u32, u32), CapabilityError> {
        let failed = |err: libheif_rs::HeifError| CapabilityError::TranscodeFailed(err.to_string());

        let lib_heif = LibHeif::new();
        let ctx = HeifContext::read_from_bytes(bytes).map_err(failed)?;
        let handle = ctx.primary_image_handle().map_err(failed)?;
        let (width, height) = (handle.width(), handle.height());

        let image = lib_heif
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(failed)?;
        let interleaved = image.planes().interleaved.ok_or_else(|| {
            CapabilityError::TranscodeFailed("decoder produced no interleaved RGB plane".into())
        })?;

        let row_len = width as usize * 3;
        let mut rgb = Vec::with_capacity(row_len * height as usize);
        for row in interleaved.data.chunks(interleaved.stride).take(height as usize) {
            rgb.extend_from_slice(&row[..row_len]);
        }
        Ok((rgb, width, height))
    }
}

impl HeicTranscoder for LibheifTranscoder {
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    fn transcode(
        &self,
        bytes: &[u8],
        target: TargetFormat,
        quality: f32,
    ) -> Result<TranscodeOutput, CapabilityError> {
        match target {
            TargetFormat::Jpeg => {}
        }

        let (rgb, width, height) = Self::decode_rgb(bytes)?;
        let quality = (quality.clamp(0.0, 1.0) * 100.0).round() as u8;

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), quality.max(1))
            .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
            .map_err(|err| CapabilityError::TranscodeFailed(err.to_string()))?;

        debug!(width, height, quality, jpeg_len = jpeg.len(), "HEIC transcoded");
        Ok(TranscodeOutput::Single(jpeg))
    }
}
