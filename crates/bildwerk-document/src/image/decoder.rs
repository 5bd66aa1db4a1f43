// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Safe decoder — bytes to a bounded raster surface.
//
// Decoding runs through an explicit, ordered list of strategies; the first
// one to produce a surface wins. Every strategy clamps the result so that
// neither edge exceeds the configured maximum. A platform guard rejects
// oversized inputs before any strategy is attempted.

use std::io::Cursor;

use bildwerk_core::error::DecodeError;
use bildwerk_core::types::PlatformProfile;
use image::codecs::jpeg::JpegDecoder;
use image::codecs::png::PngDecoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Limits};
use tracing::{debug, instrument, warn};

use super::surface::RasterSurface;

/// Longest edge allowed after decoding, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 4096;

/// One way of turning encoded bytes into a surface.
pub trait DecodeStrategy: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Decode `bytes`, returning a surface whose edges are at most
    /// `max_dimension` pixels.
    fn decode(&self, bytes: &[u8], max_dimension: u32) -> Result<RasterSurface, String>;
}

/// Scale `(width, height)` down so neither exceeds `max`, preserving the
/// aspect ratio. Uses `min(max/width, max/height)` and floors to whole
/// pixels (never below one).
pub fn clamp_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let ratio = (f64::from(max) / f64::from(width)).min(f64::from(max) / f64::from(height));
    let w = (f64::from(width) * ratio).floor() as u32;
    let h = (f64::from(height) * ratio).floor() as u32;
    (w.max(1), h.max(1))
}

// -- Fast tier ----------------------------------------------------------------

/// Sniffs the container format and decodes through `ImageReader` with
/// allocation limits, then resamples with a triangle filter if needed.
#[derive(Debug, Default)]
pub struct BitmapDecode;

impl DecodeStrategy for BitmapDecode {
    fn name(&self) -> &'static str {
        "bitmap"
    }

    fn decode(&self, bytes: &[u8], max_dimension: u32) -> Result<RasterSurface, String> {
        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|err| format!("format detection failed: {err}"))?;
        reader.limits(Limits::default());

        let image = reader.decode().map_err(|err| err.to_string())?;
        let (width, height) = clamp_dimensions(image.width(), image.height(), max_dimension);
        if (width, height) == (image.width(), image.height()) {
            return Ok(RasterSurface::from_dynamic(image));
        }

        debug!(
            from_w = image.width(),
            from_h = image.height(),
            to_w = width,
            to_h = height,
            "clamping decoded image"
        );
        Ok(RasterSurface::from_dynamic(
            image.resize_exact(width, height, FilterType::Triangle),
        ))
    }
}

// -- Fallback tier ------------------------------------------------------------

/// Picks the codec from the magic bytes itself and drives the codec decoder
/// directly. Slower to resample, but independent of format guessing.
#[derive(Debug, Default)]
pub struct StagedDecode;

impl StagedDecode {
    fn sniff(bytes: &[u8]) -> Option<ImageFormat> {
        const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageFormat::Jpeg)
        } else if bytes.starts_with(PNG_MAGIC) {
            Some(ImageFormat::Png)
        } else {
            None
        }
    }
}

impl DecodeStrategy for StagedDecode {
    fn name(&self) -> &'static str {
        "staged"
    }

    fn decode(&self, bytes: &[u8], max_dimension: u32) -> Result<RasterSurface, String> {
        let image = match Self::sniff(bytes) {
            Some(ImageFormat::Jpeg) => {
                let decoder = JpegDecoder::new(Cursor::new(bytes)).map_err(|err| err.to_string())?;
                DynamicImage::from_decoder(decoder).map_err(|err| err.to_string())?
            }
            Some(ImageFormat::Png) => {
                let decoder = PngDecoder::new(Cursor::new(bytes)).map_err(|err| err.to_string())?;
                DynamicImage::from_decoder(decoder).map_err(|err| err.to_string())?
            }
            _ => return Err("not a JPEG or PNG stream".into()),
        };

        let (width, height) = (image.width(), image.height());
        if width <= max_dimension && height <= max_dimension {
            return Ok(RasterSurface::from_dynamic(image));
        }

        let ratio = (f64::from(max_dimension) / f64::from(width))
            .min(f64::from(max_dimension) / f64::from(height));
        let target_w = ((f64::from(width) * ratio).floor() as u32).max(1);
        let target_h = ((f64::from(height) * ratio).floor() as u32).max(1);
        Ok(RasterSurface::from_dynamic(image.thumbnail_exact(target_w, target_h)))
    }
}

// -- Decoder ------------------------------------------------------------------

/// Bounded decoder built from an injected platform profile.
pub struct SafeDecoder {
    profile: PlatformProfile,
    max_dimension: u32,
    strategies: Vec<Box<dyn DecodeStrategy>>,
}

impl SafeDecoder {
    /// Strategy list derived from the profile: the fast tier first when the
    /// platform prefers it, the staged tier always last.
    pub fn for_profile(profile: PlatformProfile, max_dimension: u32) -> Self {
        let mut strategies: Vec<Box<dyn DecodeStrategy>> = Vec::with_capacity(2);
        if profile.prefer_fast_decode_tier {
            strategies.push(Box::new(BitmapDecode));
        }
        strategies.push(Box::new(StagedDecode));
        Self::with_strategies(profile, max_dimension, strategies)
    }

    /// Use a caller-supplied strategy list, tried in order.
    pub fn with_strategies(
        profile: PlatformProfile,
        max_dimension: u32,
        strategies: Vec<Box<dyn DecodeStrategy>>,
    ) -> Self {
        Self {
            profile,
            max_dimension,
            strategies,
        }
    }

    pub fn profile(&self) -> PlatformProfile {
        self.profile
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Names of the strategies in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Decode `bytes` into a bounded surface.
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    pub fn decode(&self, bytes: &[u8]) -> Result<RasterSurface, DecodeError> {
        let size = bytes.len() as u64;
        if let Some(limit) = self.profile.max_input_bytes {
            if size > limit {
                warn!(size, limit, "input exceeds platform decode limit");
                return Err(DecodeError::OversizedForPlatform { size, limit });
            }
        }

        let mut failures: Vec<String> = Vec::new();
        for strategy in &self.strategies {
            match strategy.decode(bytes, self.max_dimension) {
                Ok(surface) => {
                    debug!(
                        strategy = strategy.name(),
                        width = surface.width(),
                        height = surface.height(),
                        "image decoded"
                    );
                    return Ok(surface);
                }
                Err(reason) => {
                    warn!(strategy = strategy.name(), %reason, "decode strategy failed");
                    failures.push(format!("{}: {}", strategy.name(), reason));
                }
            }
        }

        if failures.is_empty() {
            failures.push("no decode strategy configured".into());
        }
        Err(DecodeError::DecodeFailed(failures.join("; ")))
    }
}
