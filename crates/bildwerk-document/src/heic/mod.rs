// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HEIC transcoder adapter.
//
// HEIC/HEIF input cannot be decoded directly; it is handed to an external
// capability that produces JPEG bytes. The capability is optional: without
// one every HEIC record fails with `TranscoderUnavailable`, while JPEG and
// PNG records are unaffected.

#[cfg(feature = "libheif")]
pub mod libheif;

use std::sync::Arc;

use bildwerk_core::error::CapabilityError;
use tracing::{debug, instrument, warn};

/// Default JPEG quality for transcoded output.
pub const DEFAULT_QUALITY: f32 = 0.85;

/// Output format requested from a transcoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Jpeg,
}

/// What a transcoder hands back. Multi-image containers may yield a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeOutput {
    Single(Vec<u8>),
    Many(Vec<Vec<u8>>),
}

/// External capability converting HEIC/HEIF bytes into another format.
pub trait HeicTranscoder: Send + Sync {
    fn transcode(
        &self,
        bytes: &[u8],
        target: TargetFormat,
        quality: f32,
    ) -> Result<TranscodeOutput, CapabilityError>;
}

/// Wraps an optional transcoder and normalises its output to one JPEG.
#[derive(Clone)]
pub struct TranscoderAdapter {
    capability: Option<Arc<dyn HeicTranscoder>>,
    quality: f32,
}

impl TranscoderAdapter {
    pub fn new(capability: Option<Arc<dyn HeicTranscoder>>, quality: f32) -> Self {
        Self {
            capability,
            quality,
        }
    }

    /// Adapter with no capability wired in.
    pub fn unavailable() -> Self {
        Self::new(None, DEFAULT_QUALITY)
    }

    /// The adapter the build provides: libheif when the feature is enabled,
    /// nothing otherwise.
    pub fn platform_default(quality: f32) -> Self {
        #[cfg(feature = "libheif")]
        {
            Self::new(Some(Arc::new(libheif::LibheifTranscoder::new())), quality)
        }
        #[cfg(not(feature = "libheif"))]
        {
            Self::new(None, quality)
        }
    }

    pub fn is_available(&self) -> bool {
        self.capability.is_some()
    }

    pub fn quality(&self) -> f32 {
        self.quality
    }

    /// Transcode HEIC bytes to JPEG. When the capability yields several
    /// images the first one is used.
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len(), quality = self.quality))]
    pub fn transcode(&self, bytes: &[u8]) -> Result<Vec<u8>, CapabilityError> {
        let Some(capability) = &self.capability else {
            warn!("HEIC input but no transcoder is available");
            return Err(CapabilityError::TranscoderUnavailable);
        };

        match capability.transcode(bytes, TargetFormat::Jpeg, self.quality)? {
            TranscodeOutput::Single(jpeg) => Ok(jpeg),
            TranscodeOutput::Many(images) => {
                let count = images.len();
                let first = images.into_iter().next().ok_or_else(|| {
                    CapabilityError::TranscodeFailed("transcoder returned no images".into())
                })?;
                if count > 1 {
                    debug!(count, "transcoder returned several images, using the first");
                }
                Ok(first)
            }
        }
    }
}

impl std::fmt::Debug for TranscoderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscoderAdapter")
            .field("available", &self.is_available())
            .field("quality", &self.quality)
            .finish()
    }
}
