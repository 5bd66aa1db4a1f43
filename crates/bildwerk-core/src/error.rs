// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Bildwerk.
//
// Intake rejections, per-record failures and batch failures are separate
// enums so that the pipeline can only ever turn a record-level error into a
// `Failed` status, and only batch-level errors reach the caller.

use thiserror::Error;

use crate::types::Stage;

/// Rejections raised while screening candidates. A rejected candidate never
/// enters the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{name}: unsupported file type (expected jpg, jpeg, png, heic or heif)")]
    UnsupportedType { name: String },

    #[error("{name}: file is empty")]
    EmptyFile { name: String },
}

impl ValidationError {
    /// Display name of the rejected candidate.
    pub fn name(&self) -> &str {
        match self {
            Self::UnsupportedType { name } | Self::EmptyFile { name } => name,
        }
    }
}

/// Failures of an external capability (HEIC transcoding).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("HEIC transcoder is not available")]
    TranscoderUnavailable,

    #[error("HEIC transcoding failed: {0}")]
    TranscodeFailed(String),
}

/// Failures while turning bytes into a raster surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("could not read image bytes: {0}")]
    ReadFailed(String),

    #[error("could not decode image: {0}")]
    DecodeFailed(String),

    #[error("image input of {size} bytes exceeds the platform limit of {limit} bytes")]
    OversizedForPlatform { size: u64, limit: u64 },
}

/// Everything that can fail for one record. Caught at the record boundary
/// and converted into a `Failed` status; never aborts sibling records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("invalid rotation: {0} degrees")]
    InvalidRotation(u16),

    #[error("page layout failed: {0}")]
    Layout(String),

    #[error("{stage} step timed out after {secs}s")]
    TimedOut { stage: Stage, secs: u64 },

    #[error("internal error: {0}")]
    Internal(String),
}

/// Failures fatal to a whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("there are no images to convert")]
    EmptyBatch,

    #[error("none of the images could be processed")]
    NoImagesProcessed,
}

/// Top-level error type for all Bildwerk operations.
#[derive(Debug, Error)]
pub enum BildwerkError {
    // -- Intake / pipeline --
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    // -- Store --
    #[error("the image list is locked while a conversion is running")]
    StoreLocked,

    #[error("no queued image with id {0}")]
    UnknownRecord(String),

    // -- Document --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Settings / persistence --
    #[error("invalid setting: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

impl From<CapabilityError> for BildwerkError {
    fn from(err: CapabilityError) -> Self {
        Self::Record(err.into())
    }
}

impl From<DecodeError> for BildwerkError {
    fn from(err: DecodeError) -> Self {
        Self::Record(err.into())
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BildwerkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_error_wraps_decode_transparently() {
        let err: RecordError = DecodeError::DecodeFailed("bad header".into()).into();
        assert_eq!(err.to_string(), "could not decode image: bad header");
    }

    #[test]
    fn capability_error_lifts_into_top_level() {
        let err: BildwerkError = CapabilityError::TranscoderUnavailable.into();
        assert!(matches!(
            err,
            BildwerkError::Record(RecordError::Capability(CapabilityError::TranscoderUnavailable))
        ));
    }

    #[test]
    fn validation_error_exposes_name() {
        let err = ValidationError::EmptyFile { name: "blank.png".into() };
        assert_eq!(err.name(), "blank.png");
    }
}
