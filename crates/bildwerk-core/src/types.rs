// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Bildwerk image-to-PDF pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::RecordError;

/// Input size above which mobile-class decoders are known to crash or hang.
pub const MOBILE_MAX_INPUT_BYTES: u64 = 25 * 1024 * 1024;

/// Identity of a queued image, derived from its display name and byte size.
///
/// Two candidates with the same name and size always map to the same id,
/// which is what makes intake deduplication idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Derive the identity for a `(name, size)` pair.
    pub fn derive(name: &str, size: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(size.to_string().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for one conversion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepted input image kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    Jpeg,
    Png,
    /// HEIC/HEIF — must be transcoded to JPEG before decoding.
    Heic,
}

impl ImageKind {
    /// Infer the kind from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "heic" | "heif" => Some(Self::Heic),
            _ => None,
        }
    }

    /// Infer the kind from the extension of a display name. Names without a
    /// dot have no extension and are rejected.
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn needs_transcode(&self) -> bool {
        matches!(self, Self::Heic)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Heic => "image/heic",
        }
    }
}

/// Clockwise quarter-turn rotation applied to an image before placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Convert raw degrees. Only exact quarter turns are valid.
    pub fn from_degrees(degrees: u16) -> Result<Self, RecordError> {
        match degrees {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            other => Err(RecordError::InvalidRotation(other)),
        }
    }

    pub fn degrees(&self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// The next value of the 90-degree increment control.
    pub fn clockwise(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }

    /// Whether width and height trade places.
    pub fn swaps_axes(&self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// Comparator used when no explicit order is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Insertion order.
    #[default]
    Natural,
    /// Case-insensitive display name.
    Name,
    /// Last-modified timestamp, oldest first.
    Date,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "natural" => Ok(Self::Natural),
            "name" => Ok(Self::Name),
            "date" => Ok(Self::Date),
            other => Err(format!("unknown sort key '{other}' (expected natural, name or date)")),
        }
    }
}

/// Page orientation of the generated document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    #[default]
    Portrait,
    Landscape,
}

impl std::str::FromStr for PageOrientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "portrait" | "p" => Ok(Self::Portrait),
            "landscape" | "l" => Ok(Self::Landscape),
            other => Err(format!("unknown orientation '{other}' (expected portrait or landscape)")),
        }
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Portrait dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::A3 => (297.0, 420.0),
            Self::A5 => (148.0, 210.0),
            Self::Letter => (215.9, 279.4),
            Self::Legal => (215.9, 355.6),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Dimensions for the given orientation; landscape swaps the axes.
    pub fn oriented_mm(&self, orientation: PageOrientation) -> (f32, f32) {
        let (w, h) = self.dimensions_mm();
        match orientation {
            PageOrientation::Portrait => (w, h),
            PageOrientation::Landscape => (h, w),
        }
    }
}

/// Where a record's raw bytes come from.
#[derive(Debug, Clone)]
pub enum ByteSource {
    /// Bytes already held in memory (shared, cheap to clone).
    Memory(Arc<[u8]>),
    /// A file read lazily when the record is processed.
    File(PathBuf),
}

impl ByteSource {
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self::Memory(bytes.into())
    }
}

/// A raw file handed over by the file chooser or drag-and-drop collaborator.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub source: ByteSource,
}

impl Candidate {
    /// In-memory candidate; the size is the buffer length.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            last_modified: None,
            source: ByteSource::from_vec(bytes),
        }
    }

    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }
}

/// A queued image. Owned exclusively by the store.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub id: RecordId,
    pub name: String,
    pub size: u64,
    pub kind: ImageKind,
    pub last_modified: Option<DateTime<Utc>>,
    pub rotation: Rotation,
    /// Insertion sequence number; defines natural order.
    pub sequence: u64,
    pub source: ByteSource,
}

/// Sub-steps a record passes through during conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Reading,
    Transcoding,
    Decoding,
    Rotating,
    Placing,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::Transcoding => "converting HEIC",
            Self::Decoding => "loading image",
            Self::Rotating => "rotating",
            Self::Placing => "adding to PDF",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-record status, for observability only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingStatus {
    Pending,
    InProgress(Stage),
    Success,
    Failed(String),
}

impl ProcessingStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Lifecycle of one conversion run. Transitions are one-directional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchPhase {
    Idle,
    Preparing,
    Processing { index: usize, total: usize },
    Finalizing,
    Done,
    Aborted,
}

/// Decoder limits of the runtime platform, injected instead of sniffed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformProfile {
    /// Inputs larger than this are rejected before decoding.
    pub max_input_bytes: Option<u64>,
    /// Whether the fast decode tier is tried before the staged fallback.
    pub prefer_fast_decode_tier: bool,
}

impl PlatformProfile {
    pub const fn desktop() -> Self {
        Self {
            max_input_bytes: None,
            prefer_fast_decode_tier: true,
        }
    }

    pub const fn mobile() -> Self {
        Self {
            max_input_bytes: Some(MOBILE_MAX_INPUT_BYTES),
            prefer_fast_decode_tier: true,
        }
    }
}

impl Default for PlatformProfile {
    fn default() -> Self {
        Self::desktop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_is_stable_for_name_and_size() {
        assert_eq!(RecordId::derive("a.jpg", 10), RecordId::derive("a.jpg", 10));
        assert_ne!(RecordId::derive("a.jpg", 10), RecordId::derive("a.jpg", 11));
        assert_ne!(RecordId::derive("a.jpg", 10), RecordId::derive("b.jpg", 10));
        assert_eq!(RecordId::derive("a.jpg", 10).as_str().len(), 64);
    }

    #[test]
    fn record_id_separates_name_from_size() {
        // "a1" + 23 must not collide with "a" + 123.
        assert_ne!(RecordId::derive("a1", 23), RecordId::derive("a", 123));
    }

    #[test]
    fn kind_from_name_is_case_insensitive() {
        assert_eq!(ImageKind::from_name("IMG_0001.HEIC"), Some(ImageKind::Heic));
        assert_eq!(ImageKind::from_name("scan.JPeG"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_name("photo.heif"), Some(ImageKind::Heic));
        assert_eq!(ImageKind::from_name("notes.txt"), None);
        assert_eq!(ImageKind::from_name("README"), None);
    }

    #[test]
    fn rotation_from_degrees_rejects_non_quarter_turns() {
        assert_eq!(Rotation::from_degrees(270).unwrap(), Rotation::Deg270);
        assert_eq!(Rotation::from_degrees(45), Err(RecordError::InvalidRotation(45)));
        assert_eq!(Rotation::from_degrees(360), Err(RecordError::InvalidRotation(360)));
    }

    #[test]
    fn four_clockwise_steps_return_to_start() {
        let mut r = Rotation::Deg0;
        for _ in 0..4 {
            r = r.clockwise();
        }
        assert_eq!(r, Rotation::Deg0);
        assert!(Rotation::Deg90.swaps_axes());
        assert!(!Rotation::Deg180.swaps_axes());
    }

    #[test]
    fn landscape_swaps_paper_axes() {
        assert_eq!(PaperSize::A4.oriented_mm(PageOrientation::Portrait), (210.0, 297.0));
        assert_eq!(PaperSize::A4.oriented_mm(PageOrientation::Landscape), (297.0, 210.0));
    }

    #[test]
    fn sort_key_parses_and_serialises_lowercase() {
        assert_eq!("Name".parse::<SortKey>().unwrap(), SortKey::Name);
        assert!("size".parse::<SortKey>().is_err());
        assert_eq!(serde_json::to_string(&SortKey::Date).unwrap(), "\"date\"");
    }

    #[test]
    fn mobile_profile_caps_input_at_25_mib() {
        assert_eq!(PlatformProfile::mobile().max_input_bytes, Some(26_214_400));
        assert_eq!(PlatformProfile::desktop().max_input_bytes, None);
    }
}
