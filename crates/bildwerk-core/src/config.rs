// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BildwerkError, Result};
use crate::types::{PageOrientation, PaperSize, SortKey};

/// Settings consumed by the conversion pipeline.
///
/// Missing fields in a settings file fall back to their defaults, so older
/// files keep loading as new settings are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Orientation of every generated page.
    pub page_orientation: PageOrientation,
    /// Order used when the user has not arranged images by hand.
    pub sort_key: SortKey,
    /// Paper size before orientation is applied.
    pub paper_size: PaperSize,
    /// Hard margin between image and page edge, in millimetres.
    pub margin_mm: f32,
    /// Extra shrink applied after the fit computation (1.0 = tight fit).
    pub shrink_factor: f32,
    /// JPEG quality used when transcoding HEIC input (0.0–1.0).
    pub transcode_quality: f32,
    /// Longest allowed raster edge after decoding, in pixels.
    pub max_dimension: u32,
    /// Per-step timeout in seconds. `None` waits indefinitely.
    pub step_timeout_secs: Option<u64>,
    /// How long transient messages stay visible, in seconds.
    pub message_clear_secs: u64,
    /// Where finished documents are written. `None` uses the platform
    /// download directory.
    pub output_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            page_orientation: PageOrientation::Portrait,
            sort_key: SortKey::Natural,
            paper_size: PaperSize::A4,
            margin_mm: 1.0,
            shrink_factor: 1.0,
            transcode_quality: 0.85,
            max_dimension: 4096,
            step_timeout_secs: None,
            message_clear_secs: 5,
            output_dir: None,
        }
    }
}

impl AppConfig {
    /// Read settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        debug!(path = %path.display(), "settings loaded");
        Ok(config)
    }

    /// Read settings from `path` if it exists, otherwise return defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Persist settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "settings saved");
        Ok(())
    }

    /// Reject values the layout and decoder cannot work with.
    pub fn validate(&self) -> Result<()> {
        let (page_w, page_h) = self.paper_size.dimensions_mm();
        if !(page_w > 0.0 && page_h > 0.0) {
            return Err(BildwerkError::Config(format!(
                "paper size must be positive, got {page_w}x{page_h} mm"
            )));
        }
        if !(self.margin_mm >= 0.0 && 2.0 * self.margin_mm < page_w.min(page_h)) {
            return Err(BildwerkError::Config(format!(
                "margin of {} mm leaves no printable area",
                self.margin_mm
            )));
        }
        if !(self.shrink_factor > 0.0 && self.shrink_factor <= 1.0) {
            return Err(BildwerkError::Config(format!(
                "shrink factor must be in (0, 1], got {}",
                self.shrink_factor
            )));
        }
        if !(0.5..=1.0).contains(&self.transcode_quality) {
            return Err(BildwerkError::Config(format!(
                "transcode quality must be in [0.5, 1.0], got {}",
                self.transcode_quality
            )));
        }
        if self.max_dimension == 0 {
            return Err(BildwerkError::Config("max dimension must be at least 1 pixel".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behaviour() {
        let config = AppConfig::default();
        assert_eq!(config.paper_size, PaperSize::A4);
        assert_eq!(config.margin_mm, 1.0);
        assert_eq!(config.max_dimension, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");

        let config = AppConfig {
            page_orientation: PageOrientation::Landscape,
            sort_key: SortKey::Date,
            ..AppConfig::default()
        };
        config.save(&path).expect("save");

        let loaded = AppConfig::load(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "sort_key": "name" }"#).expect("write");

        let loaded = AppConfig::load(&path).expect("load");
        assert_eq!(loaded.sort_key, SortKey::Name);
        assert_eq!(loaded.page_orientation, PageOrientation::Portrait);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = AppConfig::load_or_default(dir.path().join("absent.json")).expect("load");
        assert_eq!(loaded, AppConfig::default());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let bad_shrink = AppConfig { shrink_factor: 1.5, ..AppConfig::default() };
        assert!(matches!(bad_shrink.validate(), Err(BildwerkError::Config(_))));

        let bad_margin = AppConfig { margin_mm: 200.0, ..AppConfig::default() };
        assert!(bad_margin.validate().is_err());

        let bad_quality = AppConfig { transcode_quality: 0.1, ..AppConfig::default() };
        assert!(bad_quality.validate().is_err());
    }
}
