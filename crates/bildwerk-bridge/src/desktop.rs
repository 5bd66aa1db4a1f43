// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop bridge — no native save dialog, documents land in a directory.

use std::path::{Path, PathBuf};

use bildwerk_core::types::PlatformProfile;
use tracing::debug;

use crate::traits::{DocumentSaver, PlatformBridge};

/// Bridge for Linux, macOS and Windows builds.
///
/// The decoder profile defaults to [`PlatformProfile::desktop`] but can be
/// swapped for the mobile one to reproduce mobile limits on a workstation.
pub struct DesktopBridge {
    download_dir: PathBuf,
    profile: PlatformProfile,
    saver: Option<Box<dyn DocumentSaver>>,
}

impl DesktopBridge {
    /// Bridge writing into the user's download directory.
    pub fn new() -> Self {
        Self::with_download_dir(default_download_dir())
    }

    pub fn with_download_dir(dir: impl Into<PathBuf>) -> Self {
        let download_dir = dir.into();
        debug!(dir = %download_dir.display(), "desktop bridge");
        Self {
            download_dir,
            profile: PlatformProfile::desktop(),
            saver: None,
        }
    }

    pub fn with_profile(mut self, profile: PlatformProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Route deliveries through `saver` instead of the download directory.
    pub fn with_saver(mut self, saver: Box<dyn DocumentSaver>) -> Self {
        self.saver = Some(saver);
        self
    }
}

impl Default for DesktopBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge for DesktopBridge {
    fn platform_name(&self) -> &str {
        if cfg!(target_os = "macos") {
            "macOS desktop"
        } else if cfg!(target_os = "windows") {
            "Windows desktop"
        } else {
            "Linux desktop"
        }
    }

    fn platform_profile(&self) -> PlatformProfile {
        self.profile
    }

    fn save_capability(&self) -> Option<&dyn DocumentSaver> {
        self.saver.as_deref()
    }

    fn download_dir(&self) -> &Path {
        &self.download_dir
    }
}

/// `$XDG_DOWNLOAD_DIR`, then `$HOME/Downloads`, then the temp directory.
pub fn default_download_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DOWNLOAD_DIR") {
        if !xdg.is_empty() {
            return PathBuf::from(xdg);
        }
    }
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        return PathBuf::from(home).join("Downloads");
    }
    std::env::temp_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_desktop_profile_without_saver() {
        let bridge = DesktopBridge::with_download_dir("/srv/out");
        assert_eq!(bridge.platform_profile(), PlatformProfile::desktop());
        assert!(bridge.save_capability().is_none());
        assert_eq!(bridge.download_dir(), Path::new("/srv/out"));
        assert!(bridge.platform_name().ends_with("desktop"));
    }

    #[test]
    fn profile_can_be_overridden() {
        let bridge = DesktopBridge::with_download_dir("/srv/out").with_profile(PlatformProfile::mobile());
        assert!(bridge.platform_profile().max_input_bytes.is_some());
    }
}
