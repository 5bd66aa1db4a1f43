// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mobile bridge — Android and iOS builds.
//
// Mobile browsers and webviews kill tabs that decode very large inputs, so
// this bridge always reports the mobile decoder profile.

use std::path::{Path, PathBuf};

use bildwerk_core::types::PlatformProfile;

use crate::traits::{DocumentSaver, PlatformBridge};

pub struct MobileBridge {
    download_dir: PathBuf,
}

impl MobileBridge {
    pub fn new() -> Self {
        Self {
            download_dir: mobile_download_dir(),
        }
    }
}

impl Default for MobileBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformBridge for MobileBridge {
    fn platform_name(&self) -> &str {
        if cfg!(target_os = "ios") { "iOS" } else { "Android" }
    }

    fn platform_profile(&self) -> PlatformProfile {
        PlatformProfile::mobile()
    }

    fn save_capability(&self) -> Option<&dyn DocumentSaver> {
        None
    }

    fn download_dir(&self) -> &Path {
        &self.download_dir
    }
}

#[cfg(target_os = "android")]
fn mobile_download_dir() -> PathBuf {
    PathBuf::from("/storage/emulated/0/Download")
}

#[cfg(target_os = "ios")]
fn mobile_download_dir() -> PathBuf {
    std::env::var("HOME")
        .map(|home| PathBuf::from(home).join("Documents"))
        .unwrap_or_else(|_| std::env::temp_dir())
}
