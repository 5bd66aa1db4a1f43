// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.

use std::path::{Path, PathBuf};

use bildwerk_core::error::Result;
use bildwerk_core::types::PlatformProfile;

/// Unified bridge that groups the capabilities the pipeline needs.
pub trait PlatformBridge: Send + Sync {
    /// Human-readable platform name (e.g. "Linux desktop", "Android").
    fn platform_name(&self) -> &str;

    /// Decoder limits of this platform.
    fn platform_profile(&self) -> PlatformProfile;

    /// Native "save file" capability, if the platform has one.
    fn save_capability(&self) -> Option<&dyn DocumentSaver>;

    /// Where documents go when there is no save capability.
    fn download_dir(&self) -> &Path;
}

/// Hands a finished document to the platform's save dialog or file API.
pub trait DocumentSaver: Send + Sync {
    /// Persist `document` under (a name derived from) `suggested_name` and
    /// return where it ended up.
    fn save(&self, document: &[u8], suggested_name: &str) -> Result<PathBuf>;
}
