// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::PathBuf;

/// Application data directory. Not created here; `AppConfig::save` creates
/// it on first write.
pub fn data_dir() -> PathBuf {
    dirs_fallback().join("bildwerk")
}

/// Default location of the settings file.
pub fn settings_path() -> PathBuf {
    data_dir().join("settings.json")
}

fn dirs_fallback() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    std::env::temp_dir()
}
