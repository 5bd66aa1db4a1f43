// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Delivery — hand a finished document to the user.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use bildwerk_core::error::{BildwerkError, Result};
use tracing::{info, instrument};

use crate::traits::PlatformBridge;

/// Attempts at a free `name (n).ext` before giving up.
const MAX_SUFFIX: u32 = 9_999;

/// Save `document` through the bridge's native capability, or write it into
/// the download directory. Existing files are never overwritten.
#[instrument(skip(bridge, document), fields(platform = bridge.platform_name(), bytes = document.len()))]
pub fn deliver(bridge: &dyn PlatformBridge, document: &[u8], filename: &str) -> Result<PathBuf> {
    if let Some(saver) = bridge.save_capability() {
        let path = saver.save(document, filename)?;
        info!(path = %path.display(), "document saved via platform");
        return Ok(path);
    }

    let dir = bridge.download_dir();
    std::fs::create_dir_all(dir)?;
    let path = write_new(dir, filename, document)?;
    info!(path = %path.display(), "document written");
    Ok(path)
}

/// Write into the first free name of the form `name.ext`, `name (1).ext`,
/// `name (2).ext`, … using `create_new`, so an existing file is never
/// clobbered.
fn write_new(dir: &Path, filename: &str, document: &[u8]) -> Result<PathBuf> {
    for n in 0..=MAX_SUFFIX {
        let path = candidate_path(dir, filename, n);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(document)?;
                file.sync_all()?;
                return Ok(path);
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Err(exhausted(filename))
}

fn candidate_path(dir: &Path, filename: &str, n: u32) -> PathBuf {
    if n == 0 {
        return dir.join(filename);
    }
    let name = Path::new(filename);
    let stem = name.file_stem().map_or_else(|| filename.into(), |s| s.to_string_lossy());
    match name.extension() {
        Some(ext) => dir.join(format!("{stem} ({n}).{}", ext.to_string_lossy())),
        None => dir.join(format!("{stem} ({n})")),
    }
}

fn exhausted(filename: &str) -> BildwerkError {
    BildwerkError::Io(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free file name left for {filename}"),
    ))
}
