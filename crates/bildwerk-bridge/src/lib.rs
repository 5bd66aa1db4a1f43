// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bildwerk Bridge — what the runtime platform can do for us.
//
// A bridge reports the platform's decoder limits and gets a finished
// document to the user: through a native "save file" capability when the
// platform offers one, otherwise by writing it into the download directory.

pub mod deliver;
pub mod desktop;
pub mod traits;

#[cfg(any(target_os = "ios", target_os = "android"))]
pub mod mobile;

pub use deliver::deliver;
pub use desktop::{DesktopBridge, default_download_dir};
pub use traits::{DocumentSaver, PlatformBridge};

/// The bridge for the operating system this binary was built for.
pub fn platform_bridge() -> Box<dyn PlatformBridge> {
    #[cfg(any(target_os = "ios", target_os = "android"))]
    {
        Box::new(mobile::MobileBridge::new())
    }
    #[cfg(not(any(target_os = "ios", target_os = "android")))]
    {
        Box::new(DesktopBridge::new())
    }
}
