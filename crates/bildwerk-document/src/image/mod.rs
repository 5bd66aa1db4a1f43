// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — bounded decoding, raster surfaces and quarter-turn rotation.

pub mod decoder;
pub mod rotation;
pub mod surface;

pub use decoder::SafeDecoder;
pub use surface::RasterSurface;
