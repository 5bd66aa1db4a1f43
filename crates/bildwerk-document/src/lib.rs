// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bildwerk-document — Everything that touches pixels or PDF bytes.
//
// Provides the safe two-tier image decoder, the quarter-turn rotation engine,
// the HEIC transcoder adapter, the page-fit layout engine and the PDF
// assembler/inspector.

pub mod heic;
pub mod image;
pub mod layout;
pub mod pdf;

// Re-export the primary structs so callers can use `bildwerk_document::SafeDecoder` etc.
pub use heic::{HeicTranscoder, TranscodeOutput, TranscoderAdapter};
pub use self::image::decoder::{DecodeStrategy, SafeDecoder};
pub use self::image::rotation::rotate;
pub use self::image::surface::RasterSurface;
pub use layout::{PageGeometry, PageSpec};
pub use pdf::reader::PdfInspector;
pub use pdf::writer::{PdfAssembler, PreparedPage, suggested_filename};

#[cfg(feature = "libheif")]
pub use heic::libheif::LibheifTranscoder;
