// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF inspector — read back produced documents with `lopdf`.

use std::path::Path;

use bildwerk_core::error::BildwerkError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument};

const MM_PER_PT: f32 = 25.4 / 72.0;

/// Read-only view of a PDF document.
pub struct PdfInspector {
    document: Document,
}

impl PdfInspector {
    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BildwerkError> {
        let path_ref = path.as_ref();
        let document = Document::load(path_ref).map_err(|err| {
            BildwerkError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;
        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self { document })
    }

    /// Inspect PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, BildwerkError> {
        let document = Document::load_mem(data).map_err(|err| {
            BildwerkError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;
        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Width and height of page `page_number` (1-indexed) in millimetres,
    /// taken from its MediaBox (inherited from the page tree if necessary).
    pub fn page_size_mm(&self, page_number: u32) -> Result<(f32, f32), BildwerkError> {
        let pages = self.document.get_pages();
        let page_id = *pages.get(&page_number).ok_or_else(|| {
            BildwerkError::PdfError(format!(
                "page {} not found (document has {} pages)",
                page_number,
                pages.len()
            ))
        })?;

        let media_box = self.media_box(page_id)?;
        let [x0, y0, x1, y1] = media_box;
        Ok(((x1 - x0).abs() * MM_PER_PT, (y1 - y0).abs() * MM_PER_PT))
    }

    fn media_box(&self, mut node_id: ObjectId) -> Result<[f32; 4], BildwerkError> {
        // Bounded walk up the page tree.
        for _ in 0..32 {
            let dict = self.dictionary(node_id)?;
            if let Ok(Object::Array(values)) = dict.get(b"MediaBox") {
                return parse_rect(values);
            }
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => node_id = *parent,
                _ => break,
            }
        }
        Err(BildwerkError::PdfError("page has no MediaBox".into()))
    }

    fn dictionary(&self, id: ObjectId) -> Result<&Dictionary, BildwerkError> {
        match self.document.get_object(id) {
            Ok(Object::Dictionary(dict)) => Ok(dict),
            Ok(_) => Err(BildwerkError::PdfError(format!("object {id:?} is not a dictionary"))),
            Err(err) => Err(BildwerkError::PdfError(format!("cannot read object {id:?}: {err}"))),
        }
    }
}

fn parse_rect(values: &[Object]) -> Result<[f32; 4], BildwerkError> {
    if values.len() != 4 {
        return Err(BildwerkError::PdfError(format!(
            "MediaBox has {} entries, expected 4",
            values.len()
        )));
    }
    let mut rect = [0.0f32; 4];
    for (slot, value) in rect.iter_mut().zip(values) {
        *slot = match value {
            Object::Integer(v) => *v as f32,
            Object::Real(v) => *v as f32,
            other => {
                return Err(BildwerkError::PdfError(format!(
                    "MediaBox entry is not a number: {other:?}"
                )));
            }
        };
    }
    Ok(rect)
}
