// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Intake — screen raw candidates, then admit the accepted ones.
//
// `screen` never touches the store and never stops early: every candidate is
// classified as accepted, rejected or duplicate. `admit` is the mutation.

use std::collections::HashSet;

use bildwerk_core::error::{BildwerkError, Result, ValidationError};
use bildwerk_core::types::{Candidate, ImageKind, RecordId};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::store::ImageStore;

/// A candidate that passed screening.
#[derive(Debug, Clone)]
pub struct Accepted {
    pub id: RecordId,
    pub kind: ImageKind,
    pub candidate: Candidate,
}

/// Classification of one batch of candidates.
#[derive(Debug, Default)]
pub struct IntakeOutcome {
    /// In arrival order.
    pub accepted: Vec<Accepted>,
    pub rejected: Vec<ValidationError>,
    /// Display names of candidates dropped as exact duplicates.
    pub duplicates: Vec<String>,
}

impl IntakeOutcome {
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }
}

/// Classify `candidates` against the current contents of `store`.
///
/// A candidate is rejected when its extension is not jpg, jpeg, png, heic or
/// heif, or when it is empty. It is dropped without error when a queued
/// record, or an earlier candidate of the same call, has the same name and
/// size.
#[instrument(skip_all, fields(candidates = candidates.len(), queued = store.len()))]
pub fn screen(store: &ImageStore, candidates: Vec<Candidate>) -> IntakeOutcome {
    let mut outcome = IntakeOutcome::default();
    let mut seen: HashSet<RecordId> = HashSet::new();

    for candidate in candidates {
        let Some(kind) = ImageKind::from_name(&candidate.name) else {
            warn!(name = %candidate.name, "rejected: unsupported type");
            outcome.rejected.push(ValidationError::UnsupportedType {
                name: candidate.name,
            });
            continue;
        };

        if candidate.size == 0 {
            warn!(name = %candidate.name, "rejected: empty file");
            outcome.rejected.push(ValidationError::EmptyFile {
                name: candidate.name,
            });
            continue;
        }

        let id = RecordId::derive(&candidate.name, candidate.size);
        if store.contains(&id) || !seen.insert(id.clone()) {
            debug!(name = %candidate.name, "duplicate dropped");
            outcome.duplicates.push(candidate.name);
            continue;
        }

        outcome.accepted.push(Accepted {
            id,
            kind,
            candidate,
        });
    }

    debug!(
        accepted = outcome.accepted.len(),
        rejected = outcome.rejected.len(),
        duplicates = outcome.duplicates.len(),
        "candidates screened"
    );
    outcome
}

/// Append accepted candidates to the store in arrival order.
///
/// Fails without inserting anything if a batch holds the store.
pub fn admit(
    store: &mut ImageStore,
    accepted: Vec<Accepted>,
    admitted_at: DateTime<Utc>,
) -> Result<Vec<RecordId>> {
    if store.is_locked() {
        return Err(BildwerkError::StoreLocked);
    }

    let mut ids = Vec::with_capacity(accepted.len());
    for entry in accepted {
        ids.push(store.insert(entry.candidate, entry.kind, admitted_at)?);
    }
    info!(added = ids.len(), queued = store.len(), "images added");
    Ok(ids)
}

/// Screen and admit in one step, stamping missing timestamps with "now".
pub fn add_candidates(store: &mut ImageStore, candidates: Vec<Candidate>) -> Result<IntakeOutcome> {
    if store.is_locked() {
        return Err(BildwerkError::StoreLocked);
    }
    let outcome = screen(store, candidates);
    admit(store, outcome.accepted.clone(), Utc::now())?;
    Ok(outcome)
}
