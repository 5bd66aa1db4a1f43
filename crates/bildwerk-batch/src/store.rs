// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image store — the owned working set of queued images.
//
// Records live in an arena keyed by `RecordId`. Natural order is the
// insertion sequence; an explicit user order is kept alongside and dropped on
// every add or remove. While a `BatchLease` is alive every mutation fails
// with `StoreLocked`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::{Candidate, ImageKind, ImageRecord, RecordId, Rotation, SortKey};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

/// How the store's records are ordered for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderState {
    /// Insertion order.
    Natural,
    /// Sorted by name or date.
    Sorted(SortKey),
    /// User-arranged identity sequence.
    Explicit(Vec<RecordId>),
}

impl OrderState {
    /// The non-explicit state for a sort key.
    pub fn from_sort_key(key: SortKey) -> Self {
        match key {
            SortKey::Natural => Self::Natural,
            other => Self::Sorted(other),
        }
    }
}

/// Exclusive claim on a store for the duration of one batch. Dropping the
/// lease unlocks the store, whether the batch finished or aborted.
#[derive(Debug)]
pub struct BatchLease {
    flag: Arc<AtomicBool>,
}

impl Drop for BatchLease {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        debug!("image store unlocked");
    }
}

/// Ordered working set of queued images.
#[derive(Debug, Default)]
pub struct ImageStore {
    records: HashMap<RecordId, ImageRecord>,
    next_sequence: u64,
    sort_key: SortKey,
    explicit: Option<Vec<RecordId>>,
    leased: Arc<AtomicBool>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort_key(sort_key: SortKey) -> Self {
        Self {
            sort_key,
            ..Self::default()
        }
    }

    // -- Inspection -----------------------------------------------------------

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &RecordId) -> Option<&ImageRecord> {
        self.records.get(id)
    }

    /// First record with the given display name, in insertion order.
    pub fn find_by_name(&self, name: &str) -> Option<&ImageRecord> {
        self.records_natural().into_iter().find(|r| r.name == name)
    }

    /// All records in insertion order.
    pub fn records_natural(&self) -> Vec<&ImageRecord> {
        let mut records: Vec<&ImageRecord> = self.records.values().collect();
        records.sort_by_key(|r| r.sequence);
        records
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    /// Current order state: the explicit order if one is set, otherwise the
    /// active sort.
    pub fn order_state(&self) -> OrderState {
        match &self.explicit {
            Some(ids) => OrderState::Explicit(ids.clone()),
            None => OrderState::from_sort_key(self.sort_key),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.leased.load(Ordering::Acquire)
    }

    // -- Locking --------------------------------------------------------------

    /// Lock the store for a batch. Fails if a batch already holds it.
    pub fn lease(&self) -> Result<BatchLease> {
        self.leased
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BildwerkError::StoreLocked)?;
        debug!(records = self.records.len(), "image store locked");
        Ok(BatchLease {
            flag: Arc::clone(&self.leased),
        })
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.is_locked() {
            return Err(BildwerkError::StoreLocked);
        }
        Ok(())
    }

    // -- Mutation -------------------------------------------------------------

    /// Append an accepted candidate with rotation 0.
    ///
    /// Inserting a `(name, size)` pair that is already queued is a no-op and
    /// returns the existing identity. A candidate without a timestamp is
    /// stamped with `admitted_at`.
    #[instrument(skip(self, candidate), fields(name = %candidate.name, size = candidate.size))]
    pub fn insert(
        &mut self,
        candidate: Candidate,
        kind: ImageKind,
        admitted_at: DateTime<Utc>,
    ) -> Result<RecordId> {
        self.ensure_unlocked()?;

        let id = RecordId::derive(&candidate.name, candidate.size);
        if self.records.contains_key(&id) {
            debug!(record = id.short(), "already queued");
            return Ok(id);
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let record = ImageRecord {
            id: id.clone(),
            name: candidate.name,
            size: candidate.size,
            kind,
            last_modified: candidate.last_modified.or(Some(admitted_at)),
            rotation: Rotation::Deg0,
            sequence,
            source: candidate.source,
        };
        self.records.insert(id.clone(), record);
        self.invalidate_explicit_order();

        debug!(record = id.short(), sequence, "record queued");
        Ok(id)
    }

    /// Remove a record. Drops any explicit order.
    #[instrument(skip(self), fields(record = id.short()))]
    pub fn remove(&mut self, id: &RecordId) -> Result<ImageRecord> {
        self.ensure_unlocked()?;
        let record = self
            .records
            .remove(id)
            .ok_or_else(|| BildwerkError::UnknownRecord(id.to_string()))?;
        self.invalidate_explicit_order();
        info!(name = %record.name, remaining = self.records.len(), "record removed");
        Ok(record)
    }

    /// Remove every record.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_unlocked()?;
        self.records.clear();
        self.explicit = None;
        info!("image store cleared");
        Ok(())
    }

    /// Advance a record's rotation by 90 degrees. Keeps any explicit order.
    pub fn rotate_clockwise(&mut self, id: &RecordId) -> Result<Rotation> {
        self.ensure_unlocked()?;
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| BildwerkError::UnknownRecord(id.to_string()))?;
        record.rotation = record.rotation.clockwise();
        debug!(record = id.short(), degrees = record.rotation.degrees(), "record rotated");
        Ok(record.rotation)
    }

    /// Set a record's rotation directly.
    pub fn set_rotation(&mut self, id: &RecordId, rotation: Rotation) -> Result<()> {
        self.ensure_unlocked()?;
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| BildwerkError::UnknownRecord(id.to_string()))?;
        record.rotation = rotation;
        Ok(())
    }

    /// Replace the order with a user-arranged identity sequence.
    ///
    /// The sequence is checked against the store only when it is resolved.
    pub fn reorder(&mut self, ids: Vec<RecordId>) -> Result<()> {
        self.ensure_unlocked()?;
        debug!(count = ids.len(), "explicit order set");
        self.explicit = Some(ids);
        Ok(())
    }

    /// Change the active sort. Choosing a sort replaces any explicit order.
    pub fn set_sort_key(&mut self, key: SortKey) -> Result<()> {
        self.ensure_unlocked()?;
        self.sort_key = key;
        self.explicit = None;
        debug!(?key, "sort key changed");
        Ok(())
    }

    fn invalidate_explicit_order(&mut self) {
        if self.explicit.take().is_some() {
            debug!("explicit order discarded after add/remove");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, len: usize) -> Candidate {
        Candidate::from_bytes(name, vec![1u8; len])
    }

    fn store_with(names: &[&str]) -> (ImageStore, Vec<RecordId>) {
        let mut store = ImageStore::new();
        let ids = names
            .iter()
            .map(|n| {
                let kind = ImageKind::from_name(n).expect("kind");
                store.insert(candidate(n, 4), kind, Utc::now()).expect("insert")
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn insert_is_idempotent_for_name_and_size() {
        let mut store = ImageStore::new();
        let first = store.insert(candidate("a.jpg", 3), ImageKind::Jpeg, Utc::now()).unwrap();
        let second = store.insert(candidate("a.jpg", 3), ImageKind::Jpeg, Utc::now()).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);

        store.insert(candidate("a.jpg", 4), ImageKind::Jpeg, Utc::now()).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn records_keep_insertion_sequence_and_start_unrotated() {
        let (store, ids) = store_with(&["c.png", "a.jpg", "b.heic"]);
        let names: Vec<&str> = store.records_natural().into_iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["c.png", "a.jpg", "b.heic"]);
        assert!(ids.iter().all(|id| store.get(id).unwrap().rotation == Rotation::Deg0));
    }

    #[test]
    fn missing_timestamp_is_stamped_at_admission() {
        let mut store = ImageStore::new();
        let at = Utc::now();
        let id = store.insert(candidate("x.png", 2), ImageKind::Png, at).unwrap();
        assert_eq!(store.get(&id).unwrap().last_modified, Some(at));
    }

    #[test]
    fn add_and_remove_discard_explicit_order() {
        let (mut store, ids) = store_with(&["a.jpg", "b.jpg"]);
        store.reorder(vec![ids[1].clone(), ids[0].clone()]).unwrap();
        assert!(matches!(store.order_state(), OrderState::Explicit(_)));

        store.insert(candidate("c.jpg", 4), ImageKind::Jpeg, Utc::now()).unwrap();
        assert_eq!(store.order_state(), OrderState::Natural);

        store.reorder(ids.clone()).unwrap();
        store.remove(&ids[0]).unwrap();
        assert_eq!(store.order_state(), OrderState::Natural);
    }

    #[test]
    fn rotation_keeps_explicit_order() {
        let (mut store, ids) = store_with(&["a.jpg", "b.jpg"]);
        store.reorder(vec![ids[1].clone(), ids[0].clone()]).unwrap();
        assert_eq!(store.rotate_clockwise(&ids[0]).unwrap(), Rotation::Deg90);
        assert!(matches!(store.order_state(), OrderState::Explicit(_)));
    }

    #[test]
    fn sort_change_replaces_explicit_order() {
        let (mut store, ids) = store_with(&["a.jpg", "b.jpg"]);
        store.reorder(ids).unwrap();
        store.set_sort_key(SortKey::Date).unwrap();
        assert_eq!(store.order_state(), OrderState::Sorted(SortKey::Date));
    }

    #[test]
    fn unknown_record_is_reported() {
        let (mut store, _) = store_with(&["a.jpg"]);
        let ghost = RecordId::derive("ghost.jpg", 1);
        assert!(matches!(store.remove(&ghost), Err(BildwerkError::UnknownRecord(_))));
        assert!(matches!(store.rotate_clockwise(&ghost), Err(BildwerkError::UnknownRecord(_))));
    }

    #[test]
    fn lease_blocks_every_mutation_until_dropped() {
        let (mut store, ids) = store_with(&["a.jpg"]);
        let lease = store.lease().expect("lease");
        assert!(store.is_locked());
        assert!(matches!(store.lease(), Err(BildwerkError::StoreLocked)));

        assert!(matches!(
            store.insert(candidate("b.jpg", 1), ImageKind::Jpeg, Utc::now()),
            Err(BildwerkError::StoreLocked)
        ));
        assert!(matches!(store.remove(&ids[0]), Err(BildwerkError::StoreLocked)));
        assert!(matches!(store.rotate_clockwise(&ids[0]), Err(BildwerkError::StoreLocked)));
        assert!(matches!(store.reorder(ids.clone()), Err(BildwerkError::StoreLocked)));
        assert!(matches!(store.set_sort_key(SortKey::Name), Err(BildwerkError::StoreLocked)));

        drop(lease);
        assert!(!store.is_locked());
        store.rotate_clockwise(&ids[0]).expect("unlocked again");
    }
}
