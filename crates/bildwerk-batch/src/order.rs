// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Order resolver — decide the processing order of the queued records.
//
// An explicit user order wins when it names every queued record exactly
// once. Anything else (a stale identity, a duplicate, a missing record)
// discards it in favour of the active sort; there is no partial reorder.

use std::cmp::Ordering;
use std::collections::HashSet;

use bildwerk_core::types::{ImageRecord, RecordId, SortKey};
use icu_collator::{Collator, CollatorOptions, Strength};
use icu_locid::locale;
use tracing::{debug, warn};

use crate::store::{ImageStore, OrderState};

/// Snapshot of the store in processing order.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub records: Vec<ImageRecord>,
    /// The order that was actually applied.
    pub state_used: OrderState,
    /// True when an explicit order was present but inconsistent.
    pub fell_back: bool,
}

thread_local! {
    // `Collator` is not `Send`; one per thread is built on first use.
    static NAME_COLLATOR: Option<Collator> = name_collator();
}

/// Russian-locale collation at secondary strength: letter case is ignored,
/// accents are not.
fn name_collator() -> Option<Collator> {
    let mut options = CollatorOptions::new();
    options.strength = Some(Strength::Secondary);
    match Collator::try_new(&(&locale!("ru")).into(), options) {
        Ok(collator) => Some(collator),
        Err(err) => {
            warn!(error = %err, "no collation data, names sort by code point");
            None
        }
    }
}

/// Locale-aware, case-insensitive name order; insertion sequence breaks
/// ties.
pub fn compare_by_name(a: &ImageRecord, b: &ImageRecord) -> Ordering {
    NAME_COLLATOR
        .with(|collator| match collator {
            Some(collator) => collator.compare(&a.name, &b.name),
            None => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        })
        .then(a.sequence.cmp(&b.sequence))
}

/// Oldest first; a missing timestamp counts as the epoch.
pub fn compare_by_date(a: &ImageRecord, b: &ImageRecord) -> Ordering {
    let millis = |r: &ImageRecord| r.last_modified.map_or(0, |t| t.timestamp_millis());
    millis(a).cmp(&millis(b)).then(a.sequence.cmp(&b.sequence))
}

fn compare_natural(a: &ImageRecord, b: &ImageRecord) -> Ordering {
    a.sequence.cmp(&b.sequence)
}

/// Sort `records` in place by `key`.
pub fn sort_records(records: &mut [ImageRecord], key: SortKey) {
    match key {
        SortKey::Natural => records.sort_by(compare_natural),
        SortKey::Name => records.sort_by(compare_by_name),
        SortKey::Date => records.sort_by(compare_by_date),
    }
}

/// Resolve the processing order of `store`.
pub fn resolve(store: &ImageStore) -> Resolution {
    let sorted = || {
        let mut records: Vec<ImageRecord> = store.records_natural().into_iter().cloned().collect();
        sort_records(&mut records, store.sort_key());
        records
    };

    match store.order_state() {
        OrderState::Explicit(ids) => match explicit_order(store, &ids) {
            Some(records) => {
                debug!(count = records.len(), "using explicit order");
                Resolution {
                    records,
                    state_used: OrderState::Explicit(ids),
                    fell_back: false,
                }
            }
            None => {
                warn!(
                    listed = ids.len(),
                    queued = store.len(),
                    "explicit order is inconsistent, using the active sort"
                );
                Resolution {
                    records: sorted(),
                    state_used: OrderState::from_sort_key(store.sort_key()),
                    fell_back: true,
                }
            }
        },
        state => Resolution {
            records: sorted(),
            state_used: state,
            fell_back: false,
        },
    }
}

/// Records in `ids` order, or `None` unless `ids` names every queued record
/// exactly once.
fn explicit_order(store: &ImageStore, ids: &[RecordId]) -> Option<Vec<ImageRecord>> {
    if ids.len() != store.len() {
        return None;
    }
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .map(|id| {
            if !seen.insert(id) {
                return None;
            }
            store.get(id).cloned()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bildwerk_core::types::{Candidate, ImageKind};
    use chrono::{TimeZone, Utc};

    fn add(store: &mut ImageStore, name: &str, len: usize, modified_secs: Option<i64>) -> RecordId {
        let mut candidate = Candidate::from_bytes(name, vec![0u8; len]);
        if let Some(secs) = modified_secs {
            candidate = candidate.with_last_modified(Utc.timestamp_opt(secs, 0).unwrap());
        }
        let kind = ImageKind::from_name(name).unwrap();
        store.insert(candidate, kind, Utc::now()).unwrap()
    }

    fn names(resolution: &Resolution) -> Vec<&str> {
        resolution.records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn natural_order_is_insertion_order() {
        let mut store = ImageStore::new();
        add(&mut store, "b.jpg", 1, None);
        add(&mut store, "a.png", 1, None);
        let resolution = resolve(&store);
        assert_eq!(names(&resolution), ["b.jpg", "a.png"]);
        assert_eq!(resolution.state_used, OrderState::Natural);
    }

    #[test]
    fn name_sort_is_case_insensitive() {
        let mut store = ImageStore::with_sort_key(SortKey::Name);
        add(&mut store, "b.jpg", 1, None);
        add(&mut store, "a.png", 1, None);
        add(&mut store, "c.heic", 1, None);
        add(&mut store, "B.png", 1, None);

        let resolution = resolve(&store);
        assert_eq!(names(&resolution), ["a.png", "b.jpg", "B.png", "c.heic"]);
        assert_eq!(resolution.state_used, OrderState::Sorted(SortKey::Name));
    }

    #[test]
    fn name_sort_follows_the_alphabet_not_code_points() {
        let mut store = ImageStore::with_sort_key(SortKey::Name);
        for name in ["Яблоко.jpg", "zebra.jpg", "арбуз.jpg", "éclair.jpg", "Ёж.jpg", "f.jpg", "груша.jpg"] {
            add(&mut store, name, 1, None);
        }

        let resolution = resolve(&store);
        let sorted = names(&resolution);
        let cyrillic: Vec<&str> = sorted
            .iter()
            .copied()
            .filter(|n| n.chars().next().is_some_and(|c| ('\u{0400}'..='\u{04FF}').contains(&c)))
            .collect();
        let latin: Vec<&str> = sorted.iter().copied().filter(|n| !cyrillic.contains(n)).collect();

        assert_eq!(cyrillic, ["арбуз.jpg", "груша.jpg", "Ёж.jpg", "Яблоко.jpg"]);
        assert_eq!(latin, ["éclair.jpg", "f.jpg", "zebra.jpg"]);

        // each script stays in one block
        let first_cyrillic = sorted.iter().position(|n| *n == cyrillic[0]).expect("present");
        let cyrillic_block = &sorted[first_cyrillic..first_cyrillic + cyrillic.len()];
        assert_eq!(cyrillic_block, cyrillic.as_slice());
    }

    #[test]
    fn names_equal_but_for_case_keep_insertion_order() {
        let mut store = ImageStore::with_sort_key(SortKey::Name);
        add(&mut store, "Scan.png", 1, None);
        add(&mut store, "scan.png", 2, None);
        add(&mut store, "SCAN.png", 3, None);
        assert_eq!(names(&resolve(&store)), ["Scan.png", "scan.png", "SCAN.png"]);
    }

    #[test]
    fn date_sort_is_oldest_first() {
        let mut store = ImageStore::with_sort_key(SortKey::Date);
        add(&mut store, "new.jpg", 1, Some(2_000));
        add(&mut store, "old.jpg", 1, Some(1_000));
        add(&mut store, "mid.jpg", 1, Some(1_500));
        assert_eq!(names(&resolve(&store)), ["old.jpg", "mid.jpg", "new.jpg"]);
    }

    #[test]
    fn missing_date_sorts_as_epoch() {
        let mut a = ImageRecord {
            id: RecordId::derive("a.jpg", 1),
            name: "a.jpg".into(),
            size: 1,
            kind: ImageKind::Jpeg,
            last_modified: Some(Utc.timestamp_opt(10, 0).unwrap()),
            rotation: Default::default(),
            sequence: 0,
            source: bildwerk_core::types::ByteSource::from_vec(vec![0]),
        };
        let mut b = a.clone();
        b.last_modified = None;
        b.sequence = 1;
        assert_eq!(compare_by_date(&b, &a), Ordering::Less);

        a.last_modified = None;
        assert_eq!(compare_by_date(&a, &b), Ordering::Less);
    }

    #[test]
    fn explicit_order_overrides_sort() {
        let mut store = ImageStore::with_sort_key(SortKey::Name);
        let a = add(&mut store, "a.jpg", 1, None);
        let b = add(&mut store, "b.jpg", 1, None);
        let c = add(&mut store, "c.jpg", 1, None);
        store.reorder(vec![c, a, b]).unwrap();

        let resolution = resolve(&store);
        assert_eq!(names(&resolution), ["c.jpg", "a.jpg", "b.jpg"]);
        assert!(!resolution.fell_back);
    }

    #[test]
    fn unknown_identity_falls_back_to_active_sort() {
        let mut store = ImageStore::with_sort_key(SortKey::Name);
        let b = add(&mut store, "b.jpg", 1, None);
        add(&mut store, "a.jpg", 1, None);
        store.reorder(vec![b, RecordId::derive("ghost.jpg", 9)]).unwrap();

        let resolution = resolve(&store);
        assert!(resolution.fell_back);
        assert_eq!(names(&resolution), ["a.jpg", "b.jpg"]);
        assert_eq!(resolution.state_used, OrderState::Sorted(SortKey::Name));
    }

    #[test]
    fn duplicate_or_short_explicit_order_falls_back() {
        let mut store = ImageStore::new();
        let a = add(&mut store, "a.jpg", 1, None);
        add(&mut store, "b.jpg", 1, None);

        store.reorder(vec![a.clone(), a.clone()]).unwrap();
        assert!(resolve(&store).fell_back);

        store.reorder(vec![a]).unwrap();
        let resolution = resolve(&store);
        assert!(resolution.fell_back);
        assert_eq!(names(&resolution), ["a.jpg", "b.jpg"]);
    }

    #[test]
    fn removal_voids_the_explicit_order() {
        let mut store = ImageStore::with_sort_key(SortKey::Name);
        let a = add(&mut store, "a.jpg", 1, None);
        let b = add(&mut store, "b.jpg", 1, None);
        let c = add(&mut store, "c.jpg", 1, None);
        store.reorder(vec![c.clone(), b, a]).unwrap();

        store.remove(&c).unwrap();
        let resolution = resolve(&store);
        assert_eq!(names(&resolution), ["a.jpg", "b.jpg"]);
        assert_eq!(resolution.state_used, OrderState::Sorted(SortKey::Name));
        assert!(!resolution.fell_back);
    }
}
