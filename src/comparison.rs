//! Tracking error against the reference models.
//!
//! Tracking error here is the total-variation distance between two weight
//! mappings: half the L1 distance, so 0 means identical and 1 means disjoint.

use std::collections::BTreeMap;

use crate::reference::ReferenceData;
use crate::types::{WeightMap, round_to};

/// Model key → tracking error, ordered by key.
pub type TrackingErrorTable = BTreeMap<String, f64>;

/// Half the L1 distance between `a` and `b`, unrounded.
///
/// Tickers missing from one side count as zero weight there.
pub fn l1_half_distance(a: &WeightMap, b: &WeightMap) -> f64 {
    let diff: f64 = a
        .union_tickers(b)
        .into_iter()
        .map(|t| (a.get(t) - b.get(t)).abs())
        .sum();
    diff / 2.0
}

/// Tracking error of `user` against every reference model, rounded to four decimals.
pub fn tracking_error(user: &WeightMap, reference: &ReferenceData) -> TrackingErrorTable {
    reference
        .models()
        .iter()
        .map(|(key, model)| (key.clone(), round_to(l1_half_distance(user, model), 4)))
        .collect()
}
