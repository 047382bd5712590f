//! Parallel batch scoring.

use crate::reference::ReferenceData;
use crate::scoring::{PulseScore, score};
use crate::types::WeightMap;

/// Score many weight mappings in parallel. Output order matches input order.
///
/// # Example
///
/// ```ignore
/// use portfolio_pulse::{ReferenceData, WeightMap, sweep::score_batch};
///
/// let reference = ReferenceData::standard();
/// let candidates: Vec<WeightMap> = (1..=9)
///     .map(|i| [("VTI", i as f64 / 10.0), ("TLT", 1.0 - i as f64 / 10.0)].into_iter().collect())
///     .collect();
/// let scores = score_batch(&candidates, &reference);
/// ```
pub fn score_batch(portfolios: &[WeightMap], reference: &ReferenceData) -> Vec<PulseScore> {
    use rayon::prelude::*;

    portfolios
        .par_iter()
        .map(|weights| score(weights, reference))
        .collect()
}
