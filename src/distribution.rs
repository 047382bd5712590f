//! Asset-class distribution: weights aggregated through the taxonomy.

use std::collections::BTreeMap;

use crate::reference::{AssetClass, ReferenceData};
use crate::types::WeightMap;

/// Asset class → aggregated weight.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Distribution(BTreeMap<AssetClass, f64>);

impl Distribution {
    /// Sum `weights` per asset class. Unknown tickers land in `Other`.
    pub fn build(weights: &WeightMap, reference: &ReferenceData) -> Self {
        let mut classes = BTreeMap::new();
        for (ticker, weight) in weights.iter() {
            *classes.entry(reference.classify(ticker)).or_insert(0.0) += weight;
        }
        Self(classes)
    }

    /// Weight of a class, 0.0 if no holding maps to it.
    pub fn get(&self, class: AssetClass) -> f64 {
        self.0.get(&class).copied().unwrap_or(0.0)
    }

    /// Combined weight of several classes.
    pub fn sum_of(&self, classes: &[AssetClass]) -> f64 {
        classes.iter().map(|&c| self.get(c)).sum()
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssetClass, f64)> + '_ {
        self.0.iter().map(|(&c, &w)| (c, w))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
