//! Reference data: asset-class taxonomy, expected returns, and model portfolios.
//!
//! Everything here is built once by [`ReferenceData::standard`] and then shared
//! read-only (typically behind an `Arc`). Nothing in this module is mutated
//! after construction.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::types::{WeightMap, normalize_ticker};

/// Coarse category used to aggregate tickers for scoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssetClass {
    Equities,
    InternationalEquities,
    RealEstate,
    LongBonds,
    IntermediateBonds,
    CoreBonds,
    InflationBonds,
    Gold,
    Commodities,
    Other,
}

impl AssetClass {
    pub const ALL: [AssetClass; 10] = [
        AssetClass::Equities,
        AssetClass::InternationalEquities,
        AssetClass::RealEstate,
        AssetClass::LongBonds,
        AssetClass::IntermediateBonds,
        AssetClass::CoreBonds,
        AssetClass::InflationBonds,
        AssetClass::Gold,
        AssetClass::Commodities,
        AssetClass::Other,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            AssetClass::Equities => "Equities",
            AssetClass::InternationalEquities => "International Equities",
            AssetClass::RealEstate => "Real Estate",
            AssetClass::LongBonds => "Long Bonds",
            AssetClass::IntermediateBonds => "Intermediate Bonds",
            AssetClass::CoreBonds => "Core Bonds",
            AssetClass::InflationBonds => "Inflation Bonds",
            AssetClass::Gold => "Gold",
            AssetClass::Commodities => "Commodities",
            AssetClass::Other => "Other",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Key of the hand-authored All Weather model.
pub const ALL_WEATHER: &str = "all_weather";
/// Key of the hand-authored Swensen model.
pub const SWENSEN: &str = "swensen";
/// Key of the derived 50/50 blend of the two models above.
pub const HYBRID: &str = "hybrid";

const TAXONOMY: &[(&str, AssetClass)] = &[
    ("VTI", AssetClass::Equities),
    ("VOO", AssetClass::Equities),
    ("SPY", AssetClass::Equities),
    ("AAPL", AssetClass::Equities),
    ("MSFT", AssetClass::Equities),
    ("VXUS", AssetClass::InternationalEquities),
    ("VEA", AssetClass::InternationalEquities),
    ("VNQ", AssetClass::RealEstate),
    ("TLT", AssetClass::LongBonds),
    ("IEF", AssetClass::IntermediateBonds),
    ("BND", AssetClass::CoreBonds),
    ("TIP", AssetClass::InflationBonds),
    ("IAU", AssetClass::Gold),
    ("GLD", AssetClass::Gold),
    ("DBC", AssetClass::Commodities),
    ("GSG", AssetClass::Commodities),
];

const EXPECTED_RETURNS: &[(AssetClass, f64)] = &[
    (AssetClass::Equities, 0.07),
    (AssetClass::InternationalEquities, 0.065),
    (AssetClass::RealEstate, 0.06),
    (AssetClass::LongBonds, 0.035),
    (AssetClass::IntermediateBonds, 0.03),
    (AssetClass::CoreBonds, 0.03),
    (AssetClass::InflationBonds, 0.028),
    (AssetClass::Gold, 0.025),
    (AssetClass::Commodities, 0.03),
    (AssetClass::Other, 0.04),
];

const ALL_WEATHER_WEIGHTS: &[(&str, f64)] = &[
    ("VTI", 0.30),
    ("TLT", 0.40),
    ("IEF", 0.15),
    ("IAU", 0.075),
    ("DBC", 0.075),
];

const SWENSEN_WEIGHTS: &[(&str, f64)] = &[
    ("VTI", 0.30),
    ("VXUS", 0.15),
    ("VNQ", 0.20),
    ("TLT", 0.15),
    ("TIP", 0.15),
    ("IAU", 0.05),
];

const MODEL_NAMES: &[(&str, &str)] = &[
    (ALL_WEATHER, "All Weather (Ray Dalio)"),
    (SWENSEN, "Swensen (Lazy Princeton)"),
    (HYBRID, "Hybrid 50"),
];

/// Equal-weight blend of `models`, re-normalized so it sums to one.
pub fn blend(models: &[&WeightMap]) -> WeightMap {
    if models.is_empty() {
        return WeightMap::new();
    }
    let share = 1.0 / models.len() as f64;
    let mut acc: BTreeMap<String, f64> = BTreeMap::new();
    for model in models {
        for (ticker, weight) in model.iter() {
            *acc.entry(ticker.to_string()).or_insert(0.0) += weight * share;
        }
    }
    let total: f64 = acc.values().sum();
    if total <= 0.0 {
        return WeightMap::new();
    }
    acc.into_iter().map(|(t, w)| (t, w / total)).collect()
}

/// Immutable reference tables shared by every request.
#[derive(Clone, Debug)]
pub struct ReferenceData {
    taxonomy: FxHashMap<String, AssetClass>,
    expected_returns: FxHashMap<AssetClass, f64>,
    models: BTreeMap<String, WeightMap>,
    model_names: FxHashMap<String, String>,
}

impl ReferenceData {
    /// Build the standard tables, including the derived hybrid model.
    pub fn standard() -> Self {
        let taxonomy = TAXONOMY
            .iter()
            .map(|&(t, c)| (t.to_string(), c))
            .collect();
        let expected_returns = EXPECTED_RETURNS.iter().copied().collect();

        let all_weather: WeightMap = ALL_WEATHER_WEIGHTS.iter().copied().collect();
        let swensen: WeightMap = SWENSEN_WEIGHTS.iter().copied().collect();
        let hybrid = blend(&[&all_weather, &swensen]);

        let mut models = BTreeMap::new();
        models.insert(ALL_WEATHER.to_string(), all_weather);
        models.insert(SWENSEN.to_string(), swensen);
        models.insert(HYBRID.to_string(), hybrid);

        let model_names = MODEL_NAMES
            .iter()
            .map(|&(k, n)| (k.to_string(), n.to_string()))
            .collect();

        Self {
            taxonomy,
            expected_returns,
            models,
            model_names,
        }
    }

    /// Build custom tables. Used by tests and by callers with their own model set.
    pub fn new(
        taxonomy: FxHashMap<String, AssetClass>,
        expected_returns: FxHashMap<AssetClass, f64>,
        models: BTreeMap<String, WeightMap>,
        model_names: FxHashMap<String, String>,
    ) -> Self {
        let taxonomy = taxonomy
            .into_iter()
            .map(|(t, c)| (normalize_ticker(&t), c))
            .collect();
        Self {
            taxonomy,
            expected_returns,
            models,
            model_names,
        }
    }

    /// Asset class for a ticker; unknown tickers classify as `Other`.
    pub fn classify(&self, ticker: &str) -> AssetClass {
        self.taxonomy
            .get(&normalize_ticker(ticker))
            .copied()
            .unwrap_or(AssetClass::Other)
    }

    /// Annualized expected return for a class, falling back to the `Other` entry.
    pub fn expected_return(&self, class: AssetClass) -> f64 {
        self.expected_returns
            .get(&class)
            .or_else(|| self.expected_returns.get(&AssetClass::Other))
            .copied()
            .unwrap_or(0.0)
    }

    /// All models, ordered by key.
    pub fn models(&self) -> &BTreeMap<String, WeightMap> {
        &self.models
    }

    pub fn model(&self, key: &str) -> Option<&WeightMap> {
        self.models.get(key)
    }

    /// Display name for a model key; unknown keys are title-cased.
    pub fn model_name(&self, key: &str) -> String {
        match self.model_names.get(key) {
            Some(name) => name.clone(),
            None => title_case(key),
        }
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::standard()
    }
}

fn title_case(key: &str) -> String {
    key.split(['_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
