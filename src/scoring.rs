//! Pulse score: four capped sub-scores, a composite, a grade, and suggestions.
//!
//! | Sub-score          | Max | Measures                                          |
//! |--------------------|-----|---------------------------------------------------|
//! | Diversification    | 30  | spread across asset classes, 20% cap per class     |
//! | Resilience         | 30  | bond buffer plus half-credit for gold/commodities |
//! | Return efficiency  | 20  | expected return between 2% and 8%                 |
//! | Risk balance       | 20  | closeness to a 45/35/20 equity/defensive/diversifier split |
//!
//! Each sub-score is rounded to two decimals when emitted, and the composite
//! is the rounded sum, so it always lies in `[0, 100]`.

use std::fmt;

use crate::distribution::Distribution;
use crate::reference::{AssetClass, ReferenceData};
use crate::types::{WeightMap, clamp, round_to};

pub const MAX_DIVERSIFICATION_SCORE: f64 = 30.0;
pub const MAX_RESILIENCE_SCORE: f64 = 30.0;
pub const MAX_RETURN_EFFICIENCY_SCORE: f64 = 20.0;
pub const MAX_RISK_BALANCE_SCORE: f64 = 20.0;

/// Per-class weight beyond which diversification earns nothing extra.
const CLASS_CAP: f64 = 0.20;

const BOND_TICKERS: &[&str] = &["TLT", "IEF", "BND", "TIP"];
const GOLD_TICKERS: &[&str] = &["IAU", "GLD"];
const COMMODITY_TICKERS: &[&str] = &["DBC", "GSG"];
/// Buffer weight that earns full resilience credit.
const RESILIENCE_TARGET: f64 = 0.6;

const RETURN_FLOOR: f64 = 0.02;
const RETURN_SPAN: f64 = 0.06;

const EQUITY_TARGET: f64 = 0.45;
const DEFENSIVE_TARGET: f64 = 0.35;
const DIVERSIFIER_TARGET: f64 = 0.20;

const EQUITY_CLASSES: &[AssetClass] = &[AssetClass::Equities, AssetClass::InternationalEquities];
const DEFENSIVE_CLASSES: &[AssetClass] = &[
    AssetClass::LongBonds,
    AssetClass::IntermediateBonds,
    AssetClass::CoreBonds,
    AssetClass::InflationBonds,
];
const DIVERSIFIER_CLASSES: &[AssetClass] = &[
    AssetClass::Gold,
    AssetClass::Commodities,
    AssetClass::RealEstate,
];

const CONCENTRATION_LIMIT: f64 = 0.35;
const MIN_BOND_WEIGHT: f64 = 0.25;
const MIN_HEDGE_WEIGHT: f64 = 0.10;

pub const ADD_BONDS: &str = "Add more bonds to improve drawdown resilience.";
pub const ADD_HEDGE: &str = "Introduce gold or commodities as an inflation hedge.";
pub const BALANCED: &str =
    "Portfolio is balanced relative to the model set. Maintain current allocations.";

/// Qualitative tier of a composite score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Grade {
    High,
    Medium,
    Low,
}

impl Grade {
    /// Tier for a composite score: High ≥ 80, Medium ≥ 60, otherwise Low.
    pub fn from_score(composite: f64) -> Self {
        if composite >= 80.0 {
            Grade::High
        } else if composite >= 60.0 {
            Grade::Medium
        } else {
            Grade::Low
        }
    }

    /// Traffic-light symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Grade::High => "🟢",
            Grade::Medium => "🟡",
            Grade::Low => "🔴",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// The four sub-scores.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreBreakdown {
    pub diversification: f64,
    pub resilience: f64,
    pub return_efficiency: f64,
    pub risk_balance: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.diversification + self.resilience + self.return_efficiency + self.risk_balance
    }
}

/// Full output of [`score`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PulseScore {
    /// Composite score in `[0, 100]`, rounded to two decimals.
    pub composite: f64,
    pub breakdown: ScoreBreakdown,
    /// Blended expected return from the class table, rounded to four decimals.
    pub expected_return: f64,
    pub suggestions: Vec<String>,
    pub grade: Grade,
    pub distribution: Distribution,
}

/// Reward spread across classes, capping each class's contribution at 20%.
pub fn diversification_score(distribution: &Distribution) -> f64 {
    let evenness: f64 = distribution.iter().map(|(_, w)| w.min(CLASS_CAP)).sum();
    let normalized = evenness.min(1.0);
    round_to(normalized * MAX_DIVERSIFICATION_SCORE, 2)
}

/// Bonds count in full, gold and commodities at half weight.
pub fn resilience_score(weights: &WeightMap) -> f64 {
    let bonds = weights.sum_of(BOND_TICKERS);
    let gold = weights.sum_of(GOLD_TICKERS);
    let commodities = weights.sum_of(COMMODITY_TICKERS);
    let buffer = bonds + 0.5 * (gold + commodities);
    let normalized = clamp(buffer / RESILIENCE_TARGET, 0.0, 1.0);
    round_to(normalized * MAX_RESILIENCE_SCORE, 2)
}

/// Returns `(score, expected_return)`; the return is rounded to four decimals.
pub fn return_efficiency_score(
    distribution: &Distribution,
    reference: &ReferenceData,
) -> (f64, f64) {
    let expected_return: f64 = distribution
        .iter()
        .map(|(class, w)| w * reference.expected_return(class))
        .sum();
    let normalized = clamp((expected_return - RETURN_FLOOR) / RETURN_SPAN, 0.0, 1.0);
    (
        round_to(normalized * MAX_RETURN_EFFICIENCY_SCORE, 2),
        round_to(expected_return, 4),
    )
}

/// Penalize the L1 gap from a 45/35/20 equity/defensive/diversifier split.
pub fn risk_balance_score(distribution: &Distribution) -> f64 {
    let equities = distribution.sum_of(EQUITY_CLASSES);
    let defensive = distribution.sum_of(DEFENSIVE_CLASSES);
    let diversifiers = distribution.sum_of(DIVERSIFIER_CLASSES);
    let gap = (equities - EQUITY_TARGET).abs()
        + (defensive - DEFENSIVE_TARGET).abs()
        + (diversifiers - DIVERSIFIER_TARGET).abs();
    let normalized = clamp(1.0 - gap, 0.0, 1.0);
    round_to(normalized * MAX_RISK_BALANCE_SCORE, 2)
}

/// Improvement ideas. Every matching rule fires, in order.
///
/// An empty mapping has nothing to improve on and yields only the balanced
/// message.
pub fn suggestions(weights: &WeightMap, distribution: &Distribution) -> Vec<String> {
    if weights.is_empty() {
        return vec![BALANCED.to_string()];
    }

    let mut ideas = Vec::new();
    if let Some((ticker, weight)) = weights.largest() {
        if weight > CONCENTRATION_LIMIT {
            ideas.push(format!("Reduce concentration in {ticker} to below 30%."));
        }
    }
    if distribution.sum_of(&[AssetClass::LongBonds, AssetClass::IntermediateBonds])
        < MIN_BOND_WEIGHT
    {
        ideas.push(ADD_BONDS.to_string());
    }
    if distribution.sum_of(&[AssetClass::Gold, AssetClass::Commodities]) < MIN_HEDGE_WEIGHT {
        ideas.push(ADD_HEDGE.to_string());
    }
    if ideas.is_empty() {
        ideas.push(BALANCED.to_string());
    }
    ideas
}

/// Score a weight mapping against the reference tables.
pub fn score(weights: &WeightMap, reference: &ReferenceData) -> PulseScore {
    let distribution = Distribution::build(weights, reference);
    let (return_efficiency, expected_return) = return_efficiency_score(&distribution, reference);
    let breakdown = ScoreBreakdown {
        diversification: diversification_score(&distribution),
        resilience: resilience_score(weights),
        return_efficiency,
        risk_balance: risk_balance_score(&distribution),
    };
    let composite = round_to(breakdown.total(), 2);

    PulseScore {
        composite,
        breakdown,
        expected_return,
        suggestions: suggestions(weights, &distribution),
        grade: Grade::from_score(composite),
        distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceData {
        ReferenceData::standard()
    }

    fn weights(pairs: &[(&str, f64)]) -> WeightMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn single_equity_holding() {
        let s = score(&weights(&[("VTI", 1.0)]), &reference());
        assert_eq!(s.breakdown.diversification, 6.0);
        assert_eq!(s.breakdown.resilience, 0.0);
        assert_eq!(s.breakdown.return_efficiency, 16.67);
        assert_eq!(s.breakdown.risk_balance, 0.0);
        assert_eq!(s.composite, 22.67);
        assert_eq!(s.expected_return, 0.07);
        assert_eq!(s.grade, Grade::Low);
        assert_eq!(
            s.suggestions,
            vec![
                "Reduce concentration in VTI to below 30%.".to_string(),
                ADD_BONDS.to_string(),
                ADD_HEDGE.to_string(),
            ]
        );
    }

    #[test]
    fn all_weather_scores() {
        let reference = reference();
        let model = reference.model(crate::reference::ALL_WEATHER).unwrap().clone();
        let s = score(&model, &reference);
        // Classes: Equities .30, Long .40, Intermediate .15, Gold .075, Commodities .075
        assert_eq!(s.breakdown.diversification, 21.0);
        // bonds .55 + .5 * .15 = .625 → capped
        assert_eq!(s.breakdown.resilience, 30.0);
        // er = .021 + .014 + .0045 + .001875 + .00225 = .043625
        assert_eq!(s.expected_return, 0.0436);
        assert!((s.breakdown.return_efficiency - 7.88).abs() <= 0.01);
        // gap = .15 + .20 + .05 = .40
        assert_eq!(s.breakdown.risk_balance, 12.0);
        assert!((s.composite - 70.88).abs() <= 0.01);
        assert_eq!(s.grade, Grade::Medium);
        // Largest holding is TLT at 40%
        assert_eq!(s.suggestions, vec!["Reduce concentration in TLT to below 30%.".to_string()]);
    }

    #[test]
    fn balanced_portfolio() {
        let w = weights(&[
            ("VTI", 0.25),
            ("VXUS", 0.20),
            ("TLT", 0.15),
            ("IEF", 0.15),
            ("BND", 0.05),
            ("IAU", 0.10),
            ("VNQ", 0.10),
        ]);
        let s = score(&w, &reference());
        assert_eq!(s.suggestions, vec![BALANCED.to_string()]);
        // equities .45, defensive .35, diversifiers .20 → no gap
        assert_eq!(s.breakdown.risk_balance, 20.0);
        assert_eq!(s.breakdown.diversification, 28.5);
        assert_eq!(s.grade, Grade::Medium);
    }

    #[test]
    fn empty_weights_score_zero() {
        let s = score(&WeightMap::new(), &reference());
        assert_eq!(s.breakdown, ScoreBreakdown::default());
        assert_eq!(s.composite, 0.0);
        assert_eq!(s.expected_return, 0.0);
        assert_eq!(s.suggestions, vec![BALANCED.to_string()]);
        assert_eq!(s.grade, Grade::Low);
    }

    #[test]
    fn concentration_uses_largest_holding() {
        let w = weights(&[("AAPL", 0.4), ("MSFT", 0.4), ("TLT", 0.2)]);
        let ideas = suggestions(&w, &Distribution::build(&w, &reference()));
        assert_eq!(ideas[0], "Reduce concentration in AAPL to below 30%.");
    }

    #[test]
    fn resilience_half_credit_for_hedges() {
        let w = weights(&[("VTI", 0.4), ("GLD", 0.3), ("DBC", 0.3)]);
        // buffer = .5 * .6 = .3 → .3/.6 = .5 → 15
        assert_eq!(resilience_score(&w), 15.0);
    }

    #[test]
    fn unknown_tickers_use_other_return() {
        let reference = reference();
        let w = weights(&[("NVDA", 1.0)]);
        let d = Distribution::build(&w, &reference);
        let (score, er) = return_efficiency_score(&d, &reference);
        assert_eq!(er, 0.04);
        assert_eq!(score, 6.67);
    }

    #[test]
    fn grade_thresholds() {
        assert_eq!(Grade::from_score(80.0), Grade::High);
        assert_eq!(Grade::from_score(79.99), Grade::Medium);
        assert_eq!(Grade::from_score(60.0), Grade::Medium);
        assert_eq!(Grade::from_score(59.99), Grade::Low);
        assert_eq!(Grade::High.to_string(), "🟢");
    }
}
