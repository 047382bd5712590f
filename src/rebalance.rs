//! Rebalance planning toward the closest reference model.
//!
//! Picks the reference model closest to the user's weights and computes the
//! weight deltas needed to reach it. Deltas inside the dead zone are dropped
//! so the plan never suggests noise-level trades.

use std::fmt;

use log::debug;

use crate::comparison::TrackingErrorTable;
use crate::error::{Error, Result};
use crate::reference::ReferenceData;
use crate::types::{WeightMap, round_to};

/// Smallest absolute weight delta that produces an adjustment.
pub const DEAD_ZONE: f64 = 0.005;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Action {
    Buy,
    Sell,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "buy"),
            Action::Sell => write!(f, "sell"),
        }
    }
}

/// One suggested trade.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceAdjustment {
    pub ticker: String,
    pub action: Action,
    /// Signed target − current weight, rounded to four decimals.
    pub weight_diff: f64,
    /// Signed `weight_diff × portfolio_value`, rounded to two decimals.
    pub notional_change: f64,
}

/// Target model plus the adjustments that reach it, ordered by ticker.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalancePlan {
    pub target_model: String,
    pub target_weights: WeightMap,
    pub adjustments: Vec<RebalanceAdjustment>,
}

impl RebalancePlan {
    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty()
    }

    /// Net notional across all adjustments (buys minus sells).
    pub fn net_notional(&self) -> f64 {
        self.adjustments.iter().map(|a| a.notional_change).sum()
    }
}

/// Model with the smallest tracking error.
///
/// The table is ordered by key, so ties resolve to the lexically first model.
/// Returns `None` for an empty table.
pub fn select_target_model(table: &TrackingErrorTable) -> Option<&str> {
    let mut best: Option<(&str, f64)> = None;
    for (key, &te) in table {
        match best {
            Some((_, b)) if te >= b => {}
            _ => best = Some((key.as_str(), te)),
        }
    }
    best.map(|(key, _)| key)
}

/// Compute the adjustments that move `user` onto `target`.
///
/// Every ticker in the union is visited in lexical order. Deltas are rounded
/// to four decimals before the dead-zone check.
pub fn plan_against(
    user: &WeightMap,
    target: &WeightMap,
    portfolio_value: f64,
) -> Vec<RebalanceAdjustment> {
    let mut adjustments = Vec::new();
    for ticker in user.union_tickers(target) {
        let diff = round_to(target.get(ticker) - user.get(ticker), 4);
        if diff.abs() < DEAD_ZONE {
            continue;
        }
        let action = if diff > 0.0 { Action::Buy } else { Action::Sell };
        adjustments.push(RebalanceAdjustment {
            ticker: ticker.to_string(),
            action,
            weight_diff: diff,
            notional_change: round_to(diff * portfolio_value, 2),
        });
    }
    adjustments
}

/// Build the rebalance plan toward a named reference model.
///
/// Fails with [`Error::NotFound`] when `target_model_key` is not a known model.
pub fn generate_plan(
    user: &WeightMap,
    target_model_key: &str,
    portfolio_value: f64,
    reference: &ReferenceData,
) -> Result<RebalancePlan> {
    let target = reference
        .model(target_model_key)
        .ok_or_else(|| Error::NotFound(format!("model {target_model_key}")))?;
    let adjustments = plan_against(user, target, portfolio_value);
    debug!(
        "plan toward {target_model_key}: {} adjustments on value {portfolio_value:.2}",
        adjustments.len()
    );
    Ok(RebalancePlan {
        target_model: target_model_key.to_string(),
        target_weights: target.clone(),
        adjustments,
    })
}

/// Apply a plan's adjustments to `user`, returning the resulting weights.
///
/// Tickers without an adjustment keep their current weight.
pub fn apply(user: &WeightMap, plan: &RebalancePlan) -> WeightMap {
    let mut next = user.clone();
    for adj in &plan.adjustments {
        let current = next.get(&adj.ticker);
        next.insert(&adj.ticker, current + adj.weight_diff);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::tracking_error;
    use crate::reference::{ALL_WEATHER, HYBRID, SWENSEN};

    fn weights(pairs: &[(&str, f64)]) -> WeightMap {
        pairs.iter().copied().collect()
    }

    #[test]
    fn select_minimum() {
        let mut table = TrackingErrorTable::new();
        table.insert(SWENSEN.into(), 0.45);
        table.insert(ALL_WEATHER.into(), 0.30);
        table.insert(HYBRID.into(), 0.33);
        assert_eq!(select_target_model(&table), Some(ALL_WEATHER));
    }

    #[test]
    fn select_tie_goes_to_lexically_first() {
        let mut table = TrackingErrorTable::new();
        table.insert(SWENSEN.into(), 0.2);
        table.insert(HYBRID.into(), 0.2);
        assert_eq!(select_target_model(&table), Some(HYBRID));
        assert_eq!(select_target_model(&TrackingErrorTable::new()), None);
    }

    #[test]
    fn plan_toward_all_weather() {
        let reference = ReferenceData::standard();
        let user = weights(&[("VTI", 0.5), ("TLT", 0.5)]);
        let plan = generate_plan(&user, ALL_WEATHER, 1000.0, &reference).unwrap();

        let tickers: Vec<_> = plan.adjustments.iter().map(|a| a.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["DBC", "IAU", "IEF", "TLT", "VTI"]);

        let vti = &plan.adjustments[4];
        assert_eq!(vti.action, Action::Sell);
        assert_eq!(vti.weight_diff, -0.2);
        assert_eq!(vti.notional_change, -200.0);

        let ief = &plan.adjustments[2];
        assert_eq!(ief.action, Action::Buy);
        assert_eq!(ief.weight_diff, 0.15);
        assert_eq!(ief.notional_change, 150.0);

        // Fully invested on both sides, so buys and sells cancel.
        assert!(plan.net_notional().abs() < 1e-9);
    }

    #[test]
    fn dead_zone_skips_small_deltas() {
        let target = weights(&[("VTI", 0.6), ("TLT", 0.4)]);
        let user = weights(&[("VTI", 0.597), ("TLT", 0.403)]);
        assert!(plan_against(&user, &target, 100.0).is_empty());

        let user = weights(&[("VTI", 0.595), ("TLT", 0.405)]);
        let adj = plan_against(&user, &target, 100.0);
        assert_eq!(adj.len(), 2);
        assert_eq!(adj[0].ticker, "TLT");
        assert_eq!(adj[0].weight_diff, -0.005);
        assert_eq!(adj[0].notional_change, -0.5);
    }

    #[test]
    fn unknown_model_is_not_found() {
        let reference = ReferenceData::standard();
        let err = generate_plan(&WeightMap::new(), "permanent", 100.0, &reference).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn closest_model_end_to_end() {
        let reference = ReferenceData::standard();
        let model = reference.model(SWENSEN).unwrap().clone();
        let table = tracking_error(&model, &reference);
        let key = select_target_model(&table).unwrap();
        assert_eq!(key, SWENSEN);
        let plan = generate_plan(&model, key, 100.0, &reference).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn apply_reaches_target() {
        let reference = ReferenceData::standard();
        let user = weights(&[("VTI", 0.5), ("TLT", 0.5)]);
        let plan = generate_plan(&user, ALL_WEATHER, 100.0, &reference).unwrap();
        let after = apply(&user, &plan);
        for (ticker, w) in plan.target_weights.iter() {
            assert!((after.get(ticker) - w).abs() < 1e-9, "{ticker}");
        }
    }
}
