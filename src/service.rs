//! Request pipeline: upload → score / compare / rebalance.
//!
//! [`PulseService`] ties the engine to its collaborators. Each method is one
//! user-facing request; read requests fail with [`Error::NotFound`] until the
//! user has uploaded a portfolio.

use std::sync::Arc;

use log::info;

use crate::comparison::{self, TrackingErrorTable};
use crate::error::{Error, Result};
use crate::market_data::{self, PriceSource};
use crate::normalize;
use crate::rebalance::{self, RebalanceAdjustment};
use crate::reference::{AssetClass, ReferenceData};
use crate::scoring::{self, Grade, ScoreBreakdown};
use crate::settings::PulseSettings;
use crate::store::PortfolioStore;
use crate::types::{Holding, UserId, WeightMap, round_to};

/// Result of an upload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UploadReport {
    pub user_id: UserId,
    /// Normalized `(ticker, weight)` pairs in ticker order.
    pub holdings: Vec<(String, f64)>,
    pub total_value: f64,
}

/// One slice of the diversification chart.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistributionSlice {
    pub label: AssetClass,
    /// Weight rounded to four decimals.
    pub weight: f64,
}

/// Score request output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreReport {
    pub pulse_score: f64,
    pub grade: Grade,
    pub breakdown: ScoreBreakdown,
    pub expected_return: f64,
    pub diversification_chart: Vec<DistributionSlice>,
    pub top_suggestions: Vec<String>,
}

/// Historical performance and distance for one model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelPerformance {
    pub model_key: String,
    pub model_name: String,
    pub expected_return: f64,
    pub volatility: f64,
    pub tracking_error: f64,
}

/// Model comparison request output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelComparison {
    pub user_expected_return: f64,
    pub user_volatility: f64,
    /// Ordered by model key.
    pub models: Vec<ModelPerformance>,
}

/// Rebalance request output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceReport {
    pub target_model_key: String,
    /// Display name of the target model.
    pub target_model: String,
    pub target_weights: WeightMap,
    pub adjustments: Vec<RebalanceAdjustment>,
}

/// The scoring service over an injected store and price source.
pub struct PulseService<S, P> {
    reference: Arc<ReferenceData>,
    settings: PulseSettings,
    store: S,
    prices: P,
}

impl<S: PortfolioStore, P: PriceSource> PulseService<S, P> {
    pub fn new(reference: Arc<ReferenceData>, settings: PulseSettings, store: S, prices: P) -> Self {
        Self {
            reference,
            settings,
            store,
            prices,
        }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn settings(&self) -> &PulseSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Normalize holdings and store them as the user's current portfolio.
    pub fn upload(&self, user: &UserId, holdings: &[Holding]) -> Result<UploadReport> {
        let normalized = normalize::normalize_holdings_with(holdings, self.settings.starting_value)?;
        let report = UploadReport {
            user_id: user.clone(),
            holdings: normalized
                .weights
                .iter()
                .map(|(t, w)| (t.to_string(), w))
                .collect(),
            total_value: normalized.total_value,
        };
        self.store
            .set(user, normalized.weights, normalized.total_value)?;
        info!(
            "stored portfolio for {user}: {} holdings, value {:.2}",
            report.holdings.len(),
            report.total_value
        );
        Ok(report)
    }

    /// Score the user's stored portfolio.
    pub fn score(&self, user: &UserId) -> Result<ScoreReport> {
        let weights = self.store.get(user)?;
        let s = scoring::score(&weights, &self.reference);
        Ok(ScoreReport {
            pulse_score: s.composite,
            grade: s.grade,
            breakdown: s.breakdown,
            expected_return: s.expected_return,
            diversification_chart: s
                .distribution
                .iter()
                .map(|(label, w)| DistributionSlice {
                    label,
                    weight: round_to(w, 4),
                })
                .collect(),
            top_suggestions: s.suggestions,
        })
    }

    /// Tracking error of the user's portfolio against every model.
    pub fn tracking_error(&self, user: &UserId) -> Result<TrackingErrorTable> {
        let weights = self.store.get(user)?;
        Ok(comparison::tracking_error(&weights, &self.reference))
    }

    /// Compare the user's portfolio with every model on return, volatility
    /// and tracking error.
    pub fn compare_models(&self, user: &UserId) -> Result<ModelComparison> {
        let weights = self.store.get(user)?;
        let user_perf = market_data::expected_performance(&weights, &self.prices, &self.settings);
        let tracking = comparison::tracking_error(&weights, &self.reference);

        let models = self
            .reference
            .models()
            .iter()
            .map(|(key, model)| {
                let perf = market_data::expected_performance(model, &self.prices, &self.settings);
                ModelPerformance {
                    model_key: key.clone(),
                    model_name: self.reference.model_name(key),
                    expected_return: round_to(perf.expected_return, 4),
                    volatility: round_to(perf.volatility, 4),
                    tracking_error: tracking.get(key).copied().unwrap_or(1.0),
                }
            })
            .collect();

        Ok(ModelComparison {
            user_expected_return: round_to(user_perf.expected_return, 4),
            user_volatility: round_to(user_perf.volatility, 4),
            models,
        })
    }

    /// Trades that move the user's portfolio onto the closest model.
    pub fn rebalance_suggestions(&self, user: &UserId) -> Result<RebalanceReport> {
        let weights = self.store.get(user)?;
        let tracking = comparison::tracking_error(&weights, &self.reference);
        let key = rebalance::select_target_model(&tracking)
            .ok_or_else(|| Error::NotFound("no reference models configured".into()))?;
        let value = self.store.get_total_value(user);
        let plan = rebalance::generate_plan(&weights, key, value, &self.reference)?;
        Ok(RebalanceReport {
            target_model: self.reference.model_name(&plan.target_model),
            target_model_key: plan.target_model,
            target_weights: plan.target_weights,
            adjustments: plan.adjustments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::NoPriceData;
    use crate::reference::ALL_WEATHER;
    use crate::store::InMemoryPortfolioStore;

    fn service() -> PulseService<InMemoryPortfolioStore, NoPriceData> {
        PulseService::new(
            Arc::new(ReferenceData::standard()),
            PulseSettings::default(),
            InMemoryPortfolioStore::new(),
            NoPriceData,
        )
    }

    #[test]
    fn reads_before_upload_are_not_found() {
        let svc = service();
        let user = UserId::new("u");
        assert!(matches!(svc.score(&user), Err(Error::NotFound(_))));
        assert!(matches!(svc.compare_models(&user), Err(Error::NotFound(_))));
        assert!(matches!(svc.rebalance_suggestions(&user), Err(Error::NotFound(_))));
    }

    #[test]
    fn upload_by_amount() {
        let svc = service();
        let user = UserId::new("u");
        let report = svc
            .upload(&user, &[Holding::with_amount("aapl", 60.0), Holding::with_amount("tlt", 40.0)])
            .unwrap();
        assert_eq!(report.total_value, 100.0);
        assert_eq!(report.holdings[0].0, "AAPL");
        assert!((report.holdings[0].1 - 0.6).abs() < 1e-12);
    }

    #[test]
    fn invalid_upload_stores_nothing() {
        let svc = service();
        let user = UserId::new("u");
        assert!(svc.upload(&user, &[Holding::with_amount("VTI", 0.0)]).is_err());
        assert!(!svc.store().contains(&user));
    }

    #[test]
    fn score_report_chart() {
        let svc = service();
        let user = UserId::new("u");
        svc.upload(&user, &[Holding::with_weight("VTI", 1.0)]).unwrap();
        let report = svc.score(&user).unwrap();
        assert_eq!(report.pulse_score, 22.67);
        assert_eq!(report.diversification_chart.len(), 1);
        assert_eq!(report.diversification_chart[0].label, AssetClass::Equities);
        assert_eq!(report.top_suggestions.len(), 3);
    }

    #[test]
    fn compare_uses_fallbacks_without_data() {
        let svc = service();
        let user = UserId::new("u");
        svc.upload(&user, &[Holding::with_weight("VTI", 0.5), Holding::with_weight("TLT", 0.5)])
            .unwrap();
        let cmp = svc.compare_models(&user).unwrap();
        assert_eq!(cmp.user_expected_return, 0.04);
        assert_eq!(cmp.models.len(), 3);
        let aw = &cmp.models[0];
        assert_eq!(aw.model_key, ALL_WEATHER);
        assert_eq!(aw.model_name, "All Weather (Ray Dalio)");
        assert_eq!(aw.tracking_error, 0.30);
    }

    #[test]
    fn rebalance_uses_stored_value() {
        let svc = service();
        let user = UserId::new("u");
        svc.upload(&user, &[Holding::with_amount("VTI", 500.0), Holding::with_amount("TLT", 500.0)])
            .unwrap();
        let report = svc.rebalance_suggestions(&user).unwrap();
        assert_eq!(report.target_model_key, ALL_WEATHER);
        assert_eq!(report.target_model, "All Weather (Ray Dalio)");
        let vti = report.adjustments.iter().find(|a| a.ticker == "VTI").unwrap();
        assert_eq!(vti.notional_change, -200.0);
    }
}
