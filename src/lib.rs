//! # portfolio-pulse
//!
//! A deterministic engine that scores an investment portfolio against a set of
//! reference model portfolios and suggests trades toward the closest one.
//!
//! ## Pipeline
//!
//! 1. **Normalize** raw holdings (amounts or weights) into a [`WeightMap`]
//!    summing to one.
//! 2. **Score** the weights: diversification, resilience, return efficiency
//!    and risk balance, combined into a 0–100 composite with a [`Grade`].
//! 3. **Compare** against every reference model by tracking error (half the
//!    L1 distance).
//! 4. **Rebalance** toward the closest model, skipping deltas inside the
//!    0.5% dead zone.
//!
//! ## Quick Start
//!
//! ```
//! use portfolio_pulse::{ReferenceData, normalize, score, tracking_error};
//! use portfolio_pulse::rebalance::{generate_plan, select_target_model};
//!
//! let reference = ReferenceData::standard();
//! let weights = normalize([("VTI", 50.0), ("TLT", 50.0)]).unwrap();
//!
//! let pulse = score(&weights, &reference);
//! assert!(pulse.composite >= 0.0 && pulse.composite <= 100.0);
//!
//! let table = tracking_error(&weights, &reference);
//! assert_eq!(table["all_weather"], 0.30);
//!
//! let target = select_target_model(&table).unwrap();
//! let plan = generate_plan(&weights, target, 100.0, &reference).unwrap();
//! assert_eq!(plan.target_model, "all_weather");
//! assert!(plan.adjustments.iter().all(|a| a.weight_diff.abs() >= 0.005));
//! ```
//!
//! ## Collaborators
//!
//! The engine itself does no I/O. Storage, authentication and price history
//! are traits ([`PortfolioStore`], [`Authenticator`], [`PriceSource`]) wired
//! together by [`PulseService`]:
//!
//! ```
//! use std::sync::Arc;
//! use portfolio_pulse::{
//!     Holding, InMemoryPortfolioStore, NoPriceData, PulseService, PulseSettings,
//!     ReferenceData, UserId,
//! };
//!
//! let service = PulseService::new(
//!     Arc::new(ReferenceData::standard()),
//!     PulseSettings::default(),
//!     InMemoryPortfolioStore::new(),
//!     NoPriceData,
//! );
//! let user = UserId::new("alice");
//! service.upload(&user, &[Holding::with_amount("AAPL", 60.0), Holding::with_amount("TLT", 40.0)]).unwrap();
//! let report = service.rebalance_suggestions(&user).unwrap();
//! assert!(!report.adjustments.is_empty());
//! ```

pub mod auth;
pub mod comparison;
pub mod distribution;
mod error;
pub mod market_data;
pub mod normalize;
pub mod rebalance;
pub mod reference;
pub mod scoring;
pub mod service;
mod settings;
pub mod store;
#[cfg(feature = "parallel")]
pub mod sweep;
mod types;

// Re-export public API
pub use auth::{Authenticator, TokenAuthenticator};
pub use comparison::{TrackingErrorTable, tracking_error};
pub use distribution::Distribution;
pub use error::{Error, Result};
pub use market_data::{NoPriceData, Performance, PriceSource};
pub use normalize::{NormalizedPortfolio, normalize, normalize_holdings};
pub use rebalance::{Action, RebalanceAdjustment, RebalancePlan};
pub use reference::{AssetClass, ReferenceData};
pub use scoring::{Grade, PulseScore, ScoreBreakdown, score};
pub use service::PulseService;
pub use settings::PulseSettings;
pub use store::{InMemoryPortfolioStore, PortfolioStore};
pub use types::{
    DEFAULT_PORTFOLIO_VALUE, Holding, UserId, WEIGHT_TOLERANCE, WeightMap, clamp,
    normalize_ticker, round_to,
};
