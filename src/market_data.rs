//! Expected return and volatility from historical prices.
//!
//! Per-ticker statistics come from a [`PriceSource`]. A ticker whose history
//! cannot be loaded is priced with the fallback constants from
//! [`PulseSettings`] instead of failing the whole aggregate.
//!
//! Volatilities are combined as variances under an independence assumption:
//! `σ² = Σ wᵢ² σᵢ²`.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::NaiveDate;
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::settings::PulseSettings;
use crate::types::WeightMap;

/// Trading days per year used to annualize daily volatility.
pub const TRADING_DAYS: f64 = 252.0;

/// Number of histories [`CachedPriceSource`] keeps.
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// One closing price.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Chronologically ordered closing prices.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceHistory {
    points: Vec<PricePoint>,
}

impl PriceHistory {
    /// Build from points in any order. Non-finite or non-positive closes are dropped.
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.retain(|p| p.close.is_finite() && p.close > 0.0);
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Keep only points within `years` of the last date.
    pub fn trailing(&self, years: u32) -> Self {
        let Some(last) = self.points.last() else {
            return self.clone();
        };
        let cutoff = last.date - chrono::Duration::days(365 * i64::from(years));
        Self {
            points: self
                .points
                .iter()
                .copied()
                .filter(|p| p.date >= cutoff)
                .collect(),
        }
    }

    /// Simple day-over-day returns.
    pub fn daily_returns(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .map(|w| w[1].close / w[0].close - 1.0)
            .collect()
    }
}

/// Annualized return and volatility.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Performance {
    pub expected_return: f64,
    pub volatility: f64,
}

/// Source of historical prices.
pub trait PriceSource {
    /// Closing prices for `ticker` covering roughly `lookback_years`.
    ///
    /// Failures should be reported as [`Error::DataUnavailable`].
    fn price_history(&self, ticker: &str, lookback_years: u32) -> Result<PriceHistory>;
}

impl<P: PriceSource + ?Sized> PriceSource for &P {
    fn price_history(&self, ticker: &str, lookback_years: u32) -> Result<PriceHistory> {
        (**self).price_history(ticker, lookback_years)
    }
}

impl<P: PriceSource + ?Sized> PriceSource for Box<P> {
    fn price_history(&self, ticker: &str, lookback_years: u32) -> Result<PriceHistory> {
        (**self).price_history(ticker, lookback_years)
    }
}

/// A source that never has data. Every ticker falls back to the constants.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPriceData;

impl PriceSource for NoPriceData {
    fn price_history(&self, ticker: &str, _lookback_years: u32) -> Result<PriceHistory> {
        Err(Error::DataUnavailable {
            ticker: ticker.to_string(),
            reason: "no price source configured".into(),
        })
    }
}

/// Compound annual growth between the first and last close.
///
/// Elapsed years are calendar days / 365. Returns 0.0 when the history spans
/// no time.
pub fn annualized_return(history: &PriceHistory) -> f64 {
    let (Some(first), Some(last)) = (history.points.first(), history.points.last()) else {
        return 0.0;
    };
    let years = (last.date - first.date).num_days() as f64 / 365.0;
    if years <= 0.0 {
        return 0.0;
    }
    (last.close / first.close).powf(1.0 / years) - 1.0
}

/// Sample standard deviation of daily returns, scaled by √252.
///
/// Returns 0.0 with fewer than two daily returns.
pub fn annualized_volatility(history: &PriceHistory) -> f64 {
    let returns = history.daily_returns();
    let n = returns.len();
    if n < 2 {
        return 0.0;
    }
    let mean = returns.iter().sum::<f64>() / n as f64;
    let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt() * TRADING_DAYS.sqrt()
}

fn ticker_stats<P: PriceSource>(
    ticker: &str,
    source: &P,
    settings: &PulseSettings,
) -> Result<(f64, f64)> {
    let history = source.price_history(ticker, settings.lookback_years)?;
    if history.len() < 2 {
        return Err(Error::DataUnavailable {
            ticker: ticker.to_string(),
            reason: format!("only {} price points", history.len()),
        });
    }
    let ret = annualized_return(&history);
    let vol = annualized_volatility(&history);
    if !ret.is_finite() || !vol.is_finite() {
        return Err(Error::DataUnavailable {
            ticker: ticker.to_string(),
            reason: "non-finite statistics".into(),
        });
    }
    Ok((ret, vol))
}

/// Weighted expected return and combined volatility of `weights`.
///
/// Never fails: a ticker whose data is unavailable uses
/// `settings.fallback_return` and `settings.fallback_volatility`.
pub fn expected_performance<P: PriceSource>(
    weights: &WeightMap,
    source: &P,
    settings: &PulseSettings,
) -> Performance {
    let mut expected_return = 0.0;
    let mut variance = 0.0;
    for (ticker, weight) in weights.iter() {
        let (ret, vol) = match ticker_stats(ticker, source, settings) {
            Ok(stats) => stats,
            Err(e) => {
                warn!("{e}; using fallback return/volatility for {ticker}");
                (settings.fallback_return, settings.fallback_volatility)
            }
        };
        expected_return += weight * ret;
        variance += weight.powi(2) * vol.powi(2);
    }
    debug!("expected performance over {} tickers", weights.len());
    Performance {
        expected_return,
        volatility: variance.sqrt(),
    }
}

struct Cache {
    entries: FxHashMap<(String, u32), PriceHistory>,
    /// Least recently used first.
    order: VecDeque<(String, u32)>,
}

impl Cache {
    fn touch(&mut self, key: &(String, u32)) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}

/// Memoizes successful lookups from an inner source.
///
/// Holds at most `capacity` histories; the least recently used is evicted first.
/// Failures are not cached.
pub struct CachedPriceSource<P> {
    inner: P,
    capacity: usize,
    cache: Mutex<Cache>,
}

impl<P: PriceSource> CachedPriceSource<P> {
    pub fn new(inner: P) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(inner: P, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            cache: Mutex::new(Cache {
                entries: FxHashMap::default(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Number of cached histories.
    pub fn cached(&self) -> usize {
        self.cache.lock().map(|c| c.entries.len()).unwrap_or(0)
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: PriceSource> PriceSource for CachedPriceSource<P> {
    fn price_history(&self, ticker: &str, lookback_years: u32) -> Result<PriceHistory> {
        let key = (ticker.to_string(), lookback_years);
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.entries.get(&key).cloned() {
                cache.touch(&key);
                return Ok(hit);
            }
        }

        let history = self.inner.price_history(ticker, lookback_years)?;

        if let Ok(mut cache) = self.cache.lock() {
            if !cache.entries.contains_key(&key) {
                if cache.order.len() >= self.capacity {
                    if let Some(oldest) = cache.order.pop_front() {
                        cache.entries.remove(&oldest);
                    }
                }
                cache.order.push_back(key.clone());
            }
            cache.entries.insert(key, history.clone());
        }
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history(points: &[(NaiveDate, f64)]) -> PriceHistory {
        PriceHistory::new(
            points
                .iter()
                .map(|&(date, close)| PricePoint { date, close })
                .collect(),
        )
    }

    struct FixedSource(FxHashMap<String, PriceHistory>);

    impl PriceSource for FixedSource {
        fn price_history(&self, ticker: &str, _lookback_years: u32) -> Result<PriceHistory> {
            self.0.get(ticker).cloned().ok_or_else(|| Error::DataUnavailable {
                ticker: ticker.to_string(),
                reason: "missing".into(),
            })
        }
    }

    struct CountingSource {
        calls: Cell<usize>,
    }

    impl PriceSource for CountingSource {
        fn price_history(&self, _ticker: &str, _lookback_years: u32) -> Result<PriceHistory> {
            self.calls.set(self.calls.get() + 1);
            Ok(history(&[(date(2020, 1, 1), 100.0), (date(2021, 1, 1), 110.0)]))
        }
    }

    #[test]
    fn doubling_over_two_years() {
        // 2020 is a leap year: 731 days.
        let h = history(&[(date(2020, 1, 1), 100.0), (date(2022, 1, 1), 200.0)]);
        let expected = 2f64.powf(365.0 / 731.0) - 1.0;
        assert!((annualized_return(&h) - expected).abs() < 1e-12);
    }

    #[test]
    fn zero_span_has_zero_return() {
        let h = history(&[(date(2020, 1, 1), 100.0)]);
        assert_eq!(annualized_return(&h), 0.0);
        assert_eq!(annualized_return(&PriceHistory::default()), 0.0);
    }

    #[test]
    fn constant_growth_has_zero_volatility() {
        let h = history(&[
            (date(2024, 1, 1), 100.0),
            (date(2024, 1, 2), 110.0),
            (date(2024, 1, 3), 121.0),
            (date(2024, 1, 4), 133.1),
        ]);
        assert!(annualized_volatility(&h) < 1e-9);
    }

    #[test]
    fn volatility_uses_sample_std() {
        // returns: +10%, -10%
        let h = history(&[
            (date(2024, 1, 1), 100.0),
            (date(2024, 1, 2), 110.0),
            (date(2024, 1, 3), 99.0),
        ]);
        let std = (0.02f64).sqrt(); // ((0.1)^2 + (0.1)^2) / 1
        assert!((annualized_volatility(&h) - std * 252f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn points_are_sorted_and_filtered() {
        let h = history(&[
            (date(2024, 1, 3), 102.0),
            (date(2024, 1, 1), 100.0),
            (date(2024, 1, 2), f64::NAN),
        ]);
        assert_eq!(h.len(), 2);
        assert_eq!(h.points()[0].date, date(2024, 1, 1));
    }

    #[test]
    fn trailing_window() {
        let h = history(&[
            (date(2000, 1, 1), 50.0),
            (date(2020, 1, 1), 100.0),
            (date(2024, 1, 1), 120.0),
        ]);
        assert_eq!(h.trailing(15).len(), 2);
    }

    #[test]
    fn fallback_for_missing_ticker() {
        let w: WeightMap = [("VTI", 1.0)].into_iter().collect();
        let perf = expected_performance(&w, &NoPriceData, &PulseSettings::default());
        assert!((perf.expected_return - 0.04).abs() < 1e-12);
        assert!((perf.volatility - 0.10).abs() < 1e-12);
    }

    #[test]
    fn partial_failure_mixes_real_and_fallback() {
        let mut data = FxHashMap::default();
        data.insert(
            "VTI".to_string(),
            history(&[(date(2021, 1, 1), 100.0), (date(2022, 1, 1), 110.0)]),
        );
        let source = FixedSource(data);
        let w: WeightMap = [("VTI", 0.5), ("ZZZ", 0.5)].into_iter().collect();
        let perf = expected_performance(&w, &source, &PulseSettings::default());
        // VTI: 10% over exactly one year, volatility 0 (single return)
        assert!((perf.expected_return - (0.5 * 0.10 + 0.5 * 0.04)).abs() < 1e-9);
        assert!((perf.volatility - 0.05).abs() < 1e-12);
    }

    #[test]
    fn variances_add() {
        let w: WeightMap = [("A", 0.5), ("B", 0.5)].into_iter().collect();
        let perf = expected_performance(&w, &NoPriceData, &PulseSettings::default());
        // sqrt(2 * 0.25 * 0.01)
        assert!((perf.volatility - (0.005f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn cache_serves_repeat_lookups() {
        let source = CachedPriceSource::new(CountingSource { calls: Cell::new(0) });
        source.price_history("VTI", 15).unwrap();
        source.price_history("VTI", 15).unwrap();
        assert_eq!(source.inner().calls.get(), 1);
        source.price_history("VTI", 5).unwrap();
        assert_eq!(source.inner().calls.get(), 2);
    }

    #[test]
    fn cache_evicts_oldest() {
        let source = CachedPriceSource::with_capacity(CountingSource { calls: Cell::new(0) }, 2);
        for t in ["A", "B", "C"] {
            source.price_history(t, 1).unwrap();
        }
        assert_eq!(source.cached(), 2);
        source.price_history("A", 1).unwrap();
        assert_eq!(source.inner().calls.get(), 4);
    }

    #[test]
    fn cache_keeps_recently_used() {
        let source = CachedPriceSource::with_capacity(CountingSource { calls: Cell::new(0) }, 2);
        source.price_history("A", 1).unwrap();
        source.price_history("B", 1).unwrap();
        // Reading A makes B the eviction candidate.
        source.price_history("A", 1).unwrap();
        source.price_history("C", 1).unwrap();
        assert_eq!(source.inner().calls.get(), 3);

        source.price_history("A", 1).unwrap();
        assert_eq!(source.inner().calls.get(), 3);
        source.price_history("B", 1).unwrap();
        assert_eq!(source.inner().calls.get(), 4);
    }
}
