//! Core types: Ticker normalization, WeightMap, Holding, UserId, rounding helpers.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Tolerance used when checking that a weight mapping sums to one.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Portfolio value assumed when holdings are given as weights only.
pub const DEFAULT_PORTFOLIO_VALUE: f64 = 100.0;

/// Canonical ticker form: trimmed and upper-cased.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Round to `decimals` decimal places, half away from zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Clamp into `[min, max]`.
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Ticker → fraction of portfolio.
///
/// Backed by an ordered map so iteration is always in lexical ticker order;
/// every derived output (distribution, tracking error, plan) is therefore
/// deterministic regardless of the order holdings were supplied in.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct WeightMap(BTreeMap<String, f64>);

impl WeightMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert a weight, upper-casing the ticker. Replaces any previous weight.
    pub fn insert(&mut self, ticker: &str, weight: f64) {
        self.0.insert(normalize_ticker(ticker), weight);
    }

    /// Weight for `ticker`, or 0.0 if absent.
    pub fn get(&self, ticker: &str) -> f64 {
        match self.0.get(ticker) {
            Some(&w) => w,
            None => self.0.get(&normalize_ticker(ticker)).copied().unwrap_or(0.0),
        }
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.0.contains_key(&normalize_ticker(ticker))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(ticker, weight)` in lexical ticker order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(t, &w)| (t.as_str(), w))
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// True if the weights sum to one within [`WEIGHT_TOLERANCE`].
    pub fn is_normalized(&self) -> bool {
        (self.total() - 1.0).abs() <= WEIGHT_TOLERANCE
    }

    /// Sum of weights over a fixed ticker set.
    pub fn sum_of(&self, tickers: &[&str]) -> f64 {
        tickers.iter().map(|t| self.get(t)).sum()
    }

    /// The heaviest holding. On a tie the lexically first ticker wins.
    pub fn largest(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (ticker, weight) in self.iter() {
            match best {
                Some((_, w)) if weight <= w => {}
                _ => best = Some((ticker, weight)),
            }
        }
        best
    }

    /// Union of both mappings' tickers, in lexical order.
    pub fn union_tickers<'a>(&'a self, other: &'a WeightMap) -> BTreeSet<&'a str> {
        self.tickers().chain(other.tickers()).collect()
    }

    /// Multiply every weight by `factor`.
    pub fn scaled(&self, factor: f64) -> WeightMap {
        WeightMap(self.0.iter().map(|(t, &w)| (t.clone(), w * factor)).collect())
    }

    /// Borrow the underlying ordered map.
    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.0
    }
}

impl<S: AsRef<str>> FromIterator<(S, f64)> for WeightMap {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut map = WeightMap::new();
        for (ticker, weight) in iter {
            map.insert(ticker.as_ref(), weight);
        }
        map
    }
}

impl fmt::Display for WeightMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (ticker, weight)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{ticker}: {weight:.4}")?;
        }
        write!(f, "}}")
    }
}

/// One raw holding as supplied by a user: an amount, a weight, or both.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Holding {
    pub ticker: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub amount: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weight: Option<f64>,
}

impl Holding {
    pub fn with_amount(ticker: &str, amount: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            amount: Some(amount),
            weight: None,
        }
    }

    pub fn with_weight(ticker: &str, weight: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            amount: None,
            weight: Some(weight),
        }
    }
}

/// Opaque, stable user identifier handed out by an authenticator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
