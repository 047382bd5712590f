//! Per-user portfolio storage.
//!
//! The store is the only shared mutable state in the pipeline. It is injected
//! into [`crate::service::PulseService`] rather than living in a global, so a
//! test double or a persistent backend can be swapped in.

use std::sync::RwLock;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::types::{DEFAULT_PORTFOLIO_VALUE, UserId, WeightMap};

/// Storage for each user's latest normalized portfolio.
///
/// Writes for the same user are last-write-wins.
pub trait PortfolioStore {
    /// Replace the user's portfolio and its notional value.
    fn set(&self, user: &UserId, weights: WeightMap, total_value: f64) -> Result<()>;

    /// Latest weights for the user, or [`Error::NotFound`].
    fn get(&self, user: &UserId) -> Result<WeightMap>;

    /// Notional value for the user; 100 if none was recorded.
    fn get_total_value(&self, user: &UserId) -> f64;

    /// True if the user has uploaded a portfolio.
    fn contains(&self, user: &UserId) -> bool {
        self.get(user).is_ok()
    }
}

impl<S: PortfolioStore + ?Sized> PortfolioStore for &S {
    fn set(&self, user: &UserId, weights: WeightMap, total_value: f64) -> Result<()> {
        (**self).set(user, weights, total_value)
    }

    fn get(&self, user: &UserId) -> Result<WeightMap> {
        (**self).get(user)
    }

    fn get_total_value(&self, user: &UserId) -> f64 {
        (**self).get_total_value(user)
    }
}

#[derive(Debug, Default)]
struct Entries {
    weights: FxHashMap<UserId, WeightMap>,
    values: FxHashMap<UserId, f64>,
}

/// Process-local store guarded by a read/write lock.
#[derive(Debug, Default)]
pub struct InMemoryPortfolioStore {
    inner: RwLock<Entries>,
}

impl InMemoryPortfolioStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with a stored portfolio.
    pub fn len(&self) -> usize {
        self.inner.read().map(|e| e.weights.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> Error {
    Error::Storage("portfolio store lock poisoned".into())
}

impl PortfolioStore for InMemoryPortfolioStore {
    fn set(&self, user: &UserId, weights: WeightMap, total_value: f64) -> Result<()> {
        let mut entries = self.inner.write().map_err(|_| poisoned())?;
        entries.weights.insert(user.clone(), weights);
        entries.values.insert(user.clone(), total_value);
        Ok(())
    }

    fn get(&self, user: &UserId) -> Result<WeightMap> {
        let entries = self.inner.read().map_err(|_| poisoned())?;
        entries
            .weights
            .get(user)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("portfolio for {user}")))
    }

    fn get_total_value(&self, user: &UserId) -> f64 {
        self.inner
            .read()
            .ok()
            .and_then(|e| e.values.get(user).copied())
            .unwrap_or(DEFAULT_PORTFOLIO_VALUE)
    }
}
