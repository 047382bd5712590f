//! Holdings → canonical weight mapping.

use log::debug;

use crate::error::{Error, Result};
use crate::types::{DEFAULT_PORTFOLIO_VALUE, Holding, WeightMap, normalize_ticker};

/// Normalized weights plus the notional they denominate.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalizedPortfolio {
    pub weights: WeightMap,
    pub total_value: f64,
}

/// Divide each amount by the total so the result sums to one.
///
/// Tickers are upper-cased; repeated tickers are merged by summing their
/// amounts. Fails with [`Error::InvalidPortfolio`] when the total is not
/// strictly positive (empty input, or all amounts zero) or not finite.
pub fn normalize<S, I>(items: I) -> Result<WeightMap>
where
    S: AsRef<str>,
    I: IntoIterator<Item = (S, f64)>,
{
    let mut merged = WeightMap::new();
    for (ticker, amount) in items {
        let ticker = normalize_ticker(ticker.as_ref());
        if ticker.is_empty() {
            return Err(Error::InvalidPortfolio("empty ticker".into()));
        }
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidPortfolio(format!(
                "amount for {ticker} must be a non-negative number, got {amount}"
            )));
        }
        let prev = merged.get(&ticker);
        merged.insert(&ticker, prev + amount);
    }

    let total = merged.total();
    if total <= 0.0 {
        return Err(Error::InvalidPortfolio(
            "portfolio must have a positive total value".into(),
        ));
    }
    if !total.is_finite() {
        return Err(Error::InvalidPortfolio(
            "portfolio total value overflows".into(),
        ));
    }
    Ok(merged.iter().map(|(t, w)| (t, w / total)).collect())
}

/// Normalize user-supplied holdings, choosing amounts or weights.
///
/// If every holding carries a positive amount, amounts drive the weights and
/// their sum becomes the portfolio value. Otherwise each holding's weight
/// (zero when absent) is used and the value is fixed at `default_value`.
pub fn normalize_holdings_with(
    holdings: &[Holding],
    default_value: f64,
) -> Result<NormalizedPortfolio> {
    for h in holdings {
        if h.amount.is_none() && h.weight.is_none() {
            return Err(Error::InvalidPortfolio(format!(
                "holding {} must provide an amount or a weight",
                h.ticker
            )));
        }
        if let Some(w) = h.weight {
            if !w.is_finite() || w < 0.0 {
                return Err(Error::InvalidPortfolio(format!(
                    "weight for {} must be a non-negative number, got {w}",
                    h.ticker
                )));
            }
        }
    }

    let all_amounts = !holdings.is_empty()
        && holdings
            .iter()
            .all(|h| matches!(h.amount, Some(a) if a > 0.0));

    if all_amounts {
        let pairs: Vec<(&str, f64)> = holdings
            .iter()
            .map(|h| (h.ticker.as_str(), h.amount.unwrap_or(0.0)))
            .collect();
        let total_value: f64 = pairs.iter().map(|&(_, a)| a).sum();
        let weights = normalize(pairs)?;
        debug!("normalized {} holdings by amount, total {total_value:.2}", weights.len());
        Ok(NormalizedPortfolio {
            weights,
            total_value,
        })
    } else {
        let weights = normalize(
            holdings
                .iter()
                .map(|h| (h.ticker.as_str(), h.weight.unwrap_or(0.0))),
        )?;
        debug!("normalized {} holdings by weight", weights.len());
        Ok(NormalizedPortfolio {
            weights,
            total_value: default_value,
        })
    }
}

/// [`normalize_holdings_with`] using the default portfolio value of 100.
pub fn normalize_holdings(holdings: &[Holding]) -> Result<NormalizedPortfolio> {
    normalize_holdings_with(holdings, DEFAULT_PORTFOLIO_VALUE)
}
