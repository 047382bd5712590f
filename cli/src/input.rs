//! Portfolio upload file (portfolio.json) loading and validation.

use std::path::Path;

use portfolio_pulse::Holding;
use serde::Deserialize;

use crate::error::{Error, Result};

/// An uploaded portfolio: a list of holdings given by amount and/or weight.
#[derive(Debug, Clone, Deserialize)]
pub struct PortfolioFile {
    pub portfolio: Vec<Holding>,
}

impl PortfolioFile {
    /// Load and validate a portfolio.json file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::PortfolioRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string (useful for testing).
    pub fn from_json(json: &str) -> Result<Self> {
        let file: PortfolioFile = serde_json::from_str(json)?;
        file.validate()?;
        Ok(file)
    }

    /// Shape checks. Totals are checked by the normalizer.
    fn validate(&self) -> Result<()> {
        if self.portfolio.is_empty() {
            return Err(Error::Portfolio("portfolio list is empty".into()));
        }

        for h in &self.portfolio {
            if h.ticker.trim().is_empty() {
                return Err(Error::Portfolio("empty ticker".into()));
            }
            if h.amount.is_none() && h.weight.is_none() {
                return Err(Error::Portfolio(format!(
                    "{} must provide an amount or a weight",
                    h.ticker
                )));
            }
            if h.amount.is_some_and(|a| a < 0.0) {
                return Err(Error::Portfolio(format!("amount for {} is negative", h.ticker)));
            }
            if h.weight.is_some_and(|w| w < 0.0) {
                return Err(Error::Portfolio(format!("weight for {} is negative", h.ticker)));
            }
        }

        Ok(())
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.portfolio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_amounts() {
        let file = PortfolioFile::from_json(
            r#"{"portfolio": [
                {"ticker": "AAPL", "amount": 60},
                {"ticker": "TLT", "amount": 40}
            ]}"#,
        )
        .unwrap();
        assert_eq!(file.holdings().len(), 2);
        assert_eq!(file.holdings()[0].amount, Some(60.0));
        assert_eq!(file.holdings()[0].weight, None);
    }

    #[test]
    fn parse_weights() {
        let file = PortfolioFile::from_json(
            r#"{"portfolio": [{"ticker": "vti", "weight": 0.7}, {"ticker": "bnd", "weight": 0.3}]}"#,
        )
        .unwrap();
        assert_eq!(file.holdings()[1].weight, Some(0.3));
    }

    #[test]
    fn reject_empty() {
        assert!(PortfolioFile::from_json(r#"{"portfolio": []}"#).is_err());
    }

    #[test]
    fn reject_holding_without_values() {
        assert!(PortfolioFile::from_json(r#"{"portfolio": [{"ticker": "VTI"}]}"#).is_err());
    }

    #[test]
    fn reject_negative_amount() {
        assert!(
            PortfolioFile::from_json(r#"{"portfolio": [{"ticker": "VTI", "amount": -5}]}"#)
                .is_err()
        );
    }

    #[test]
    fn reject_malformed_json() {
        assert!(matches!(
            PortfolioFile::from_json(r#"{"portfolio": "#),
            Err(Error::Json(_))
        ));
    }
}
