//! Engine-side tunables.

use crate::types::DEFAULT_PORTFOLIO_VALUE;

/// Knobs the service pipeline reads. Loaded from the CLI's TOML config or
/// left at their defaults.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PulseSettings {
    /// Portfolio value assumed when holdings carry weights only.
    pub starting_value: f64,
    /// Years of price history requested from the market data source.
    pub lookback_years: u32,
    /// Annual return substituted for a ticker whose history cannot be loaded.
    pub fallback_return: f64,
    /// Annual volatility substituted for a ticker whose history cannot be loaded.
    pub fallback_volatility: f64,
}

impl Default for PulseSettings {
    fn default() -> Self {
        Self {
            starting_value: DEFAULT_PORTFOLIO_VALUE,
            lookback_years: 15,
            fallback_return: 0.04,
            fallback_volatility: 0.10,
        }
    }
}

impl PulseSettings {
    /// Check invariants. Returns a description of the first violation.
    pub fn validate(&self) -> Result<(), String> {
        if !self.starting_value.is_finite() || self.starting_value <= 0.0 {
            return Err("starting_value must be > 0".into());
        }
        if self.lookback_years == 0 {
            return Err("lookback_years must be >= 1".into());
        }
        if !self.fallback_return.is_finite() {
            return Err("fallback_return must be finite".into());
        }
        if !self.fallback_volatility.is_finite() || self.fallback_volatility < 0.0 {
            return Err("fallback_volatility must be >= 0".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let s = PulseSettings::default();
        assert_eq!(s.starting_value, 100.0);
        assert_eq!(s.lookback_years, 15);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let s = PulseSettings {
            starting_value: 0.0,
            ..PulseSettings::default()
        };
        assert!(s.validate().is_err());
        let s = PulseSettings {
            fallback_volatility: f64::NAN,
            ..PulseSettings::default()
        };
        assert!(s.validate().is_err());
    }
}
