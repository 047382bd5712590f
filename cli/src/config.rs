//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use portfolio_pulse::{PulseSettings, TokenAuthenticator};
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_starting_value")]
    pub starting_value: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_lookback")]
    pub lookback_years: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            starting_value: default_starting_value(),
            currency: default_currency(),
            lookback_years: default_lookback(),
        }
    }
}

fn default_starting_value() -> f64 {
    100.0
}
fn default_currency() -> String {
    "USD".into()
}
fn default_lookback() -> u32 {
    15
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Directory of `<TICKER>.csv` price files. Unset means no market data.
    #[serde(default)]
    pub prices_dir: Option<String>,
    #[serde(default = "default_fallback_return")]
    pub fallback_return: f64,
    #[serde(default = "default_fallback_volatility")]
    pub fallback_volatility: f64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            prices_dir: None,
            fallback_return: default_fallback_return(),
            fallback_volatility: default_fallback_volatility(),
        }
    }
}

fn default_fallback_return() -> f64 {
    0.04
}
fn default_fallback_volatility() -> f64 {
    0.10
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "./data/portfolios.json".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub allow_anonymous: bool,
    /// Token → user id. Absent means no identity provider is configured.
    #[serde(default)]
    pub tokens: Option<FxHashMap<String, String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Load config if the file exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        if self.general.currency != "USD" {
            return Err(Error::Config(format!(
                "unsupported currency {}; only USD is supported",
                self.general.currency
            )));
        }
        self.settings().validate().map_err(Error::Config)?;
        if self.store.path.is_empty() {
            return Err(Error::Config("store path must not be empty".into()));
        }
        if let Some(tokens) = &self.auth.tokens {
            if tokens.values().any(|u| u.trim().is_empty()) {
                return Err(Error::Config("token user ids must not be empty".into()));
            }
        }
        Ok(())
    }

    /// Engine settings derived from this config.
    pub fn settings(&self) -> PulseSettings {
        PulseSettings {
            starting_value: self.general.starting_value,
            lookback_years: self.general.lookback_years,
            fallback_return: self.data.fallback_return,
            fallback_volatility: self.data.fallback_volatility,
        }
    }

    /// Build the authenticator. `allow_anonymous_env` ORs in the `ALLOW_ANON` override.
    pub fn authenticator(&self, allow_anonymous_env: bool) -> TokenAuthenticator {
        let auth = match &self.auth.tokens {
            Some(tokens) => TokenAuthenticator::with_tokens(
                tokens.iter().map(|(t, u)| (t.clone(), u.clone())),
            ),
            None => TokenAuthenticator::unconfigured(),
        };
        auth.allow_anonymous(self.auth.allow_anonymous || allow_anonymous_env)
    }

    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.store.path)
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}
