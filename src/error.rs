//! Error types for the scoring pipeline and its collaborators.

/// All errors the engine and its collaborator boundaries can produce.
///
/// Scoring, comparison and plan generation never fail on their own; fatal
/// conditions originate in normalization or at a collaborator boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Empty portfolio, non-positive total, or a malformed holding.
    #[error("invalid portfolio: {0}")]
    InvalidPortfolio(String),

    /// No stored portfolio for the user, or an unknown model key.
    #[error("not found: {0}")]
    NotFound(String),

    /// No credential was presented.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// A credential was presented but not accepted.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authentication is required but no identity provider is configured.
    #[error("authentication is not configured")]
    AuthNotConfigured,

    /// The portfolio store could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// Market data for a ticker could not be loaded.
    ///
    /// Recovered per ticker inside [`crate::market_data::expected_performance`].
    #[error("market data unavailable for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },
}

impl Error {
    /// True for the authentication family (unauthenticated, unauthorized, unconfigured).
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Error::Unauthenticated(_) | Error::Unauthorized(_) | Error::AuthNotConfigured
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
