//! Credential → user identity.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::types::UserId;

/// Identity used when anonymous access is explicitly allowed.
pub const ANONYMOUS_USER: &str = "anon-user";

/// Resolves a presented credential to a stable user identifier.
pub trait Authenticator {
    fn authenticate(&self, credential: Option<&str>) -> Result<UserId>;
}

/// Bearer-token authenticator backed by a static token table.
///
/// With no table configured every request fails with
/// [`Error::AuthNotConfigured`], unless anonymous access is allowed, in which
/// case every request resolves to [`ANONYMOUS_USER`].
#[derive(Debug, Clone, Default)]
pub struct TokenAuthenticator {
    tokens: Option<FxHashMap<String, UserId>>,
    allow_anonymous: bool,
}

impl TokenAuthenticator {
    /// An authenticator with no identity provider configured.
    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// Accept the given `(token, user)` pairs.
    pub fn with_tokens<I, T, U>(tokens: I) -> Self
    where
        I: IntoIterator<Item = (T, U)>,
        T: Into<String>,
        U: Into<String>,
    {
        Self {
            tokens: Some(
                tokens
                    .into_iter()
                    .map(|(t, u)| (t.into(), UserId::new(u)))
                    .collect(),
            ),
            allow_anonymous: false,
        }
    }

    /// Allow anonymous access when no identity provider is configured.
    pub fn allow_anonymous(mut self, allow: bool) -> Self {
        self.allow_anonymous = allow;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.tokens.is_some()
    }
}

impl Authenticator for TokenAuthenticator {
    fn authenticate(&self, credential: Option<&str>) -> Result<UserId> {
        let Some(tokens) = &self.tokens else {
            if self.allow_anonymous {
                return Ok(UserId::new(ANONYMOUS_USER));
            }
            return Err(Error::AuthNotConfigured);
        };

        let token = match credential.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(Error::Unauthenticated("missing bearer token".into())),
        };
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();

        tokens
            .get(token)
            .cloned()
            .ok_or_else(|| Error::Unauthorized("invalid token".into()))
    }
}
