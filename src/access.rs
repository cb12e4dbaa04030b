//! Framework-agnostic request gate.
//!
//! HTTP adapters locate the raw token with [`locate_token`], run it through an
//! [`Access`] gate and map any [`AccessError`] to a status with
//! [`AccessError::status`].

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::VerifyError;
use crate::token::Token;
use crate::verify::from_access_token;

/// Query/form parameter names checked for a token, in order.
pub const TOKEN_PARAMS: [&str; 2] = ["access_token", "jwt"];

/// Strip the `Bearer ` scheme from an `Authorization` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    let header = header.trim_start();
    let token = match header.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => &header[7..],
        _ => header,
    };
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// First non-empty `access_token` or `jwt` value among decoded pairs.
pub fn token_from_pairs<'a, I>(pairs: I) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
    I::IntoIter: Clone,
{
    let pairs = pairs.into_iter();
    TOKEN_PARAMS.iter().find_map(|name| {
        pairs
            .clone()
            .find(|(k, v)| k == name && !v.is_empty())
            .map(|(_, v)| v)
    })
}

/// Header first, then query string pairs, then form body pairs.
pub fn locate_token<'a>(
    authorization: Option<&'a str>,
    query: &[(&'a str, &'a str)],
    form: &[(&'a str, &'a str)],
) -> Option<&'a str> {
    authorization
        .and_then(bearer_token)
        .or_else(|| token_from_pairs(query.iter().copied()))
        .or_else(|| token_from_pairs(form.iter().copied()))
}

#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("no token present")]
    MissingToken,
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error("missing scope '{0}'")]
    MissingScope(String),
}

impl AccessError {
    /// 401 for anything the client can fix, 500 for verifier-side faults.
    pub fn status(&self) -> u16 {
        match self {
            AccessError::MissingToken | AccessError::MissingScope(_) => 401,
            AccessError::Verify(e) if e.is_unauthorized() => 401,
            AccessError::Verify(_) => 500,
        }
    }
}

/// A verification gate with a fixed set of required scopes (all must be held).
#[derive(Debug, Clone, Default)]
pub struct Access {
    scopes: Vec<String>,
}

impl Access {
    /// Any validly signed token passes.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn scope(scope: impl Into<String>) -> Self {
        Self { scopes: vec![scope.into()] }
    }

    pub fn scopes<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { scopes: scopes.into_iter().map(Into::into).collect() }
    }

    pub fn required(&self) -> &[String] {
        &self.scopes
    }

    pub fn check(&self, raw: Option<&str>, config: &Config) -> Result<Token, AccessError> {
        let raw = raw.filter(|r| !r.is_empty()).ok_or_else(|| {
            debug!("no token present");
            AccessError::MissingToken
        })?;

        let token = from_access_token(raw, config).map_err(|e| {
            warn!(error = %e, unauthorized = e.is_unauthorized(), "token verification failed");
            AccessError::Verify(e)
        })?;

        if let Some(scope) = token.missing_scope(&self.scopes) {
            debug!(scope = %scope, user_id = token.user_id(), "token lacks required scope");
            return Err(AccessError::MissingScope(scope));
        }
        Ok(token)
    }
}
