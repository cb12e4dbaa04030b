use serde::Deserialize;
use serde_json::Value as Json;
use std::collections::BTreeSet;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::error::InvalidToken;

/// A verified bearer token, reduced to the claims the gate cares about.
///
/// `Token::empty()` (also `Default`) stands for "no identity": UNIX epoch
/// expiry, empty user id, no scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    expires_at: OffsetDateTime,
    user_id: String,
    scopes: BTreeSet<String>,
}

impl Default for Token {
    fn default() -> Self {
        Self::empty()
    }
}

/// `exp`/`nbf`/`iat` as integer or fractional seconds.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum NumericDate {
    Int(i64),
    Float(f64),
}

impl NumericDate {
    fn secs(self) -> i64 {
        match self {
            NumericDate::Int(s) => s,
            NumericDate::Float(f) => f as i64,
        }
    }
}

/// Typed view of the payload. Unrecognized claims are ignored.
#[derive(Debug, Default)]
pub(crate) struct ClaimSet {
    exp: Option<NumericDate>,
    nbf: Option<NumericDate>,
    iat: Option<NumericDate>,
    jti: Option<String>,
    sco: Option<String>,
}

impl ClaimSet {
    /// Decode claim by claim so a wrong-typed value names the offending claim.
    pub(crate) fn from_payload(payload: &Json) -> Result<Self, InvalidToken> {
        let obj = payload.as_object().ok_or(InvalidToken::Json)?;
        Ok(Self {
            exp: claim(obj, "exp")?,
            nbf: claim(obj, "nbf")?,
            iat: claim(obj, "iat")?,
            jti: claim(obj, "jti")?,
            sco: claim(obj, "sco")?,
        })
    }

    pub(crate) fn check_times(&self, now: i64, leeway: i64) -> Result<(), InvalidToken> {
        if let Some(exp) = self.exp {
            if now > exp.secs().saturating_add(leeway) {
                return Err(InvalidToken::Expired);
            }
        }
        if let Some(nbf) = self.nbf {
            if now.saturating_add(leeway) < nbf.secs() {
                return Err(InvalidToken::NotYetValid);
            }
        }
        if let Some(iat) = self.iat {
            if iat.secs() > now.saturating_add(leeway) {
                return Err(InvalidToken::IssuedInFuture);
            }
        }
        Ok(())
    }
}

fn claim<T: for<'de> Deserialize<'de>>(
    obj: &serde_json::Map<String, Json>,
    name: &'static str,
) -> Result<Option<T>, InvalidToken> {
    match obj.get(name) {
        None | Some(Json::Null) => Ok(None),
        Some(v) => T::deserialize(v)
            .map(Some)
            .map_err(|e| InvalidToken::Claim { name, reason: e.to_string() }),
    }
}

/// Any integer `exp` is accepted; values past what `time` can represent
/// pin to its first or last representable instant.
fn expiry_from_secs(secs: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(secs).unwrap_or_else(|_| {
        if secs < 0 {
            PrimitiveDateTime::MIN.assume_utc()
        } else {
            PrimitiveDateTime::MAX.assume_utc()
        }
    })
}

/// Split `sco` on commas. Scopes differing only in case collapse to the
/// first spelling seen.
fn parse_scopes(sco: &str) -> BTreeSet<String> {
    let mut seen = BTreeSet::new();
    sco.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .map(str::to_string)
        .collect()
}

impl From<ClaimSet> for Token {
    fn from(c: ClaimSet) -> Self {
        Self {
            expires_at: c.exp.map_or(OffsetDateTime::UNIX_EPOCH, |exp| expiry_from_secs(exp.secs())),
            user_id: c.jti.unwrap_or_default(),
            scopes: c.sco.as_deref().map(parse_scopes).unwrap_or_default(),
        }
    }
}

impl Token {
    pub fn empty() -> Self {
        Self { expires_at: OffsetDateTime::UNIX_EPOCH, user_id: String::new(), scopes: BTreeSet::new() }
    }

    /// Unsigned shortcut for unit tests.
    #[cfg(test)]
    pub(crate) fn from_claims(payload: &Json) -> Result<Self, InvalidToken> {
        ClaimSet::from_payload(payload).map(Token::from)
    }

    /// Reports `true` once the current time is strictly past `exp`.
    ///
    /// Despite the name this answers "has it expired". The behaviour is kept
    /// as-is for compatibility with existing integrations; confirm the
    /// intended meaning before relying on it, or compare
    /// [`expires_at`](Self::expires_at) yourself.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(OffsetDateTime::now_utc())
    }

    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }

    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }

    /// The `jti` claim.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Granted scopes in their original spelling, at most one per
    /// case-insensitive name.
    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        let wanted = scope.to_lowercase();
        self.scopes.iter().any(|s| s.to_lowercase() == wanted)
    }

    /// All of `required` must be granted. An empty requirement always passes.
    pub fn has_scopes<I, S>(&self, required: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.missing_scope(required).is_none()
    }

    /// First required scope this token lacks, if any.
    pub fn missing_scope<I, S>(&self, required: I) -> Option<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        required
            .into_iter()
            .find(|s| !self.has_scope(s.as_ref()))
            .map(|s| s.as_ref().to_string())
    }
}
