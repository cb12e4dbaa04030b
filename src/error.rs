/// Error type returned by the externally supplied collaborators
/// (cache callbacks, key fetchers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a token was rejected. Every variant maps to "unauthorized".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidToken {
    #[error("bad token format")]
    BadFormat,
    #[error("base64 decode failed")]
    Base64,
    #[error("json parse failed")]
    Json,
    #[error("alg not allowed (expected EdDSA, got {0:?})")]
    Alg(String),
    #[error("invalid signature")]
    Signature,
    #[error("claim '{name}' has wrong type: {reason}")]
    Claim { name: &'static str, reason: String },
    #[error("claim 'exp' expired")]
    Expired,
    #[error("claim 'nbf' in future")]
    NotYetValid,
    #[error("claim 'iat' in future")]
    IssuedInFuture,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("key cache read failed: {0}")]
    CacheRead(#[source] BoxError),
    #[error("key fetch from {addr} failed: {source}")]
    KeyFetch {
        addr: String,
        #[source]
        source: BoxError,
    },
    #[error("key document decode failed: {0}")]
    KeyDecode(String),
    #[error("key cache write failed: {0}")]
    CacheWrite(#[source] BoxError),
    #[error("token invalid: {0}")]
    Invalid(#[from] InvalidToken),
}

impl VerifyError {
    /// True only for token validation failures. Everything else is an
    /// infrastructure fault on the verifying side.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, VerifyError::Invalid(_))
    }

    pub fn as_invalid(&self) -> Option<&InvalidToken> {
        match self {
            VerifyError::Invalid(inner) => Some(inner),
            _ => None,
        }
    }
}
