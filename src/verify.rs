use base64::{engine::general_purpose::URL_SAFE_NO_PAD as B64URL, Engine as _};
use ed25519_dalek::Signature;
use serde_json::Value as Json;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{InvalidToken, VerifyError};
use crate::key::KeyMaterial;
use crate::now_ts;
use crate::provider::KeyProvider;
use crate::token::{ClaimSet, Token};

/// Verify a compact EdDSA JWS against the key behind `config` and return
/// its claims as a [`Token`].
///
/// Key acquisition starts from the cache. If that fails, or if the cached key
/// does not verify the token, the key is fetched once more with the cache
/// bypassed and verification is retried a single time. Expiry and other time
/// claims are checked only after the signature holds and are never retried.
pub fn from_access_token(raw: &str, config: &Config) -> Result<Token, VerifyError> {
    let provider = KeyProvider::new(config);

    let (key, forced) = match provider.get_key(false) {
        Ok(key) => (key, false),
        Err(e) => {
            warn!(error = %e, "key acquisition failed, forcing refresh");
            (provider.get_key(true)?, true)
        }
    };

    let payload = match verify_signature(raw, &key) {
        Ok(payload) => payload,
        Err(e) if !forced => {
            warn!(error = %e, "token rejected by cached key, retrying with fresh key");
            let key = provider.get_key(true)?;
            verify_signature(raw, &key)?
        }
        Err(e) => return Err(e.into()),
    };

    let claims = ClaimSet::from_payload(&payload)?;
    claims.check_times(now_ts(), config.leeway_secs)?;
    let token = Token::from(claims);
    debug!(user_id = token.user_id(), scopes = token.scopes().len(), "token verified");
    Ok(token)
}

/// Split, decode and check the signature. Returns the decoded payload.
fn verify_signature(token: &str, key: &KeyMaterial) -> Result<Json, InvalidToken> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(InvalidToken::BadFormat);
    }

    let header = decode_json(parts[0])?;
    let alg = header.get("alg").and_then(|v| v.as_str()).unwrap_or_default();
    if alg != "EdDSA" {
        return Err(InvalidToken::Alg(alg.to_string()));
    }

    let payload = decode_json(parts[1])?;
    let sig_bytes = B64URL.decode(parts[2].as_bytes()).map_err(|_| InvalidToken::Base64)?;
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| InvalidToken::Signature)?;

    let signing_input = &token[..parts[0].len() + 1 + parts[1].len()];
    key.verify(signing_input.as_bytes(), &sig)?;
    Ok(payload)
}

fn decode_json(segment: &str) -> Result<Json, InvalidToken> {
    let bytes = B64URL.decode(segment.as_bytes()).map_err(|_| InvalidToken::Base64)?;
    serde_json::from_slice(&bytes).map_err(|_| InvalidToken::Json)
}
