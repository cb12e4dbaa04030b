use base64::{engine::general_purpose::URL_SAFE_NO_PAD as B64URL, Engine as _};
use ed25519_dalek::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::{InvalidToken, VerifyError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

impl Jwk {
    /// Public JWK for an Ed25519 verifying key.
    pub fn ed25519(vk: &VerifyingKey, kid: Option<&str>) -> Self {
        Self {
            kty: "OKP".into(),
            crv: Some("Ed25519".into()),
            x: Some(B64URL.encode(vk.to_bytes())),
            kid: kid.map(str::to_string),
        }
    }

    fn verifying_key(&self) -> Result<VerifyingKey, String> {
        if self.kty != "OKP" {
            return Err(format!("unsupported kty {:?}", self.kty));
        }
        if self.crv.as_deref() != Some("Ed25519") {
            return Err(format!("unsupported crv {:?}", self.crv));
        }
        let x = self.x.as_ref().ok_or("missing x")?;
        let bytes = B64URL.decode(x.as_bytes()).map_err(|e| format!("x: {e}"))?;
        let bytes: [u8; 32] = bytes[..]
            .try_into()
            .map_err(|_| format!("x: expected 32 bytes, got {}", bytes.len()))?;
        VerifyingKey::from_bytes(&bytes).map_err(|e| format!("x: {e}"))
    }
}

/// A decoded verification key. Rebuilt from the raw document on every
/// acquisition and never shared between verification attempts.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    vk: VerifyingKey,
    kid: Option<String>,
}

impl KeyMaterial {
    /// Decode a key document: either a single JWK or a JWK Set, in which
    /// case the first usable Ed25519 key wins.
    pub fn from_document(doc: &str) -> Result<Self, VerifyError> {
        let value: Json =
            serde_json::from_str(doc).map_err(|e| VerifyError::KeyDecode(e.to_string()))?;

        let candidates: Vec<Jwk> = if value.get("keys").is_some() {
            let set: Jwks =
                serde_json::from_value(value).map_err(|e| VerifyError::KeyDecode(e.to_string()))?;
            set.keys
        } else {
            let jwk: Jwk =
                serde_json::from_value(value).map_err(|e| VerifyError::KeyDecode(e.to_string()))?;
            vec![jwk]
        };

        let mut last_err = String::from("key set is empty");
        for jwk in candidates {
            match jwk.verifying_key() {
                Ok(vk) => return Ok(Self { vk, kid: jwk.kid }),
                Err(e) => last_err = e,
            }
        }
        Err(VerifyError::KeyDecode(last_err))
    }

    pub fn kid(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.vk
    }

    pub(crate) fn verify(&self, signing_input: &[u8], sig: &Signature) -> Result<(), InvalidToken> {
        self.vk
            .verify_strict(signing_input, sig)
            .map_err(|_| InvalidToken::Signature)
    }
}
