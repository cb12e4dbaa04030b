//! Shared fixtures for unit tests: deterministic keys, token signing and a
//! counting stand-in for the cache and fetch collaborators.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as B64URL, Engine as _};
use ed25519_dalek::{Signer, SigningKey};
use json_atomic::canonize;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde_json::{json, Value as Json};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::error::BoxError;
use crate::fetch::KeyFetcher;
use crate::key::Jwk;
use crate::{now_ts, Config};

pub(crate) fn signing_key(seed: u64) -> SigningKey {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    SigningKey::generate(&mut rng)
}

pub(crate) fn jwk_doc(sk: &SigningKey) -> String {
    serde_json::to_string(&Jwk::ed25519(&sk.verifying_key(), None)).unwrap()
}

pub(crate) fn sign_with_header(sk: &SigningKey, header: &Json, payload: &Json) -> String {
    let hdr = B64URL.encode(canonize(header).unwrap());
    let pld = B64URL.encode(canonize(payload).unwrap());
    let msg = format!("{}.{}", hdr, pld);
    let sig = sk.sign(msg.as_bytes());
    format!("{}.{}", msg, B64URL.encode(sig.to_bytes()))
}

pub(crate) fn sign(sk: &SigningKey, payload: &Json) -> String {
    sign_with_header(sk, &json!({"alg":"EdDSA","typ":"JWT"}), payload)
}

/// Claims for a token that is good for another hour.
pub(crate) fn live_claims(user: &str, scopes: &str) -> Json {
    let now = now_ts();
    json!({ "jti": user, "sco": scopes, "iat": now, "exp": now + 3600 })
}

#[derive(Default)]
struct State {
    remote: Mutex<String>,
    cached: Mutex<String>,
    stored: Mutex<Vec<String>>,
    loads: AtomicUsize,
    fetches: AtomicUsize,
    fail_loads: Mutex<bool>,
    fail_fetches: Mutex<bool>,
    fail_stores: Mutex<bool>,
}

struct CountingFetcher(Arc<State>);

impl KeyFetcher for CountingFetcher {
    fn fetch(&self, _addr: &str) -> Result<String, BoxError> {
        self.0.fetches.fetch_add(1, Ordering::SeqCst);
        if *self.0.fail_fetches.lock() {
            return Err("connection refused".into());
        }
        Ok(self.0.remote.lock().clone())
    }
}

/// Records every collaborator call so tests can pin call counts.
#[derive(Clone)]
pub(crate) struct Harness(Arc<State>);

impl Harness {
    pub(crate) fn new(remote_doc: &str) -> Self {
        let state = State::default();
        *state.remote.lock() = remote_doc.to_string();
        Self(Arc::new(state))
    }

    /// Fetcher plus both cache callbacks.
    pub(crate) fn config(&self) -> Config {
        let load = Arc::clone(&self.0);
        let store = Arc::clone(&self.0);
        self.bare_config()
            .with_key_load(move || {
                load.loads.fetch_add(1, Ordering::SeqCst);
                if *load.fail_loads.lock() {
                    return Err("cache unavailable".into());
                }
                Ok(load.cached.lock().clone())
            })
            .with_key_store(move |doc| {
                if *store.fail_stores.lock() {
                    return Err("cache read-only".into());
                }
                store.stored.lock().push(doc.to_string());
                *store.cached.lock() = doc.to_string();
                Ok(())
            })
    }

    /// Fetcher only, no cache callbacks.
    pub(crate) fn bare_config(&self) -> Config {
        Config::new("mem://well-known/jwk").with_fetcher(Arc::new(CountingFetcher(Arc::clone(&self.0))))
    }

    pub(crate) fn set_cached(&self, doc: &str) {
        *self.0.cached.lock() = doc.to_string();
    }

    pub(crate) fn set_remote(&self, doc: &str) {
        *self.0.remote.lock() = doc.to_string();
    }

    pub(crate) fn fail_loads(&self) {
        *self.0.fail_loads.lock() = true;
    }

    pub(crate) fn fail_fetches(&self) {
        *self.0.fail_fetches.lock() = true;
    }

    pub(crate) fn fail_stores(&self) {
        *self.0.fail_stores.lock() = true;
    }

    pub(crate) fn loads(&self) -> usize {
        self.0.loads.load(Ordering::SeqCst)
    }

    pub(crate) fn fetches(&self) -> usize {
        self.0.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn stored(&self) -> Vec<String> {
        self.0.stored.lock().clone()
    }
}
