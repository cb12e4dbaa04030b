#![forbid(unsafe_code)]

//! Bearer-token verification against a key published at a well-known address.
//!
//! [`from_access_token`] pulls the verification key through a [`KeyProvider`]
//! (cache callback first, remote fetch on a miss), checks the EdDSA
//! signature, retries once with a freshly fetched key if the cached one was
//! stale, and hands back a [`Token`] with the user id, scopes and expiry.
//! Nothing is global: every call gets its [`Config`] explicitly.

pub mod access;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod key;
pub mod provider;
pub mod token;
pub mod verify;

#[cfg(test)]
mod testing;

pub use access::{bearer_token, locate_token, token_from_pairs, Access, AccessError};
pub use cache::MemoryKeyCache;
pub use config::{CacheWritePolicy, Config, KeyLoadFn, KeyStoreFn};
pub use error::{BoxError, InvalidToken, VerifyError};
pub use fetch::{HttpFetcher, KeyFetcher};
pub use key::{Jwk, Jwks, KeyMaterial};
pub use provider::KeyProvider;
pub use token::Token;
pub use verify::from_access_token;

/// Current unix time in seconds.
pub fn now_ts() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}
