use std::{fmt, sync::Arc};

use crate::cache::MemoryKeyCache;
use crate::error::BoxError;
use crate::fetch::{HttpFetcher, KeyFetcher};

/// Loads a cached key document. `Ok("")` means nothing is cached.
pub type KeyLoadFn = Arc<dyn Fn() -> Result<String, BoxError> + Send + Sync>;
/// Persists a freshly fetched key document.
pub type KeyStoreFn = Arc<dyn Fn(&str) -> Result<(), BoxError> + Send + Sync>;

/// What to do when the key was fetched but could not be written to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheWritePolicy {
    /// Fail the acquisition with `VerifyError::CacheWrite`.
    #[default]
    Fail,
    /// Log the failure and carry on with the fetched key.
    Warn,
}

/// Verification settings. Built once by the caller and passed by reference
/// into every verification.
#[derive(Clone)]
pub struct Config {
    pub well_known_addr: String,
    pub key_load: Option<KeyLoadFn>,
    pub key_store: Option<KeyStoreFn>,
    pub fetcher: Arc<dyn KeyFetcher>,
    pub leeway_secs: i64,
    pub cache_write_policy: CacheWritePolicy,
}

impl Config {
    pub fn new(well_known_addr: impl Into<String>) -> Self {
        Self {
            well_known_addr: well_known_addr.into(),
            key_load: None,
            key_store: None,
            fetcher: Arc::new(HttpFetcher::default()),
            leeway_secs: 0,
            cache_write_policy: CacheWritePolicy::default(),
        }
    }

    pub fn with_key_load<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Result<String, BoxError> + Send + Sync + 'static,
    {
        self.key_load = Some(Arc::new(f));
        self
    }

    pub fn with_key_store<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.key_store = Some(Arc::new(f));
        self
    }

    /// Use an in-process [`MemoryKeyCache`] as both cache collaborators,
    /// keyed by this config's well-known address.
    pub fn with_memory_cache(self, cache: Arc<MemoryKeyCache>) -> Self {
        let addr = self.well_known_addr.clone();
        let load_cache = Arc::clone(&cache);
        let load_addr = addr.clone();
        self.with_key_load(move || Ok(load_cache.get_fresh(&load_addr).unwrap_or_default()))
            .with_key_store(move |doc| {
                cache.put(&addr, doc);
                Ok(())
            })
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn KeyFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_leeway(mut self, secs: i64) -> Self {
        self.leeway_secs = secs;
        self
    }

    pub fn with_cache_write_policy(mut self, policy: CacheWritePolicy) -> Self {
        self.cache_write_policy = policy;
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("well_known_addr", &self.well_known_addr)
            .field("key_load", &self.key_load.is_some())
            .field("key_store", &self.key_store.is_some())
            .field("leeway_secs", &self.leeway_secs)
            .field("cache_write_policy", &self.cache_write_policy)
            .finish_non_exhaustive()
    }
}
