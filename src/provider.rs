use tracing::{debug, warn};

use crate::config::{CacheWritePolicy, Config};
use crate::error::VerifyError;
use crate::key::KeyMaterial;

/// Resolves the verification key for one verification attempt: cache first,
/// remote on a miss or when forced. Holds no state of its own.
#[derive(Debug, Clone, Copy)]
pub struct KeyProvider<'a> {
    config: &'a Config,
}

impl<'a> KeyProvider<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// At most one cache read and one remote fetch per call. A forced call
    /// never touches the cache-read collaborator.
    pub fn get_key(&self, force_refresh: bool) -> Result<KeyMaterial, VerifyError> {
        if !force_refresh {
            let doc = self.load_cached()?;
            if !doc.is_empty() {
                debug!(addr = %self.config.well_known_addr, "using cached key document");
                return KeyMaterial::from_document(&doc);
            }
        }

        let doc = self.fetch_remote()?;
        self.store(&doc)?;
        KeyMaterial::from_document(&doc)
    }

    fn load_cached(&self) -> Result<String, VerifyError> {
        match &self.config.key_load {
            Some(load) => load().map_err(VerifyError::CacheRead),
            None => Ok(String::new()),
        }
    }

    fn fetch_remote(&self) -> Result<String, VerifyError> {
        let addr = &self.config.well_known_addr;
        debug!(addr = %addr, "fetching key document");
        self.config
            .fetcher
            .fetch(addr)
            .map_err(|source| VerifyError::KeyFetch { addr: addr.clone(), source })
    }

    fn store(&self, doc: &str) -> Result<(), VerifyError> {
        let Some(store) = &self.config.key_store else {
            return Ok(());
        };
        match (store(doc), self.config.cache_write_policy) {
            (Ok(()), _) => Ok(()),
            (Err(e), CacheWritePolicy::Fail) => Err(VerifyError::CacheWrite(e)),
            (Err(e), CacheWritePolicy::Warn) => {
                warn!(error = %e, "key cache write failed, continuing with fetched key");
                Ok(())
            }
        }
    }
}
