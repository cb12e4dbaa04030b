use parking_lot::Mutex;
use std::collections::HashMap;

use crate::now_ts;

#[derive(Debug, Clone)]
struct CacheEntry {
    doc: String,
    stored_at: i64,
}

/// In-process key document cache with a fixed TTL, keyed by well-known
/// address. Plug it in with [`Config::with_memory_cache`](crate::Config::with_memory_cache).
///
/// Concurrent writers race benignly: the last `put` wins, and a bad
/// document is caught by the decode step on the next read.
#[derive(Debug)]
pub struct MemoryKeyCache {
    ttl_secs: i64,
    inner: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryKeyCache {
    pub fn new(ttl_secs: i64) -> Self {
        Self { ttl_secs, inner: Mutex::new(HashMap::new()) }
    }

    pub fn put(&self, addr: &str, doc: &str) {
        self.put_at(addr, doc, now_ts());
    }

    pub fn get_fresh(&self, addr: &str) -> Option<String> {
        self.get_fresh_at(addr, now_ts())
    }

    pub fn invalidate(&self, addr: &str) {
        self.inner.lock().remove(addr);
    }

    fn put_at(&self, addr: &str, doc: &str, now: i64) {
        let mut m = self.inner.lock();
        m.insert(addr.to_string(), CacheEntry { doc: doc.to_string(), stored_at: now });
    }

    fn get_fresh_at(&self, addr: &str, now: i64) -> Option<String> {
        let m = self.inner.lock();
        let entry = m.get(addr)?;
        if now - entry.stored_at <= self.ttl_secs {
            Some(entry.doc.clone())
        } else {
            None
        }
    }
}
