use std::time::Duration;

use crate::error::BoxError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Retrieves the raw key document from the well-known address.
///
/// Any timeout is the implementation's business; the verifier never wraps
/// a fetch in its own deadline.
pub trait KeyFetcher: Send + Sync {
    fn fetch(&self, addr: &str) -> Result<String, BoxError>;
}

/// Blocking HTTP fetcher on a shared `ureq` agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }
}

impl HttpFetcher {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { agent: ureq::AgentBuilder::new().timeout(timeout).build() }
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl KeyFetcher for HttpFetcher {
    fn fetch(&self, addr: &str) -> Result<String, BoxError> {
        // ureq reports non-2xx statuses as errors.
        let resp = self.agent.get(addr).call().map_err(|e| e.to_string())?;
        let body = resp.into_string().map_err(|e| e.to_string())?;
        Ok(body)
    }
}
