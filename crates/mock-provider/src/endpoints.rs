//! Candidate RPC endpoints and first-responder selection.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    connection::{Connector, RpcConnection},
    error::{ProviderError, Result},
};

/// Environment variable holding a preferred endpoint, tried before the built-ins.
pub const RPC_URL_ENV: &str = "TEST_RPC_URL";

/// Built-in Sepolia endpoints, in preference order.
pub const DEFAULT_RPC_URLS: &[&str] = &[
    "https://ethereum-sepolia-rpc.publicnode.com",
    "https://rpc.sepolia.org",
    "https://sepolia.infura.io/v3/9aa3d95b3bc440fa88ea12eaa4456161",
];

/// A single endpoint candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// The RPC URL
    pub url: String,
    /// Optional name/label for the endpoint
    pub name: Option<String>,
}

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), name: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Label used in logs.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}

/// What to do when no candidate answers its probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Fail construction with a transport error.
    #[default]
    Strict,
    /// Keep the last candidate anyway and mark the connection degraded.
    Degraded,
}

impl std::str::FromStr for SelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "degraded" | "lenient" => Ok(Self::Degraded),
            _ => Err(format!("Unknown selection policy: {s}. Use 'strict' or 'degraded'")),
        }
    }
}

/// Ordered list of endpoints to try.
#[derive(Debug, Clone, Default)]
pub struct EndpointCandidates {
    endpoints: Vec<Endpoint>,
}

impl EndpointCandidates {
    /// Builds a list from URLs, dropping blanks and repeats.
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut candidates = Self::default();
        for url in urls {
            candidates.push(url.as_ref());
        }
        candidates
    }

    /// Creates a list from a comma-separated string
    pub fn from_urls(urls: &str) -> Self {
        Self::new(urls.split(','))
    }

    /// The environment override (if any) followed by [`DEFAULT_RPC_URLS`].
    pub fn from_env() -> Self {
        let mut candidates = Self::default();
        if let Ok(url) = std::env::var(RPC_URL_ENV) {
            candidates.push(&url);
        }
        candidates.extend_defaults();
        candidates
    }

    /// Appends a URL unless it is blank or already listed.
    pub fn push(&mut self, url: &str) {
        let url = url.trim();
        if url.is_empty() || self.endpoints.iter().any(|e| e.url == url) {
            return;
        }
        let name = format!("endpoint-{}", self.endpoints.len());
        self.endpoints.push(Endpoint::new(url).with_name(name));
    }

    /// Appends the built-in endpoints.
    pub fn extend_defaults(&mut self) {
        for url in DEFAULT_RPC_URLS {
            self.push(url);
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Returns all endpoint URLs
    pub fn urls(&self) -> Vec<&str> {
        self.endpoints.iter().map(|e| e.url.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    /// Connects to the first candidate that answers `eth_blockNumber`.
    pub async fn select(
        &self,
        connector: &dyn Connector,
        policy: SelectionPolicy,
    ) -> Result<SelectedEndpoint> {
        let Some(last) = self.endpoints.last() else {
            return Err(ProviderError::NoCandidates);
        };

        let mut attempts = Vec::with_capacity(self.endpoints.len());
        let mut last_error = String::new();

        for endpoint in &self.endpoints {
            attempts.push(endpoint.url.clone());
            match probe(connector, endpoint).await {
                Ok(connection) => {
                    info!(endpoint = endpoint.label(), url = %endpoint.url, "Selected endpoint");
                    return Ok(SelectedEndpoint { connection, degraded: false });
                }
                Err(e) => {
                    warn!(
                        endpoint = endpoint.label(),
                        url = %endpoint.url,
                        error = %e,
                        "RPC endpoint probe failed"
                    );
                    last_error = e.to_string();
                }
            }
        }

        match policy {
            SelectionPolicy::Strict => {
                Err(ProviderError::NoReachableEndpoint { attempts, last_error })
            }
            SelectionPolicy::Degraded => {
                warn!(
                    url = %last.url,
                    tried = attempts.len(),
                    "No RPC endpoint reachable, continuing with last candidate"
                );
                let connection = connector.connect(last).await?;
                Ok(SelectedEndpoint { connection, degraded: true })
            }
        }
    }
}

/// Outcome of [`EndpointCandidates::select`].
pub struct SelectedEndpoint {
    /// The connection to use for the lifetime of the adapter.
    pub connection: Arc<dyn RpcConnection>,
    /// True when no probe succeeded and the last candidate was kept regardless.
    pub degraded: bool,
}

impl std::fmt::Debug for SelectedEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedEndpoint")
            .field("url", &self.connection.url())
            .field("degraded", &self.degraded)
            .finish()
    }
}

async fn probe(connector: &dyn Connector, endpoint: &Endpoint) -> Result<Arc<dyn RpcConnection>> {
    let connection = connector.connect(endpoint).await?;
    let timeout = connector.probe_timeout();
    match tokio::time::timeout(timeout, connection.request("eth_blockNumber", Vec::new())).await {
        Ok(Ok(block)) => {
            debug!(url = %endpoint.url, %block, "Probe succeeded");
            Ok(connection)
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(ProviderError::ProbeTimeout { url: endpoint.url.clone(), timeout }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_urls() {
        let candidates = EndpointCandidates::from_urls("http://a.com, http://b.com, ,http://c.com");
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates.urls(), vec!["http://a.com", "http://b.com", "http://c.com"]);
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let candidates = EndpointCandidates::new(["http://b.com", "http://a.com", "http://b.com"]);
        assert_eq!(candidates.urls(), vec!["http://b.com", "http://a.com"]);
    }

    #[test]
    fn test_defaults_follow_override() {
        let mut candidates = EndpointCandidates::new(["http://localhost:8545"]);
        candidates.extend_defaults();
        assert_eq!(candidates.len(), 1 + DEFAULT_RPC_URLS.len());
        assert_eq!(candidates.urls()[0], "http://localhost:8545");
        assert_eq!(candidates.iter().nth(1).unwrap().name.as_deref(), Some("endpoint-1"));
    }

    #[test]
    fn test_selection_policy_from_str() {
        assert_eq!("strict".parse::<SelectionPolicy>().unwrap(), SelectionPolicy::Strict);
        assert_eq!("Degraded".parse::<SelectionPolicy>().unwrap(), SelectionPolicy::Degraded);
        assert!("sometimes".parse::<SelectionPolicy>().is_err());
        assert_eq!(SelectionPolicy::default(), SelectionPolicy::Strict);
    }
}
