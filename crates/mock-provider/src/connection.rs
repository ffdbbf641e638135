//! Underlying JSON-RPC connection the adapter forwards to.

use std::{borrow::Cow, fmt, sync::Arc, time::Duration};

use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_transport_http::Http;
use async_trait::async_trait;
use serde_json::Value;

use crate::{
    chain::parse_chain_id,
    endpoints::Endpoint,
    error::{ProviderError, Result},
};

/// Default budget for a single liveness probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// A long-lived JSON-RPC client bound to one endpoint.
#[async_trait]
pub trait RpcConnection: Send + Sync + 'static {
    /// Endpoint this connection talks to.
    fn url(&self) -> &str;

    /// Sends `method` with `params` and returns the raw result.
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value>;

    /// Chain id reported by the endpoint.
    async fn chain_id(&self) -> Result<u64> {
        let raw = self.request("eth_chainId", Vec::new()).await?;
        parse_chain_id(&raw).ok_or_else(|| ProviderError::Decode {
            method: "eth_chainId".to_string(),
            reason: format!("not a chain id: {raw}"),
        })
    }
}

/// Opens connections to candidate endpoints.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `endpoint`. Must not perform network I/O beyond client setup.
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn RpcConnection>>;

    /// Upper bound for each liveness probe.
    fn probe_timeout(&self) -> Duration {
        DEFAULT_PROBE_TIMEOUT
    }
}

/// Creates a shared HTTP client with pooled, keep-alive connections.
pub fn create_shared_client(request_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(8)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .timeout(request_timeout)
        .build()
        .map_err(|e| ProviderError::invalid_params(format!("failed to build HTTP client: {e}")))
}

/// Connection over HTTP backed by an alloy [`RootProvider`].
#[derive(Clone)]
pub struct HttpConnection {
    url: String,
    provider: RootProvider,
}

impl HttpConnection {
    /// Creates a provider without a wallet; the adapter does its own signing.
    pub fn new(http_client: reqwest::Client, rpc_url: &str) -> Result<Self> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|source| ProviderError::InvalidUrl { url: rpc_url.to_string(), source })?;
        let http = Http::with_client(http_client, url);
        let rpc_client = RpcClient::new(http, false);
        Ok(Self { url: rpc_url.to_string(), provider: RootProvider::new(rpc_client) })
    }

    /// The wrapped alloy provider.
    pub const fn provider(&self) -> &RootProvider {
        &self.provider
    }
}

impl fmt::Debug for HttpConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConnection").field("url", &self.url).finish_non_exhaustive()
    }
}

#[async_trait]
impl RpcConnection for HttpConnection {
    fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let method: Cow<'static, str> = Cow::Owned(method.to_string());
        Ok(self.provider.raw_request::<_, Value>(method, params).await?)
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }
}

/// Builds [`HttpConnection`]s sharing one pooled HTTP client.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: reqwest::Client,
    probe_timeout: Duration,
}

impl HttpConnector {
    pub fn new(request_timeout: Duration, probe_timeout: Duration) -> Result<Self> {
        Ok(Self { client: create_shared_client(request_timeout)?, probe_timeout })
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn RpcConnection>> {
        let connection = HttpConnection::new(self.client.clone(), &endpoint.url)?;
        Ok(Arc::new(connection))
    }

    fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_connection_rejects_bad_url() {
        let client = create_shared_client(Duration::from_secs(5)).unwrap();
        let err = HttpConnection::new(client, "not a url").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidUrl { .. }));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_connector_keeps_url() {
        let connector =
            HttpConnector::new(Duration::from_secs(5), Duration::from_millis(250)).unwrap();
        let conn = connector.connect(&Endpoint::new("http://127.0.0.1:1")).await.unwrap();
        assert_eq!(conn.url(), "http://127.0.0.1:1");
        assert_eq!(connector.probe_timeout(), Duration::from_millis(250));
    }
}
