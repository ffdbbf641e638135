//! Offline connections and a recording SDK for harness tests.

#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use mock_provider::{Connector, Endpoint, MockProvider, ProviderError, RpcConnection};
use nexus_harness::{Network, Sdk};
use serde_json::{Value, json};

/// Answers the handful of reads the suite needs; `down` fails every request.
#[derive(Debug)]
pub struct StaticConnection {
    url: String,
    down: bool,
}

#[async_trait]
impl RpcConnection for StaticConnection {
    fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, method: &str, _params: Vec<Value>) -> Result<Value, ProviderError> {
        if self.down {
            return Err(ProviderError::InvalidParams(format!("{} is down", self.url)));
        }
        match method {
            "eth_blockNumber" => Ok(json!("0x6f2b3c")),
            "eth_chainId" => Ok(json!("0xaa36a7")),
            _ => Ok(Value::Null),
        }
    }
}

#[derive(Debug, Default)]
pub struct StaticConnector {
    pub down: bool,
    pub connects: AtomicUsize,
}

impl StaticConnector {
    pub fn up() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn down() -> Arc<Self> {
        Arc::new(Self { down: true, ..Default::default() })
    }
}

#[async_trait]
impl Connector for StaticConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn RpcConnection>, ProviderError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(StaticConnection { url: endpoint.url.clone(), down: self.down }))
    }

    fn probe_timeout(&self) -> Duration {
        Duration::from_millis(50)
    }
}

/// Provider over a healthy static connection.
pub fn online_provider() -> MockProvider {
    MockProvider::new(Arc::new(StaticConnection { url: "http://static".to_string(), down: false }))
}

/// Provider whose connection fails every request.
pub fn offline_provider() -> MockProvider {
    MockProvider::new(Arc::new(StaticConnection { url: "http://offline".to_string(), down: true }))
}

/// Counts lifecycle calls shared by every SDK a session builds.
#[derive(Debug, Default)]
pub struct SdkCounters {
    pub created: AtomicUsize,
    pub initialized: AtomicUsize,
    pub deinitialized: AtomicUsize,
}

impl SdkCounters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct FakeSdk {
    pub network: Network,
    pub provider: Option<MockProvider>,
    counters: Arc<SdkCounters>,
    fail_init: bool,
    fail_deinit: bool,
}

impl FakeSdk {
    pub fn factory(
        counters: Arc<SdkCounters>,
        fail_init: bool,
        fail_deinit: bool,
    ) -> impl Fn(Network) -> Self + Send + Sync + 'static {
        move |network| {
            counters.created.fetch_add(1, Ordering::SeqCst);
            Self { network, provider: None, counters: counters.clone(), fail_init, fail_deinit }
        }
    }
}

#[async_trait]
impl Sdk for FakeSdk {
    async fn initialize(&mut self, provider: MockProvider) -> eyre::Result<()> {
        self.counters.initialized.fetch_add(1, Ordering::SeqCst);
        eyre::ensure!(!self.fail_init, "wallet rejected connection");
        self.provider = Some(provider);
        Ok(())
    }

    async fn deinit(&self) -> eyre::Result<()> {
        self.counters.deinitialized.fetch_add(1, Ordering::SeqCst);
        eyre::ensure!(!self.fail_deinit, "socket already closed");
        Ok(())
    }
}
