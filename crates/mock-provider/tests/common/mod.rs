//! Stub connections shared by the integration tests.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

use alloy_transport::TransportErrorKind;
use async_trait::async_trait;
use mock_provider::{Connector, Endpoint, ProviderError, RpcConnection};
use serde_json::{Value, json};

/// Records every call and answers from a fixed table.
///
/// Methods without a canned response echo `{ method, params }` back.
#[derive(Debug, Default)]
pub struct StubConnection {
    url: String,
    responses: HashMap<String, Value>,
    unreachable: bool,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl StubConnection {
    pub fn new(url: &str) -> Self {
        Self { url: url.to_string(), ..Default::default() }
    }

    pub fn unreachable(url: &str) -> Self {
        Self { unreachable: true, ..Self::new(url) }
    }

    pub fn with_response(mut self, method: &str, result: Value) -> Self {
        self.responses.insert(method.to_string(), result);
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RpcConnection for StubConnection {
    fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, ProviderError> {
        self.calls.lock().unwrap().push((method.to_string(), params.clone()));
        if self.unreachable {
            return Err(TransportErrorKind::custom_str(&format!("{} unreachable", self.url)).into());
        }
        Ok(self
            .responses
            .get(method)
            .cloned()
            .unwrap_or_else(|| json!({ "method": method, "params": params })))
    }
}

/// Hands out stub connections; URLs listed as down fail their probe.
#[derive(Debug, Default)]
pub struct StubConnector {
    down: HashSet<String>,
    hang: HashSet<String>,
    connected: Mutex<Vec<String>>,
}

impl StubConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_down(mut self, url: &str) -> Self {
        self.down.insert(url.to_string());
        self
    }

    pub fn with_hanging(mut self, url: &str) -> Self {
        self.hang.insert(url.to_string());
        self
    }

    pub fn connected(&self) -> Vec<String> {
        self.connected.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for StubConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn RpcConnection>, ProviderError> {
        self.connected.lock().unwrap().push(endpoint.url.clone());
        if self.hang.contains(&endpoint.url) {
            return Ok(Arc::new(HangingConnection { url: endpoint.url.clone() }));
        }
        let stub = if self.down.contains(&endpoint.url) {
            StubConnection::unreachable(&endpoint.url)
        } else {
            StubConnection::new(&endpoint.url)
                .with_response("eth_blockNumber", json!("0x10"))
                .with_response("eth_chainId", json!("0xaa36a7"))
        };
        Ok(Arc::new(stub))
    }

    fn probe_timeout(&self) -> Duration {
        Duration::from_millis(50)
    }
}

/// Never answers.
#[derive(Debug)]
struct HangingConnection {
    url: String,
}

#[async_trait]
impl RpcConnection for HangingConnection {
    fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, _method: &str, _params: Vec<Value>) -> Result<Value, ProviderError> {
        std::future::pending().await
    }
}
