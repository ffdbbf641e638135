//! The EIP-1193 adapter.

use std::{fmt, sync::Arc};

use alloy_primitives::{Address, B256, Bytes, U256, U64, hex, keccak256};
use alloy_rpc_types_eth::{Transaction, TransactionReceipt, TransactionRequest};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, trace, warn};

use crate::{
    chain::{ChainContext, DEFAULT_CHAIN_ID, parse_chain_id},
    connection::{Connector, RpcConnection},
    eip1193::{Eip1193Method, Eip1193Provider, LegacyRpc},
    endpoints::{EndpointCandidates, SelectionPolicy},
    error::{ProviderError, Result},
    identity::{SigningIdentity, signature_hex},
    typed_data::{TypedDataPayload, sign_typed_data},
};

/// Balance reported for every `eth_getBalance` request.
pub const MOCK_BALANCE: &str = "0x0";

/// Wallet stand-in: one local identity, one chain id, one upstream connection.
///
/// Clones share the same chain context and count as the same adapter instance.
#[derive(Clone)]
pub struct MockProvider {
    connection: Arc<dyn RpcConnection>,
    identity: Arc<SigningIdentity>,
    chain: Arc<ChainContext>,
    network: Option<u64>,
    degraded: bool,
}

impl MockProvider {
    /// Wraps an already established connection.
    pub fn new(connection: Arc<dyn RpcConnection>) -> Self {
        Self {
            connection,
            identity: Arc::new(SigningIdentity::deterministic()),
            chain: Arc::new(ChainContext::default()),
            network: None,
            degraded: false,
        }
    }

    /// Selects an endpoint from `candidates` and wraps it.
    pub async fn connect(
        candidates: &EndpointCandidates,
        connector: &dyn Connector,
        policy: SelectionPolicy,
    ) -> Result<Self> {
        let selected = candidates.select(connector, policy).await?;
        let network = match selected.connection.chain_id().await {
            Ok(chain_id) => Some(chain_id),
            Err(e) => {
                debug!(error = %e, "Could not read network of selected endpoint");
                None
            }
        };

        let mut provider = Self::new(selected.connection);
        provider.network = network;
        provider.degraded = selected.degraded;
        Ok(provider)
    }

    pub fn with_identity(mut self, identity: SigningIdentity) -> Self {
        self.identity = Arc::new(identity);
        self
    }

    /// Starts on `chain_id` instead of [`DEFAULT_CHAIN_ID`].
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain = Arc::new(ChainContext::new(chain_id));
        self
    }

    /// The single account this provider reports.
    pub fn address(&self) -> Address {
        self.identity.address()
    }

    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    /// Current chain id as seen by `eth_chainId`.
    pub fn chain_id(&self) -> u64 {
        self.chain.current()
    }

    pub fn endpoint_url(&self) -> &str {
        self.connection.url()
    }

    /// True when no endpoint answered its probe during construction.
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Chain id the endpoint reported at construction, if it answered.
    pub const fn network(&self) -> Option<u64> {
        self.network
    }

    fn accounts(&self) -> Value {
        json!([self.address()])
    }

    async fn dispatch(&self, method: Eip1193Method, params: Vec<Value>) -> Result<Value> {
        match method {
            Eip1193Method::RequestAccounts | Eip1193Method::Accounts => Ok(self.accounts()),
            Eip1193Method::ChainId => Ok(Value::String(self.chain.to_hex())),
            Eip1193Method::NetVersion => Ok(self.net_version().await),
            Eip1193Method::GetBalance => Ok(Value::String(MOCK_BALANCE.to_string())),
            Eip1193Method::BlockNumber => {
                self.connection.request(method.as_str(), Vec::new()).await
            }
            Eip1193Method::SwitchEthereumChain => Ok(self.switch_chain(&params)),
            Eip1193Method::PersonalSign => self.personal_sign(&params).await,
            Eip1193Method::EthSign => self.eth_sign(&params).await,
            Eip1193Method::SignTypedDataV4 | Eip1193Method::SignTypedData => {
                self.sign_typed_data(&params).await
            }
        }
    }

    async fn net_version(&self) -> Value {
        let chain_id = match self.connection.chain_id().await {
            Ok(chain_id) => chain_id,
            Err(e) => {
                debug!(error = %e, fallback = DEFAULT_CHAIN_ID, "net_version falling back");
                DEFAULT_CHAIN_ID
            }
        };
        Value::String(chain_id.to_string())
    }

    /// EIP-3326: always succeeds with `null`.
    fn switch_chain(&self, params: &[Value]) -> Value {
        match params.first().and_then(|p| p.get("chainId")) {
            None => debug!("wallet_switchEthereumChain without chainId, keeping current chain"),
            Some(requested) => match parse_chain_id(requested) {
                Some(chain_id) => {
                    let previous = self.chain.current();
                    self.chain.switch_to(chain_id);
                    debug!(from = previous, to = chain_id, "Switched chain");
                }
                None => warn!(%requested, "Ignoring unparseable chainId"),
            },
        }
        Value::Null
    }

    async fn personal_sign(&self, params: &[Value]) -> Result<Value> {
        let raw = params
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::invalid_params("personal_sign expects a message"))?;

        let signature = match PersonalMessage::decode(raw) {
            PersonalMessage::Text(text) => {
                trace!(len = text.len(), "personal_sign over UTF-8 text");
                self.identity.sign_message(text.as_bytes()).await?
            }
            PersonalMessage::Binary(bytes) => {
                trace!(len = bytes.len(), "personal_sign over raw bytes");
                self.identity.sign_message(&bytes).await?
            }
        };
        Ok(Value::String(signature_hex(&signature)))
    }

    async fn eth_sign(&self, params: &[Value]) -> Result<Value> {
        let raw = params
            .get(1)
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::invalid_params("eth_sign expects [address, data]"))?;
        let data = hex::decode(raw)
            .map_err(|e| ProviderError::invalid_params(format!("eth_sign data is not hex: {e}")))?;

        let signature = self.identity.sign_hash(&keccak256(&data)).await?;
        Ok(Value::String(signature_hex(&signature)))
    }

    async fn sign_typed_data(&self, params: &[Value]) -> Result<Value> {
        let payload = TypedDataPayload::from_param(params.get(1))?;
        let signed = sign_typed_data(&self.identity, &payload).await?;
        debug!(strategy = %signed.strategy, "Signed typed data");
        Ok(Value::String(signature_hex(&signed.signature)))
    }

    async fn forward<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T> {
        let raw = self.connection.request(method, params).await?;
        serde_json::from_value(raw).map_err(|e| ProviderError::Decode {
            method: method.to_string(),
            reason: e.to_string(),
        })
    }

    /// Latest block number of the underlying connection.
    pub async fn get_block_number(&self) -> Result<u64> {
        let number: U64 = self.forward("eth_blockNumber", Vec::new()).await?;
        Ok(number.to())
    }

    /// Chain id the endpoint reports right now.
    pub async fn get_network(&self) -> Result<u64> {
        self.connection.chain_id().await
    }

    /// Real on-chain balance; unlike `eth_getBalance` through `request`, never mocked.
    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        self.forward("eth_getBalance", vec![json!(address), json!("latest")]).await
    }

    pub async fn call(&self, tx: &TransactionRequest) -> Result<Bytes> {
        self.forward("eth_call", vec![serde_json::to_value(tx)?, json!("latest")]).await
    }

    pub async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64> {
        let gas: U64 = self.forward("eth_estimateGas", vec![serde_json::to_value(tx)?]).await?;
        Ok(gas.to())
    }

    pub async fn get_transaction(&self, hash: B256) -> Result<Option<Transaction>> {
        self.forward("eth_getTransactionByHash", vec![json!(hash)]).await
    }

    pub async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        self.forward("eth_getTransactionReceipt", vec![json!(hash)]).await
    }

    pub async fn get_code(&self, address: Address) -> Result<Bytes> {
        self.forward("eth_getCode", vec![json!(address), json!("latest")]).await
    }

    pub async fn get_storage_at(&self, address: Address, slot: U256) -> Result<B256> {
        self.forward("eth_getStorageAt", vec![json!(address), json!(slot), json!("latest")]).await
    }
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("endpoint", &self.connection.url())
            .field("address", &self.address())
            .field("chain_id", &self.chain_id())
            .field("degraded", &self.degraded)
            .finish()
    }
}

#[async_trait]
impl Eip1193Provider for MockProvider {
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        trace!(method, params = params.len(), "Dispatching request");
        match Eip1193Method::from_name(method) {
            Some(known) => self.dispatch(known, params).await,
            None => self.connection.request(method, params).await,
        }
    }
}

#[async_trait]
impl LegacyRpc for MockProvider {
    async fn send(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        match Eip1193Method::from_name(method) {
            Some(Eip1193Method::RequestAccounts | Eip1193Method::Accounts) => Ok(self.accounts()),
            _ => self.connection.request(method, params).await,
        }
    }

    async fn get_accounts(&self) -> Result<Vec<Address>> {
        Ok(vec![self.address()])
    }
}

/// Message handed to `personal_sign`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PersonalMessage {
    Text(String),
    Binary(Vec<u8>),
}

impl PersonalMessage {
    /// `0x` hex is decoded and read as UTF-8 when possible; anything else is signed as text.
    fn decode(raw: &str) -> Self {
        let Some(bytes) = raw.strip_prefix("0x").and_then(|h| hex::decode(h).ok()) else {
            return Self::Text(raw.to_string());
        };
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(e) => Self::Binary(e.into_bytes()),
        }
    }
}
