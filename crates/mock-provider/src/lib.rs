//! Scriptable EIP-1193 wallet provider for end-to-end tests.
//!
//! [`MockProvider`] answers account, chain and signing requests locally with a
//! deterministic test key and forwards everything else to a JSON-RPC endpoint
//! selected from an ordered candidate list.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod chain;
pub use chain::{ChainContext, DEFAULT_CHAIN_ID, parse_chain_id};

mod connection;
pub use connection::{
    Connector, DEFAULT_PROBE_TIMEOUT, HttpConnection, HttpConnector, RpcConnection,
    create_shared_client,
};

mod eip1193;
pub use eip1193::{Eip1193Method, Eip1193Provider, LegacyRpc, RequestArguments};

mod endpoints;
pub use endpoints::{
    DEFAULT_RPC_URLS, Endpoint, EndpointCandidates, RPC_URL_ENV, SelectedEndpoint,
    SelectionPolicy,
};

mod error;
pub use error::{ProviderError, Result};

mod identity;
pub use identity::{SigningIdentity, TEST_KEY, TEST_PRIVATE_KEY, signature_hex};

mod provider;
pub use provider::{MOCK_BALANCE, MockProvider};

pub mod typed_data;
pub use typed_data::{SignedTypedData, TypedDataPayload, TypedDataStrategy};

// Re-exported so callers can build connections and typed payloads without extra deps.
pub use alloy_primitives;
pub use serde_json;
