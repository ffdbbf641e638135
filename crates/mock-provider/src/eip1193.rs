//! Request interfaces exposed to wallet-consuming code.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// The `{ method, params }` object passed to `request`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestArguments {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Value>>,
}

impl RequestArguments {
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self { method: method.into(), params: Some(params) }
    }
}

/// EIP-1193 request surface.
#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    /// Dispatches `method` with positional `params`.
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value>;

    /// Same as [`request`](Self::request), taking the object form.
    async fn request_with(&self, args: RequestArguments) -> Result<Value> {
        self.request(&args.method, args.params.unwrap_or_default()).await
    }
}

/// Request/response surface of conventional RPC clients.
#[async_trait]
pub trait LegacyRpc: Send + Sync {
    /// Sends a raw request; only account queries are answered locally.
    async fn send(&self, method: &str, params: Vec<Value>) -> Result<Value>;

    /// Accounts the wallet exposes.
    async fn get_accounts(&self) -> Result<Vec<alloy_primitives::Address>>;
}

/// Methods answered by the adapter itself instead of the underlying connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eip1193Method {
    RequestAccounts,
    Accounts,
    ChainId,
    NetVersion,
    GetBalance,
    BlockNumber,
    SwitchEthereumChain,
    PersonalSign,
    EthSign,
    SignTypedDataV4,
    SignTypedData,
}

impl Eip1193Method {
    /// Exact, case-sensitive lookup. `None` means the call is forwarded.
    pub fn from_name(name: &str) -> Option<Self> {
        let method = match name {
            "eth_requestAccounts" => Self::RequestAccounts,
            "eth_accounts" => Self::Accounts,
            "eth_chainId" => Self::ChainId,
            "net_version" => Self::NetVersion,
            "eth_getBalance" => Self::GetBalance,
            "eth_blockNumber" => Self::BlockNumber,
            "wallet_switchEthereumChain" => Self::SwitchEthereumChain,
            "personal_sign" => Self::PersonalSign,
            "eth_sign" => Self::EthSign,
            "eth_signTypedData_v4" => Self::SignTypedDataV4,
            "eth_signTypedData" => Self::SignTypedData,
            _ => return None,
        };
        Some(method)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RequestAccounts => "eth_requestAccounts",
            Self::Accounts => "eth_accounts",
            Self::ChainId => "eth_chainId",
            Self::NetVersion => "net_version",
            Self::GetBalance => "eth_getBalance",
            Self::BlockNumber => "eth_blockNumber",
            Self::SwitchEthereumChain => "wallet_switchEthereumChain",
            Self::PersonalSign => "personal_sign",
            Self::EthSign => "eth_sign",
            Self::SignTypedDataV4 => "eth_signTypedData_v4",
            Self::SignTypedData => "eth_signTypedData",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_method_lookup_is_case_sensitive() {
        assert_eq!(Eip1193Method::from_name("eth_chainId"), Some(Eip1193Method::ChainId));
        assert_eq!(Eip1193Method::from_name("eth_chainid"), None);
        assert_eq!(Eip1193Method::from_name("eth_call"), None);
    }

    #[test]
    fn test_method_names_round_trip() {
        let names = ["eth_requestAccounts", "personal_sign", "eth_signTypedData_v4", "net_version"];
        for name in names {
            assert_eq!(Eip1193Method::from_name(name).unwrap().as_str(), name);
        }
    }

    #[test]
    fn test_request_arguments_params_optional() {
        let args: RequestArguments =
            serde_json::from_value(json!({ "method": "eth_accounts" })).unwrap();
        assert_eq!(args.method, "eth_accounts");
        assert!(args.params.is_none());
    }
}
