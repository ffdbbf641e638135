//! EIP-712 payload normalization and the ordered signing fallback chain.
//!
//! Wallet-consuming code occasionally sends typed data that a strict EIP-712
//! encoder refuses. Signing tries [`TypedDataStrategy::ORDER`] in turn and
//! returns the first signature produced, so the caller always gets a
//! well-formed 65-byte signature unless the key itself cannot sign.

use std::{borrow::Cow, collections::HashSet, fmt};

use alloy_dyn_abi::TypedData;
use alloy_primitives::{Address, B256, Signature, U256, keccak256};
use alloy_sol_types::Eip712Domain;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::{
    chain::parse_chain_id,
    error::{ProviderError, Result},
    identity::SigningIdentity,
};

/// Name of the domain separator type.
pub const DOMAIN_TYPE: &str = "EIP712Domain";

/// Primary type assumed when nothing better can be inferred.
pub const FALLBACK_PRIMARY_TYPE: &str = "Permit";

/// The standard four-field domain type.
fn standard_domain_type() -> Value {
    json!([
        { "name": "name", "type": "string" },
        { "name": "version", "type": "string" },
        { "name": "chainId", "type": "uint256" },
        { "name": "verifyingContract", "type": "address" },
    ])
}

/// A typed-data request parameter after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedDataPayload(Value);

impl TypedDataPayload {
    /// Builds a payload from the request parameter.
    ///
    /// JSON strings are parsed; strings that are not JSON are kept verbatim so
    /// that the digest strategy can still sign them.
    pub fn from_param(param: Option<&Value>) -> Result<Self> {
        let value = match param {
            None | Some(Value::Null) => {
                return Err(ProviderError::invalid_params("missing typed data payload"));
            }
            Some(Value::String(raw)) => serde_json::from_str(raw).unwrap_or_else(|e| {
                debug!(error = %e, "Typed data parameter is not JSON, keeping raw string");
                Value::String(raw.clone())
            }),
            Some(other) => other.clone(),
        };
        Ok(Self::normalize(value))
    }

    /// Adds a missing domain type and primary type where they can be derived.
    pub fn normalize(mut value: Value) -> Self {
        if let Value::Object(map) = &mut value {
            let has_domain = map.get("domain").is_some_and(|d| !d.is_null());
            if has_domain {
                if let Some(Value::Object(types)) = map.get_mut("types") {
                    if !types.contains_key(DOMAIN_TYPE) {
                        types.insert(DOMAIN_TYPE.to_string(), standard_domain_type());
                    }
                }
            }
            if !map.contains_key("primaryType") {
                let primary = infer_primary_type(map.get("types"));
                map.insert("primaryType".to_string(), Value::String(primary));
            }
        }
        Self(value)
    }

    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// The type no other type refers to, else the first non-domain type, else `Permit`.
fn infer_primary_type(types: Option<&Value>) -> String {
    let Some(Value::Object(types)) = types else {
        return FALLBACK_PRIMARY_TYPE.to_string();
    };

    let referenced: HashSet<&str> = types
        .values()
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|field| field.get("type").and_then(Value::as_str))
        .map(|ty| ty.split('[').next().unwrap_or(ty))
        .collect();

    let names: Vec<&String> = types.keys().filter(|name| name.as_str() != DOMAIN_TYPE).collect();
    names
        .iter()
        .find(|name| !referenced.contains(name.as_str()))
        .or_else(|| names.first())
        .map_or_else(|| FALLBACK_PRIMARY_TYPE.to_string(), |name| (*name).clone())
}

/// One way of turning a typed-data payload into a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypedDataStrategy {
    /// Parse the payload as EIP-712 typed data and sign it structurally.
    Structured,
    /// Rebuild the domain leniently, compute the EIP-712 hash and sign it.
    Hashed,
    /// Sign `keccak256` of the serialized payload.
    Digest,
}

impl TypedDataStrategy {
    /// Order in which strategies are attempted.
    pub const ORDER: [Self; 3] = [Self::Structured, Self::Hashed, Self::Digest];

    async fn sign(self, identity: &SigningIdentity, payload: &Value) -> Result<Signature> {
        match self {
            Self::Structured => {
                let typed: TypedData = serde_json::from_value(payload.clone())?;
                identity.sign_typed_data(&typed).await
            }
            Self::Hashed => {
                let hash = lenient_signing_hash(payload)?;
                identity.sign_hash(&hash).await
            }
            Self::Digest => {
                let hash = keccak256(serde_json::to_vec(payload)?);
                identity.sign_hash(&hash).await
            }
        }
    }
}

impl fmt::Display for TypedDataStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::Hashed => write!(f, "hashed"),
            Self::Digest => write!(f, "digest"),
        }
    }
}

/// A signature together with the strategy that produced it.
#[derive(Debug, Clone, Copy)]
pub struct SignedTypedData {
    pub signature: Signature,
    pub strategy: TypedDataStrategy,
}

/// Signs `payload` with the first strategy that succeeds.
pub async fn sign_typed_data(
    identity: &SigningIdentity,
    payload: &TypedDataPayload,
) -> Result<SignedTypedData> {
    let mut last_error = None;
    for strategy in TypedDataStrategy::ORDER {
        match strategy.sign(identity, payload.as_value()).await {
            Ok(signature) => return Ok(SignedTypedData { signature, strategy }),
            Err(e) => {
                debug!(%strategy, error = %e, "Typed data signing strategy failed");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| ProviderError::invalid_params("no signing strategy ran")))
}

/// EIP-712 signing hash with a domain rebuilt from whatever fields parse.
fn lenient_signing_hash(payload: &Value) -> Result<B256> {
    let Value::Object(map) = payload else {
        return Err(ProviderError::invalid_params("typed data payload is not an object"));
    };
    let mut map: Map<String, Value> = map.clone();
    if let Some(domain) = map.get("domain") {
        let domain = serde_json::to_value(lenient_domain(domain))?;
        map.insert("domain".to_string(), domain);
    }
    let typed: TypedData = serde_json::from_value(Value::Object(map))?;
    Ok(typed.eip712_signing_hash()?)
}

fn lenient_domain(domain: &Value) -> Eip712Domain {
    let text = |key: &str| -> Option<Cow<'static, str>> {
        match domain.get(key)? {
            Value::String(s) => Some(Cow::Owned(s.clone())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            _ => None,
        }
    };
    let parsed = |key: &str| domain.get(key).and_then(Value::as_str).map(str::trim);

    Eip712Domain::new(
        text("name"),
        text("version"),
        domain.get("chainId").and_then(parse_chain_id).map(U256::from),
        parsed("verifyingContract").and_then(|s| s.parse::<Address>().ok()),
        parsed("salt").and_then(|s| s.parse::<B256>().ok()),
    )
}
