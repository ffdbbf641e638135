//! The fixed key pair every adapter signs with.

use alloy_dyn_abi::TypedData;
use alloy_primitives::{Address, B256, Signature, hex};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;

use crate::error::{ProviderError, Result};

/// Fixed test key: 32 bytes of `0x11`. Never holds funds.
pub const TEST_KEY: B256 = B256::repeat_byte(0x11);

/// [`TEST_KEY`] as a `0x` hex string.
pub const TEST_PRIVATE_KEY: &str =
    "0x1111111111111111111111111111111111111111111111111111111111111111";

/// The single key pair an adapter signs with.
#[derive(Debug, Clone)]
pub struct SigningIdentity {
    signer: PrivateKeySigner,
}

impl SigningIdentity {
    /// Identity derived from [`TEST_KEY`].
    ///
    /// # Panics
    ///
    /// Never in practice: [`TEST_KEY`] is a nonzero scalar below the secp256k1
    /// group order, which is the only condition `from_bytes` checks.
    pub fn deterministic() -> Self {
        let signer = PrivateKeySigner::from_bytes(&TEST_KEY)
            .expect("0x11-repeated key is a valid secp256k1 scalar");
        Self { signer }
    }

    /// Parses a private key from hex string (with or without 0x prefix)
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let key = hex_key.strip_prefix("0x").unwrap_or(hex_key);
        let signer = key
            .parse::<PrivateKeySigner>()
            .map_err(|e| ProviderError::invalid_params(format!("invalid private key: {e}")))?;
        Ok(Self { signer })
    }

    /// The only account this identity reports.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// EIP-191 personal message signature.
    pub async fn sign_message(&self, message: &[u8]) -> Result<Signature> {
        Ok(self.signer.sign_message(message).await?)
    }

    /// Signs a 32-byte digest as is, without any prefix.
    pub async fn sign_hash(&self, hash: &B256) -> Result<Signature> {
        Ok(self.signer.sign_hash(hash).await?)
    }

    /// EIP-712 signature over a fully parsed payload.
    pub async fn sign_typed_data(&self, payload: &TypedData) -> Result<Signature> {
        Ok(self.signer.sign_dynamic_typed_data(payload).await?)
    }
}

impl Default for SigningIdentity {
    fn default() -> Self {
        Self::deterministic()
    }
}

/// Serializes a signature as `0x` followed by r, s and v (65 bytes).
pub fn signature_hex(signature: &Signature) -> String {
    hex::encode_prefixed(signature.as_bytes())
}
