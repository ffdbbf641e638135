//! Error type shared by every part of the provider.

use std::time::Duration;

use alloy_transport::TransportError;

/// Errors surfaced by [`MockProvider`](crate::MockProvider) and its building blocks.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The candidate endpoint list was empty.
    #[error("no candidate RPC endpoints configured")]
    NoCandidates,

    /// Every candidate endpoint failed its liveness probe.
    #[error(
        "transport error: no reachable RPC endpoint (tried {}): {last_error}",
        attempts.join(", ")
    )]
    NoReachableEndpoint {
        /// URLs that were probed, in order.
        attempts: Vec<String>,
        /// Error reported by the last probe.
        last_error: String,
    },

    /// A liveness probe did not answer in time.
    #[error("transport error: probe of {url} timed out after {timeout:?}")]
    ProbeTimeout {
        /// Probed endpoint.
        url: String,
        /// Probe budget.
        timeout: Duration,
    },

    /// Error returned by the underlying JSON-RPC connection, passed through untouched.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An endpoint URL could not be parsed.
    #[error("invalid RPC URL {url}: {source}")]
    InvalidUrl {
        /// Offending URL.
        url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },

    /// Request parameters were missing or of the wrong shape.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// The local signer rejected the payload.
    #[error("signing failed: {0}")]
    Signing(#[from] alloy_signer::Error),

    /// EIP-712 encoding failed.
    #[error("typed data encoding failed: {0}")]
    TypedData(#[from] alloy_dyn_abi::Error),

    /// (De)serialization of a JSON value failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A response could not be decoded into the expected type.
    #[error("failed to decode {method} response: {reason}")]
    Decode {
        /// Method whose response was being decoded.
        method: String,
        /// Why decoding failed.
        reason: String,
    },
}

impl ProviderError {
    /// Returns true for endpoint selection and transport failures.
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::NoCandidates
                | Self::NoReachableEndpoint { .. }
                | Self::ProbeTimeout { .. }
                | Self::Transport(_)
                | Self::InvalidUrl { .. }
        )
    }

    pub(crate) fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }
}

/// Result alias used across the crate.
pub type Result<T, E = ProviderError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use alloy_transport::TransportErrorKind;

    use super::*;

    #[test]
    fn test_unreachable_is_transport() {
        let err = ProviderError::NoReachableEndpoint {
            attempts: vec!["http://a".to_string(), "http://b".to_string()],
            last_error: "connection refused".to_string(),
        };
        assert!(err.is_transport());
        let msg = err.to_string();
        assert!(msg.contains("transport error"));
        assert!(msg.contains("http://a, http://b"));
    }

    #[test]
    fn test_forwarded_error_is_verbatim() {
        let err: ProviderError = TransportErrorKind::custom_str("backend exploded").into();
        assert!(err.is_transport());
        assert!(err.to_string().contains("backend exploded"));
    }

    #[test]
    fn test_invalid_params_is_not_transport() {
        assert!(!ProviderError::invalid_params("missing").is_transport());
    }
}
