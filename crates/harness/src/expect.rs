//! Assertion helpers for SDK results.

use eyre::{Result, ensure};
use serde_json::Value;

fn is_prefixed_hex(value: &str, digits: usize) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == digits && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// The result object carries `success: true`.
pub fn expect_success(result: &Value) -> Result<()> {
    ensure!(
        result.get("success").and_then(Value::as_bool) == Some(true),
        "expected success: true, got {result}"
    );
    Ok(())
}

/// `0x` followed by 64 hex digits.
pub fn expect_tx_hash(hash: &str) -> Result<()> {
    ensure!(is_prefixed_hex(hash, 64), "invalid transaction hash: {hash}");
    Ok(())
}

/// Explorer links are optional; when present they must be HTTPS.
pub fn expect_explorer_url(url: Option<&str>) -> Result<()> {
    if let Some(url) = url {
        ensure!(url.contains("https://"), "explorer url is not https: {url}");
    }
    Ok(())
}

/// `0x` followed by 130 hex digits (r, s and v).
pub fn expect_signature(signature: &str) -> Result<()> {
    ensure!(is_prefixed_hex(signature, 130), "invalid signature: {signature}");
    Ok(())
}

pub fn expect_address(address: &str) -> Result<()> {
    ensure!(is_prefixed_hex(address, 40), "invalid address: {address}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_expect_success() {
        assert!(expect_success(&json!({ "success": true, "explorerUrl": "https://x" })).is_ok());
        assert!(expect_success(&json!({ "success": false })).is_err());
        assert!(expect_success(&json!({ "success": "true" })).is_err());
        assert!(expect_success(&json!({})).is_err());
    }

    #[test]
    fn test_expect_tx_hash() {
        assert!(expect_tx_hash(&format!("0x{}", "aB".repeat(32))).is_ok());
        assert!(expect_tx_hash(&"ab".repeat(33)).is_err());
        assert!(expect_tx_hash(&format!("0x{}", "a".repeat(63))).is_err());
        assert!(expect_tx_hash(&format!("0x{}g", "a".repeat(63))).is_err());
    }

    #[test]
    fn test_expect_explorer_url() {
        assert!(expect_explorer_url(None).is_ok());
        assert!(expect_explorer_url(Some("https://sepolia.etherscan.io/tx/0x1")).is_ok());
        assert!(expect_explorer_url(Some("http://insecure")).is_err());
    }

    #[test]
    fn test_expect_signature_and_address() {
        assert!(expect_signature(&format!("0x{}1b", "0".repeat(128))).is_ok());
        assert!(expect_signature("0x1234").is_err());
        assert!(expect_address("0x19e7e376e7c213b7e7e7e46cc70a5dd086daff2a").is_ok());
        assert!(expect_address("19e7e376e7c213b7e7e7e46cc70a5dd086daff2a").is_err());
    }
}
