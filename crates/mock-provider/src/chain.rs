//! Mutable chain id of a single adapter instance.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

/// Sepolia, the network the adapter reports until told otherwise.
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;

/// Current chain id. Switching is an unconditional store; readers see the last write.
#[derive(Debug)]
pub struct ChainContext {
    current: AtomicU64,
}

impl ChainContext {
    pub const fn new(chain_id: u64) -> Self {
        Self { current: AtomicU64::new(chain_id) }
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Relaxed)
    }

    pub fn switch_to(&self, chain_id: u64) {
        self.current.store(chain_id, Ordering::Relaxed);
    }

    /// Lowercase hex with `0x` prefix, as `eth_chainId` returns it.
    pub fn to_hex(&self) -> String {
        format!("{:#x}", self.current())
    }
}

impl Default for ChainContext {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIN_ID)
    }
}

/// Parses a chain id given as `0x` hex string, decimal string or JSON number.
///
/// Floats are accepted only when integral (`1.0`). Values outside `u64` are `None`.
pub fn parse_chain_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f < u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16).ok(),
                None => s.parse().ok(),
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_default_is_sepolia() {
        let ctx = ChainContext::default();
        assert_eq!(ctx.current(), DEFAULT_CHAIN_ID);
        assert_eq!(ctx.to_hex(), "0xaa36a7");
    }

    #[test]
    fn test_switch_is_visible() {
        let ctx = ChainContext::default();
        ctx.switch_to(84532);
        assert_eq!(ctx.current(), 84532);
        assert_eq!(ctx.to_hex(), "0x14a34");
    }

    #[test]
    fn test_parse_chain_id_forms() {
        assert_eq!(parse_chain_id(&json!("0xAA36A7")), Some(11_155_111));
        assert_eq!(parse_chain_id(&json!("0xaa36a7")), Some(11_155_111));
        assert_eq!(parse_chain_id(&json!("11155420")), Some(11_155_420));
        assert_eq!(parse_chain_id(&json!(1)), Some(1));
        assert_eq!(parse_chain_id(&json!(-1)), None);
        assert_eq!(parse_chain_id(&json!(1.0)), Some(1));
        assert_eq!(parse_chain_id(&json!(84532.0)), Some(84_532));
        assert_eq!(parse_chain_id(&json!(1.5)), None);
        assert_eq!(parse_chain_id(&json!(-2.0)), None);
        assert_eq!(parse_chain_id(&json!(1e30)), None);
        assert_eq!(parse_chain_id(&json!("0x10000000000000000")), None);
        assert_eq!(parse_chain_id(&json!("0x")), None);
        assert_eq!(parse_chain_id(&json!("sepolia")), None);
        assert_eq!(parse_chain_id(&json!(null)), None);
    }
}
