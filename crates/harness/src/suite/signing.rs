//! Tests for message and typed-data signing.

use alloy_primitives::{Signature, hex, keccak256};
use eyre::{Result, WrapErr, ensure};
use mock_provider::{
    Eip1193Provider, TypedDataPayload, TypedDataStrategy, signature_hex,
    typed_data::sign_typed_data,
};
use serde_json::{Value, json};

use crate::{
    expect::expect_signature,
    suite::{Test, TestCategory, TestContext},
};

/// Build the signing test category.
pub(crate) fn category() -> TestCategory {
    TestCategory {
        name: "signing".to_string(),
        description: Some("Signatures recover to the wallet address".to_string()),
        tests: vec![
            Test {
                name: "personal_sign_recovers".to_string(),
                description: Some("personal_sign over hex-encoded UTF-8".to_string()),
                run: Box::new(|ctx| Box::pin(test_personal_sign_recovers(ctx))),
                skip_if: None,
            },
            Test {
                name: "eth_sign_recovers".to_string(),
                description: Some(
                    "eth_sign signs keccak256 of the data without prefix".to_string(),
                ),
                run: Box::new(|ctx| Box::pin(test_eth_sign_recovers(ctx))),
                skip_if: None,
            },
            Test {
                name: "typed_data_structured".to_string(),
                description: Some(
                    "Well-formed typed data missing EIP712Domain signs structurally".to_string(),
                ),
                run: Box::new(|ctx| Box::pin(test_typed_data_structured(ctx))),
                skip_if: None,
            },
            Test {
                name: "typed_data_malformed_fallback".to_string(),
                description: Some("Malformed typed data still yields a signature".to_string()),
                run: Box::new(|ctx| Box::pin(test_typed_data_malformed_fallback(ctx))),
                skip_if: None,
            },
        ],
    }
}

fn parse_signature(value: &Value) -> Result<Signature> {
    let text = value.as_str().unwrap_or_default();
    expect_signature(text)?;
    text.parse().wrap_err("signature does not parse")
}

fn intent_payload(chain_id: u64) -> Value {
    json!({
        "types": {
            "Intent": [
                { "name": "sourceChainId", "type": "uint256" },
                { "name": "destinationChainId", "type": "uint256" },
                { "name": "token", "type": "string" },
                { "name": "amount", "type": "uint256" }
            ]
        },
        "domain": {
            "name": "Nexus",
            "version": "1",
            "chainId": chain_id,
            "verifyingContract": "0x0000000000000000000000000000000000000abc"
        },
        "message": {
            "sourceChainId": chain_id.to_string(),
            "destinationChainId": "11155420",
            "token": "USDC",
            "amount": "10000"
        }
    })
}

async fn test_personal_sign_recovers(ctx: &TestContext) -> Result<()> {
    let message = "Nexus harness login";
    let params = vec![json!(hex::encode_prefixed(message)), json!(ctx.provider.address())];
    let raw = ctx.provider.request("personal_sign", params).await?;

    let recovered = parse_signature(&raw)?.recover_address_from_msg(message)?;
    ensure!(recovered == ctx.provider.address(), "recovered {recovered}");
    Ok(())
}

async fn test_eth_sign_recovers(ctx: &TestContext) -> Result<()> {
    let data = [0xde, 0xad, 0xbe, 0xef];
    let params = vec![json!(ctx.provider.address()), json!(hex::encode_prefixed(data))];
    let raw = ctx.provider.request("eth_sign", params).await?;

    let recovered = parse_signature(&raw)?.recover_address_from_prehash(&keccak256(data))?;
    ensure!(recovered == ctx.provider.address(), "recovered {recovered}");
    Ok(())
}

async fn test_typed_data_structured(ctx: &TestContext) -> Result<()> {
    let payload = intent_payload(ctx.provider.chain_id());
    let params = vec![json!(ctx.provider.address()), json!(payload.to_string())];
    let raw = ctx.provider.request("eth_signTypedData_v4", params).await?;
    parse_signature(&raw)?;

    let normalized = TypedDataPayload::normalize(payload);
    let expected = sign_typed_data(ctx.provider.identity(), &normalized).await?;
    ensure!(
        expected.strategy == TypedDataStrategy::Structured,
        "payload fell back to {}",
        expected.strategy
    );
    ensure!(
        raw == json!(signature_hex(&expected.signature)),
        "signature differs from direct signing"
    );
    Ok(())
}

async fn test_typed_data_malformed_fallback(ctx: &TestContext) -> Result<()> {
    let mut payload = intent_payload(ctx.provider.chain_id());
    payload["message"]["amount"] = json!("ten thousand");
    payload["domain"]["verifyingContract"] = json!("nowhere");

    let raw = ctx
        .provider
        .request("eth_signTypedData", vec![json!(ctx.provider.address()), payload])
        .await?;
    parse_signature(&raw)?;
    Ok(())
}
