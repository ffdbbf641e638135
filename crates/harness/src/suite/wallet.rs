//! Tests for accounts, chain handling and mocked or proxied reads.

use alloy_primitives::Address;
use eyre::{Result, WrapErr, ensure};
use mock_provider::{Eip1193Provider, LegacyRpc, MOCK_BALANCE, parse_chain_id};
use serde_json::{Value, json};

use crate::{
    expect::expect_address,
    suite::{Test, TestCategory, TestContext, skip_if_offline},
};

/// Base Sepolia, used as the switch target.
const SWITCH_TARGET: u64 = 84_532;

/// Build the wallet test category.
pub(crate) fn category() -> TestCategory {
    TestCategory {
        name: "wallet".to_string(),
        description: Some("Account exposure, chain switching and balance mocking".to_string()),
        tests: vec![
            Test {
                name: "accounts_stable".to_string(),
                description: Some(
                    "Every account query returns the same single address".to_string(),
                ),
                run: Box::new(|ctx| Box::pin(test_accounts_stable(ctx))),
                skip_if: None,
            },
            Test {
                name: "chain_id_hex".to_string(),
                description: Some(
                    "eth_chainId reports the current chain as lowercase hex".to_string(),
                ),
                run: Box::new(|ctx| Box::pin(test_chain_id_hex(ctx))),
                skip_if: None,
            },
            Test {
                name: "switch_chain".to_string(),
                description: Some(
                    "wallet_switchEthereumChain returns null and updates eth_chainId".to_string(),
                ),
                run: Box::new(|ctx| Box::pin(test_switch_chain(ctx))),
                skip_if: None,
            },
            Test {
                name: "balance_mocked".to_string(),
                description: Some("eth_getBalance reports zero for any address".to_string()),
                run: Box::new(|ctx| Box::pin(test_balance_mocked(ctx))),
                skip_if: None,
            },
            Test {
                name: "block_number_passthrough".to_string(),
                description: Some("eth_blockNumber is answered by the RPC endpoint".to_string()),
                run: Box::new(|ctx| Box::pin(test_block_number_passthrough(ctx))),
                skip_if: Some(Box::new(|ctx| Box::pin(async move { skip_if_offline(ctx) }))),
            },
            Test {
                name: "net_version_decimal".to_string(),
                description: Some("net_version returns a decimal network id".to_string()),
                run: Box::new(|ctx| Box::pin(test_net_version_decimal(ctx))),
                skip_if: None,
            },
        ],
    }
}

async fn test_accounts_stable(ctx: &TestContext) -> Result<()> {
    let provider = &ctx.provider;
    let requested = provider.request("eth_requestAccounts", vec![]).await?;
    let listed = provider.request("eth_accounts", vec![]).await?;
    ensure!(requested == listed, "eth_requestAccounts {requested} != eth_accounts {listed}");

    let accounts: Vec<Address> =
        serde_json::from_value(listed.clone()).wrap_err("accounts are not addresses")?;
    ensure!(accounts == vec![provider.address()], "unexpected accounts: {listed}");
    expect_address(listed[0].as_str().unwrap_or_default())?;

    let legacy = provider.get_accounts().await?;
    ensure!(legacy == accounts, "get_accounts disagrees with eth_accounts");
    Ok(())
}

async fn test_chain_id_hex(ctx: &TestContext) -> Result<()> {
    let chain_id = ctx.provider.request("eth_chainId", vec![]).await?;
    let expected = format!("{:#x}", ctx.provider.chain_id());
    ensure!(chain_id == json!(expected), "eth_chainId returned {chain_id}, expected {expected}");
    Ok(())
}

async fn test_switch_chain(ctx: &TestContext) -> Result<()> {
    let provider = &ctx.provider;
    let original = provider.chain_id();

    let target = json!({ "chainId": format!("{SWITCH_TARGET:#X}") });
    let result = provider.request("wallet_switchEthereumChain", vec![target]).await?;
    ensure!(result == Value::Null, "switch returned {result}");

    let reported = provider.request("eth_chainId", vec![]).await?;
    ensure!(
        reported == json!(format!("{SWITCH_TARGET:#x}")),
        "eth_chainId after switch: {reported}"
    );

    // Restore so later tests see the configured chain.
    provider.request("wallet_switchEthereumChain", vec![json!({ "chainId": original })]).await?;
    let restored = provider.request("eth_chainId", vec![]).await?;
    ensure!(parse_chain_id(&restored) == Some(original), "chain not restored: {restored}");
    Ok(())
}

async fn test_balance_mocked(ctx: &TestContext) -> Result<()> {
    for owner in [ctx.provider.address(), Address::ZERO] {
        let balance =
            ctx.provider.request("eth_getBalance", vec![json!(owner), json!("latest")]).await?;
        ensure!(balance == json!(MOCK_BALANCE), "balance of {owner} is {balance}");
    }
    Ok(())
}

async fn test_block_number_passthrough(ctx: &TestContext) -> Result<()> {
    let raw = ctx.provider.request("eth_blockNumber", vec![]).await?;
    let number = raw
        .as_str()
        .and_then(|s| s.strip_prefix("0x"))
        .and_then(|hex| u64::from_str_radix(hex, 16).ok());
    ensure!(number.is_some(), "eth_blockNumber returned {raw}");
    tracing::debug!(block = number, "Got block number");
    Ok(())
}

async fn test_net_version_decimal(ctx: &TestContext) -> Result<()> {
    let version = ctx.provider.request("net_version", vec![]).await?;
    let parsed = version.as_str().and_then(|s| s.parse::<u64>().ok());
    ensure!(parsed.is_some(), "net_version returned {version}");
    Ok(())
}
