use crate::common::{
    decode_raw, explicit_accounts, methods, pipeline, remote_config, scripted_node, send_transaction,
    test_keys, GAS_PRICE,
};
use ethers::{
    providers::{Middleware, Provider},
    types::{Address, U256},
};
use futures::future::join_all;
use rigging_primitives::{GasConfig, JsonRpcCall, NetworkConfig};
use rigging_provider::{ProviderError, Transport};
use serde_json::json;
use std::time::Duration;

const RECIPIENT: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

#[tokio::test]
async fn remote_transaction_arrives_populated_and_signed() -> eyre::Result<()> {
    let keys = test_keys(1);
    let node = scripted_node(1, "Geth/v1.13.5-stable");
    let client = pipeline(&node, &remote_config(Some(1), Some(explicit_accounts(&keys))))?;

    client.send(send_transaction(json!({ "to": RECIPIENT, "value": "0x1" }))).await?;

    assert_eq!(
        methods(&node),
        vec![
            "eth_chainId",
            "eth_gasPrice",
            "web3_clientVersion",
            "eth_estimateGas",
            "eth_chainId",
            "eth_getTransactionCount",
            "eth_sendRawTransaction",
        ]
    );
    assert_eq!(node.calls_to("eth_estimateGas")[0].params[0]["from"], json!(keys[0].address()));
    assert_eq!(node.count("eth_sendTransaction"), 0);

    let (tx, sender) = decode_raw(&node.calls_to("eth_sendRawTransaction")[0])?;
    assert_eq!(sender, keys[0].address());
    assert_eq!(tx.gas(), Some(&U256::from(1000)));
    assert_eq!(tx.gas_price().map(|price| json!(price)), Some(json!(GAS_PRICE)));
    assert_eq!(tx.to_addr(), Some(&RECIPIENT.parse::<Address>()?));
    assert_eq!(tx.chain_id().map(|id| id.as_u64()), Some(1));
    Ok(())
}

#[tokio::test]
async fn chain_id_mismatch_is_sticky() -> eyre::Result<()> {
    let node = scripted_node(5, "Geth/v1.13.5-stable");
    let client = pipeline(&node, &remote_config(Some(1), None))?;

    for call in [
        JsonRpcCall::bare("eth_blockNumber"),
        send_transaction(json!({ "to": RECIPIENT })),
        JsonRpcCall::bare("eth_chainId"),
    ] {
        let err = client.send(call).await.unwrap_err();
        assert!(matches!(err, ProviderError::ChainIdMismatch { configured: 1, actual: 5 }));
    }
    assert_eq!(methods(&node), vec!["eth_chainId"]);
    Ok(())
}

#[tokio::test]
async fn configured_multiplier_scales_estimates() -> eyre::Result<()> {
    let node = scripted_node(1, "Geth/v1.13.5-stable");
    let NetworkConfig::Remote(mut config) = remote_config(None, None) else { unreachable!() };
    config.gas = GasConfig::Auto(1.25);
    let client = pipeline(&node, &NetworkConfig::Remote(config))?;

    client.send(send_transaction(json!({ "from": RECIPIENT }))).await?;
    assert_eq!(node.calls_to("eth_sendTransaction")[0].params[0]["gas"], json!("0x4e2"));
    Ok(())
}

#[tokio::test]
async fn underestimating_node_gets_inflated_estimates() -> eyre::Result<()> {
    let node = scripted_node(1337, "EthereumJS TestRPC/v2.13.2/ethereum-js (ganache)");
    let client = pipeline(&node, &remote_config(None, None))?;

    client.send(send_transaction(json!({ "from": RECIPIENT }))).await?;
    assert_eq!(node.calls_to("eth_sendTransaction")[0].params[0]["gas"], json!("0x4e2"));

    let estimate = client.send(JsonRpcCall::new("eth_estimateGas", vec![json!({})])).await?;
    assert_eq!(estimate, json!("0x4e2"));
    assert_eq!(node.count("web3_clientVersion"), 1);
    Ok(())
}

#[tokio::test]
async fn default_sender_is_the_first_account() -> eyre::Result<()> {
    let keys = test_keys(2);
    let node = scripted_node(1, "Geth/v1.13.5-stable");
    let client = pipeline(&node, &remote_config(None, Some(explicit_accounts(&keys))))?;

    client.send(send_transaction(json!({ "to": RECIPIENT }))).await?;
    let (_, sender) = decode_raw(&node.calls_to("eth_sendRawTransaction")[0])?;
    assert_eq!(sender, keys[0].address());

    let call = JsonRpcCall::new("eth_call", vec![json!({ "to": RECIPIENT }), json!("latest")]);
    let _ = client.send(call).await;
    assert_eq!(node.calls_to("eth_call")[0].params[0]["from"], json!(keys[0].address()));
    Ok(())
}

#[tokio::test]
async fn concurrent_callers_share_the_default_sender() -> eyre::Result<()> {
    let a = Address::repeat_byte(0xaa);
    let b = Address::repeat_byte(0xbb);
    let node = scripted_node(1, "Geth/v1.13.5-stable")
        .with_result("eth_accounts", json!([a, b]))
        .with_delay(Duration::from_millis(10));
    let client = pipeline(&node, &remote_config(None, None))?;

    let results = join_all((0..4).map(|_| {
        let client = client.clone();
        async move { client.send(send_transaction(json!({ "to": RECIPIENT }))).await }
    }))
    .await;
    for result in results {
        result?;
    }

    assert_eq!(node.count("eth_accounts"), 1);
    for call in node.calls_to("eth_sendTransaction") {
        assert_eq!(call.params[0]["from"], json!(a));
    }
    Ok(())
}

#[tokio::test]
async fn concurrent_callers_default_to_the_first_configured_account() -> eyre::Result<()> {
    let keys = test_keys(2);
    let node = scripted_node(1, "Geth/v1.13.5-stable").with_delay(Duration::from_millis(10));
    let client = pipeline(&node, &remote_config(None, Some(explicit_accounts(&keys))))?;

    let results = join_all((0..4).map(|_| {
        let client = client.clone();
        async move { client.send(send_transaction(json!({ "to": RECIPIENT }))).await }
    }))
    .await;
    for result in results {
        result?;
    }

    assert_eq!(node.count("eth_accounts"), 0);
    let raw = node.calls_to("eth_sendRawTransaction");
    assert_eq!(raw.len(), 4);
    for call in &raw {
        let (_, sender) = decode_raw(call)?;
        assert_eq!(sender, keys[0].address());
    }
    for call in node.calls_to("eth_getTransactionCount") {
        assert_eq!(call.params[0], json!(keys[0].address()));
    }
    Ok(())
}

#[tokio::test]
async fn unknown_sender_is_rejected_without_poisoning_the_pipeline() -> eyre::Result<()> {
    let keys = test_keys(1);
    let node = scripted_node(1, "Geth/v1.13.5-stable");
    let client = pipeline(&node, &remote_config(Some(1), Some(explicit_accounts(&keys))))?;

    let stranger = Address::repeat_byte(0x42);
    let err = client
        .send(send_transaction(json!({ "from": stranger, "to": RECIPIENT })))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::UnknownAccount { address } if address == stranger));

    client.send(send_transaction(json!({ "to": RECIPIENT }))).await?;
    assert_eq!(node.count("eth_sendRawTransaction"), 1);
    Ok(())
}

#[tokio::test]
async fn identical_builds_issue_identical_calls() -> eyre::Result<()> {
    let keys = test_keys(3);
    let config = remote_config(Some(1), Some(explicit_accounts(&keys)));

    let mut runs = Vec::new();
    for _ in 0..2 {
        let node = scripted_node(1, "Geth/v1.13.5-stable");
        let client = pipeline(&node, &config)?;
        client.send(send_transaction(json!({ "to": RECIPIENT, "value": "0x10" }))).await?;
        client.send(JsonRpcCall::bare("eth_blockNumber")).await?;
        client.send(send_transaction(json!({ "from": keys[2].address(), "nonce": "0x1" }))).await?;
        runs.push(node.calls());
    }
    assert_eq!(runs[0], runs[1]);
    Ok(())
}

#[tokio::test]
async fn ethers_provider_over_the_pipeline() -> eyre::Result<()> {
    let keys = test_keys(2);
    let node = scripted_node(1, "Geth/v1.13.5-stable");
    let config = remote_config(Some(1), Some(explicit_accounts(&keys)));
    let provider = Provider::new(pipeline(&node, &config)?);

    assert_eq!(provider.get_chainid().await?, U256::one());
    assert_eq!(provider.get_accounts().await?, vec![keys[0].address(), keys[1].address()]);
    assert_eq!(node.count("eth_accounts"), 0);
    Ok(())
}
