use crate::common::{decode_raw, scripted_node, send_transaction, test_keys, ScriptedLauncher};
use ethers::types::{Address, U256};
use rigging_primitives::{JsonRpcCall, LocalNetworkConfig, NetworkConfig};
use rigging_provider::{
    build_provider, create_provider, BuildOptions, JsonRpcRequest, LocalNodeLauncher, Transport,
};
use serde_json::json;
use std::sync::Arc;

fn options(launcher: Arc<ScriptedLauncher>) -> BuildOptions {
    let launcher: Arc<dyn LocalNodeLauncher> = launcher;
    BuildOptions { local_node: Some(launcher), ..Default::default() }
}

fn local_config() -> NetworkConfig {
    NetworkConfig::Local(LocalNetworkConfig::default())
}

#[tokio::test]
async fn local_accounts_are_answered_without_launching() -> eyre::Result<()> {
    let launcher = ScriptedLauncher::new(scripted_node(31337, "anvil/v0.2.0"));
    let client = build_provider("localnet", &local_config(), &options(launcher.clone()))?;

    let accounts = client.send(JsonRpcCall::bare("eth_accounts")).await?;
    let accounts: Vec<Address> = serde_json::from_value(accounts)?;
    let keys = test_keys(10);
    assert_eq!(accounts, keys.iter().map(|key| key.address()).collect::<Vec<_>>());
    assert_eq!(launcher.launches(), 0);
    Ok(())
}

#[tokio::test]
async fn local_transactions_are_signed_and_never_scaled() -> eyre::Result<()> {
    let launcher = ScriptedLauncher::new(scripted_node(31337, "ganache"));
    let client = build_provider("localnet", &local_config(), &options(launcher.clone()))?;

    client.send(send_transaction(json!({ "to": Address::zero() }))).await?;
    client.send(send_transaction(json!({ "to": Address::zero(), "nonce": "0x1" }))).await?;
    assert_eq!(launcher.launches(), 1);

    let node = &launcher.node;
    assert_eq!(node.count("web3_clientVersion"), 0);
    let (tx, sender) = decode_raw(&node.calls_to("eth_sendRawTransaction")[0])?;
    assert_eq!(sender, test_keys(1)[0].address());
    assert_eq!(tx.gas(), Some(&U256::from(1000)));
    assert_eq!(tx.chain_id().map(|id| id.as_u64()), Some(31337));
    Ok(())
}

#[tokio::test]
async fn legacy_adapter_wraps_results_and_coded_errors() -> eyre::Result<()> {
    let launcher = ScriptedLauncher::new(scripted_node(31337, "anvil/v0.2.0"));
    let adapter = create_provider("localnet", &local_config(), &options(launcher))?;

    assert_eq!(adapter.send("eth_blockNumber", vec![]).await?, json!("0x1"));

    let stranger = Address::repeat_byte(0x42);
    let request = JsonRpcRequest::new(
        1,
        "eth_sendTransaction",
        vec![json!({ "from": stranger, "gas": "0x5208", "gasPrice": "0x1" })],
    );
    let mut response = None;
    adapter.send_async(request, |res| response = Some(res)).await;

    let error = response.expect("callback invoked")?.error.expect("error envelope");
    assert_eq!(error.code, 4100);
    assert_eq!(error.data, Some(json!({ "address": stranger })));
    Ok(())
}
