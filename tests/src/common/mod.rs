use async_trait::async_trait;
use ethers::{
    types::{transaction::eip2718::TypedTransaction, Address, Bytes, Signature, H256},
    utils::{keccak256, rlp::Rlp},
};
use rigging_primitives::{
    constants::accounts::{DEFAULT_HD_PATH, TEST_MNEMONIC},
    derive_private_keys, AccountsConfig, DerivedAccount, JsonRpcCall, NetworkConfig, PrivateKey,
    RemoteNetworkConfig,
};
use rigging_provider::{
    apply_provider_wrappers, middleware::UnknownSenderPolicy, mock::MockTransport, Client,
    LocalNodeLauncher, LocalNodeOptions, ProviderResult, Transport,
};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

pub const GAS_PRICE: &str = "0x3b9aca00";
pub const GAS_ESTIMATE: &str = "0x3e8";
pub const BLOCK_GAS_LIMIT: &str = "0x1c9c380";

/// First `count` accounts of the well-known test mnemonic
pub fn test_keys(count: u32) -> Vec<PrivateKey> {
    derive_private_keys(TEST_MNEMONIC, DEFAULT_HD_PATH, 0, count).expect("test mnemonic derives")
}

pub fn explicit_accounts(keys: &[PrivateKey]) -> AccountsConfig {
    AccountsConfig::List(
        keys.iter()
            .map(|key| DerivedAccount { private_key: key.clone(), balance: 1_000_000u64.into() })
            .collect(),
    )
}

/// Node answering every auxiliary call the decorators issue
pub fn scripted_node(chain_id: u64, client_version: &str) -> MockTransport {
    MockTransport::new()
        .with_result("eth_chainId", json!(format!("{chain_id:#x}")))
        .with_result("net_version", json!(chain_id.to_string()))
        .with_result("web3_clientVersion", json!(client_version))
        .with_result("eth_accounts", json!([]))
        .with_result("eth_gasPrice", json!(GAS_PRICE))
        .with_result("eth_estimateGas", json!(GAS_ESTIMATE))
        .with_result("eth_getBlockByNumber", json!({ "number": "0x1", "gasLimit": BLOCK_GAS_LIMIT }))
        .with_result("eth_getTransactionCount", json!("0x0"))
        .with_result("eth_blockNumber", json!("0x1"))
        .with_result("eth_sendTransaction", json!(H256::repeat_byte(0x11)))
        .with_handler("eth_sendRawTransaction", |call| {
            let raw: Bytes = serde_json::from_value(call.params[0].clone()).unwrap_or_default();
            Ok(json!(H256::from(keccak256(raw))))
        })
}

pub fn remote_config(chain_id: Option<u64>, accounts: Option<AccountsConfig>) -> NetworkConfig {
    let mut config = RemoteNetworkConfig::new("http://127.0.0.1:8545");
    config.chain_id = chain_id;
    config.accounts = accounts;
    NetworkConfig::Remote(config)
}

/// Full decorator stack of `config` over a scripted node
pub fn pipeline(node: &MockTransport, config: &NetworkConfig) -> eyre::Result<Client> {
    let transport =
        apply_provider_wrappers(Box::new(node.clone()), config, UnknownSenderPolicy::Reject)?;
    Ok(Client::from(transport))
}

pub fn send_transaction(tx: Value) -> JsonRpcCall {
    JsonRpcCall::new("eth_sendTransaction", vec![tx])
}

pub fn methods(node: &MockTransport) -> Vec<String> {
    node.calls().into_iter().map(|call| call.method).collect()
}

/// Decodes the raw transaction of an `eth_sendRawTransaction` call and recovers its sender
pub fn decode_raw(call: &JsonRpcCall) -> eyre::Result<(TypedTransaction, Address)> {
    let raw: Bytes = serde_json::from_value(call.params[0].clone())?;
    let (tx, signature): (TypedTransaction, Signature) =
        TypedTransaction::decode_signed(&Rlp::new(raw.as_ref()))?;
    let sender = signature.recover(tx.sighash())?;
    Ok((tx, sender))
}

/// Local node launcher handing out a scripted node and counting launches
#[derive(Debug)]
pub struct ScriptedLauncher {
    pub node: MockTransport,
    launches: AtomicUsize,
}

impl ScriptedLauncher {
    pub fn new(node: MockTransport) -> Arc<Self> {
        Arc::new(Self { node, launches: AtomicUsize::new(0) })
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalNodeLauncher for ScriptedLauncher {
    async fn launch(&self, _options: &LocalNodeOptions) -> ProviderResult<Box<dyn Transport>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.node.clone()))
    }
}
