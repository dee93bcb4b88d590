use crate::{
    error::{ProviderError, ProviderResult},
    transport::{query_chain_id, request_quantity, Transport},
};
use async_trait::async_trait;
use ethers::{
    signers::{LocalWallet, Signer},
    types::{
        transaction::{eip2718::TypedTransaction, eip712::TypedData},
        Address, Bytes, Eip1559TransactionRequest, Eip2930TransactionRequest, TransactionRequest,
        U256,
    },
    utils::hex,
};
use rigging_primitives::{
    constants::methods::{
        ETH_ACCOUNTS, ETH_GET_TRANSACTION_COUNT, ETH_REQUEST_ACCOUNTS, ETH_SEND_RAW_TRANSACTION,
        ETH_SEND_TRANSACTION, ETH_SIGN, ETH_SIGN_TYPED_DATA_V4, PERSONAL_SIGN,
    },
    parse_quantity, to_quantity, JsonRpcCall, PrivateKey,
};
use serde_json::{json, Map, Value};
use std::fmt;
use tokio::sync::OnceCell;
use tracing::debug;

/// Quantity fields of a transaction object, normalized to hex before signing
const QUANTITY_FIELDS: [&str; 7] =
    ["gas", "gasPrice", "value", "nonce", "maxFeePerGas", "maxPriorityFeePerGas", "chainId"];

/// What to do with a call whose sender has no local key
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownSenderPolicy {
    /// Fail with [UnknownAccount](ProviderError::UnknownAccount)
    #[default]
    Reject,
    /// Forward the call unchanged so the node can sign it
    Forward,
}

/// Signs transactions and messages with locally held keys
///
/// `eth_sendTransaction` becomes `eth_sendRawTransaction` with a fully signed payload, the
/// signing methods are answered locally and `eth_accounts` lists the local addresses. Every
/// other call passes through.
pub struct Signing<T> {
    inner: T,
    wallets: Vec<LocalWallet>,
    policy: UnknownSenderPolicy,
    chain_id: OnceCell<u64>,
}

impl<T> Signing<T>
where
    T: Transport,
{
    pub fn new<'a>(
        inner: T,
        keys: impl IntoIterator<Item = &'a PrivateKey>,
        policy: UnknownSenderPolicy,
    ) -> Self {
        Self {
            inner,
            wallets: keys.into_iter().map(PrivateKey::to_wallet).collect(),
            policy,
            chain_id: OnceCell::new(),
        }
    }

    /// Locally managed addresses, first one being the default sender
    pub fn addresses(&self) -> Vec<Address> {
        self.wallets.iter().map(Signer::address).collect()
    }

    /// Wallet of `address`, or `None` when the call should be forwarded instead
    fn wallet(&self, address: Address) -> ProviderResult<Option<&LocalWallet>> {
        match self.wallets.iter().find(|wallet| wallet.address() == address) {
            Some(wallet) => Ok(Some(wallet)),
            None => match self.policy {
                UnknownSenderPolicy::Reject => Err(ProviderError::UnknownAccount { address }),
                UnknownSenderPolicy::Forward => {
                    debug!("{address:?} is not managed locally, forwarding");
                    Ok(None)
                }
            },
        }
    }

    async fn chain_id(&self) -> ProviderResult<u64> {
        self.chain_id.get_or_try_init(|| query_chain_id(&self.inner)).await.copied()
    }

    async fn send_transaction(&self, call: JsonRpcCall) -> ProviderResult<Value> {
        let Some(tx) = call.tx_object() else {
            return Err(ProviderError::invalid_params(&call.method, "expected a transaction object"));
        };

        let from = match tx.get("from").filter(|from| !from.is_null()) {
            Some(from) => parse_address(&call.method, from)?,
            None => match self.wallets.first() {
                Some(wallet) => wallet.address(),
                None => return self.inner.send(call).await,
            },
        };
        let Some(wallet) = self.wallet(from)? else {
            return self.inner.send(call).await;
        };

        if call.tx_lacks("gas") {
            return Err(ProviderError::MissingTransactionParam { param: "gas" });
        }
        let eip1559 = !call.tx_lacks("maxFeePerGas") || !call.tx_lacks("maxPriorityFeePerGas");
        if eip1559 {
            for param in ["maxFeePerGas", "maxPriorityFeePerGas"] {
                if call.tx_lacks(param) {
                    return Err(ProviderError::MissingTransactionParam { param });
                }
            }
        } else if call.tx_lacks("gasPrice") {
            return Err(ProviderError::MissingTransactionParam { param: "gasPrice" });
        }

        let chain_id = match tx.get("chainId").filter(|chain_id| !chain_id.is_null()) {
            Some(chain_id) => explicit_chain_id(&call.method, chain_id)?,
            None => self.chain_id().await?,
        };

        let mut tx = tx.clone();
        tx.insert("from".into(), json!(from));
        tx.insert("chainId".into(), json!(chain_id));
        if call.tx_lacks("nonce") {
            let nonce = request_quantity(
                &self.inner,
                JsonRpcCall::new(ETH_GET_TRANSACTION_COUNT, vec![json!(from), json!("pending")]),
            )
            .await?;
            tx.insert("nonce".into(), to_quantity(nonce));
        }

        let mut typed = typed_transaction(&call.method, tx, eip1559)?;
        typed.set_chain_id(chain_id);

        let signature = wallet
            .sign_transaction_sync(&typed)
            .map_err(|err| ProviderError::Signing { message: err.to_string() })?;
        let raw = typed.rlp_signed(&signature);
        debug!("Signed transaction from {from:?} on chain {chain_id}");

        self.inner.send(JsonRpcCall::new(ETH_SEND_RAW_TRANSACTION, vec![json!(raw)])).await
    }

    /// `eth_sign [address, data]` and `personal_sign [data, address]`
    async fn sign_message(
        &self,
        call: JsonRpcCall,
        address_index: usize,
        data_index: usize,
    ) -> ProviderResult<Value> {
        let address = parse_address(&call.method, param(&call, address_index)?)?;
        let Some(wallet) = self.wallet(address)? else {
            return self.inner.send(call).await;
        };

        let message = message_bytes(&call.method, param(&call, data_index)?)?;
        let signature = wallet
            .sign_message(message)
            .await
            .map_err(|err| ProviderError::Signing { message: err.to_string() })?;
        Ok(json!(Bytes::from(signature.to_vec())))
    }

    /// `eth_signTypedData_v4 [address, typedData]`, typed data given as an object or a JSON string
    async fn sign_typed_data(&self, call: JsonRpcCall) -> ProviderResult<Value> {
        let address = parse_address(&call.method, param(&call, 0)?)?;
        let Some(wallet) = self.wallet(address)? else {
            return self.inner.send(call).await;
        };

        let typed_data: TypedData = match param(&call, 1)? {
            Value::String(data) => serde_json::from_str(data),
            data => serde_json::from_value(data.clone()),
        }
        .map_err(|err| ProviderError::invalid_params(&call.method, err))?;

        let signature = wallet
            .sign_typed_data(&typed_data)
            .await
            .map_err(|err| ProviderError::Signing { message: err.to_string() })?;
        Ok(json!(Bytes::from(signature.to_vec())))
    }
}

#[async_trait]
impl<T> Transport for Signing<T>
where
    T: Transport,
{
    async fn send(&self, call: JsonRpcCall) -> ProviderResult<Value> {
        match call.method.as_str() {
            ETH_ACCOUNTS | ETH_REQUEST_ACCOUNTS => Ok(json!(self.addresses())),
            ETH_SEND_TRANSACTION => self.send_transaction(call).await,
            ETH_SIGN => self.sign_message(call, 0, 1).await,
            PERSONAL_SIGN => self.sign_message(call, 1, 0).await,
            ETH_SIGN_TYPED_DATA_V4 => self.sign_typed_data(call).await,
            _ => self.inner.send(call).await,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signing<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signing")
            .field("addresses", &self.wallets.iter().map(Signer::address).collect::<Vec<_>>())
            .field("policy", &self.policy)
            .field("inner", &self.inner)
            .finish()
    }
}

fn param<'a>(call: &'a JsonRpcCall, index: usize) -> ProviderResult<&'a Value> {
    call.params
        .get(index)
        .ok_or_else(|| ProviderError::invalid_params(&call.method, format!("missing param {index}")))
}

fn parse_address(method: &str, value: &Value) -> ProviderResult<Address> {
    serde_json::from_value(value.clone())
        .map_err(|_| ProviderError::invalid_params(method, format!("invalid address {value}")))
}

/// A caller supplied `chainId` must be a quantity that fits 64 bits
fn explicit_chain_id(method: &str, value: &Value) -> ProviderResult<u64> {
    let chain_id = parse_quantity(value)
        .ok_or_else(|| ProviderError::invalid_params(method, "chainId is not a quantity"))?;
    if chain_id > U256::from(u64::MAX) {
        return Err(ProviderError::invalid_params(method, "chainId does not fit 64 bits"));
    }
    Ok(chain_id.as_u64())
}

/// Hex data is decoded, any other string is signed as its UTF-8 bytes
fn message_bytes(method: &str, value: &Value) -> ProviderResult<Vec<u8>> {
    let Some(data) = value.as_str() else {
        return Err(ProviderError::invalid_params(method, "message must be a string"));
    };
    match data.strip_prefix("0x").map(hex::decode) {
        Some(Ok(bytes)) => Ok(bytes),
        _ => Ok(data.as_bytes().to_vec()),
    }
}

/// Builds a legacy, EIP-2930 or EIP-1559 transaction from a JSON-RPC transaction object
fn typed_transaction(
    method: &str,
    mut tx: Map<String, Value>,
    eip1559: bool,
) -> ProviderResult<TypedTransaction> {
    for field in QUANTITY_FIELDS {
        if let Some(value) = tx.get_mut(field).filter(|value| !value.is_null()) {
            let quantity = parse_quantity(value).ok_or_else(|| {
                ProviderError::invalid_params(method, format!("{field} is not a quantity"))
            })?;
            *value = to_quantity(quantity);
        }
    }
    if !tx.contains_key("data") {
        if let Some(input) = tx.remove("input") {
            tx.insert("data".into(), input);
        }
    }
    tx.remove("type");

    let has_access_list = tx.get("accessList").is_some_and(|list| !list.is_null());
    let tx = Value::Object(tx);
    let invalid = |err: serde_json::Error| ProviderError::invalid_params(method, err);

    Ok(if eip1559 {
        serde_json::from_value::<Eip1559TransactionRequest>(tx).map_err(invalid)?.into()
    } else if has_access_list {
        serde_json::from_value::<Eip2930TransactionRequest>(tx).map_err(invalid)?.into()
    } else {
        serde_json::from_value::<TransactionRequest>(tx).map_err(invalid)?.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use ethers::{
        types::{Signature, U256},
        utils::rlp::Rlp,
    };
    use rigging_primitives::{constants::accounts::TEST_MNEMONIC, derive_private_keys};

    fn keys() -> Vec<PrivateKey> {
        derive_private_keys(TEST_MNEMONIC, "m/44'/60'/0'/0/", 0, 2).unwrap()
    }

    fn node() -> MockTransport {
        MockTransport::new()
            .with_result("eth_chainId", json!("0x7a69"))
            .with_result("eth_getTransactionCount", json!("0x3"))
            .with_result("eth_sendRawTransaction", json!("0xabcd"))
    }

    fn raw_transaction(call: &JsonRpcCall) -> (TypedTransaction, Signature) {
        let raw: Bytes = serde_json::from_value(call.params[0].clone()).unwrap();
        TypedTransaction::decode_signed(&Rlp::new(raw.as_ref())).unwrap()
    }

    #[tokio::test]
    async fn accounts_are_answered_locally() {
        let node = node();
        let keys = keys();
        let signing = Signing::new(node.clone(), &keys, UnknownSenderPolicy::Reject);

        let accounts = signing.send(JsonRpcCall::bare("eth_accounts")).await.unwrap();
        assert_eq!(accounts, json!([keys[0].address(), keys[1].address()]));
        assert!(node.calls().is_empty());
    }

    #[tokio::test]
    async fn signs_legacy_transactions_with_the_first_account() {
        let node = node();
        let keys = keys();
        let signing = Signing::new(node.clone(), &keys, UnknownSenderPolicy::Reject);

        let tx = json!({
            "to": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
            "value": "1000",
            "gas": "0x5208",
            "gasPrice": 1_000_000_000u64,
        });
        let hash = signing.send(JsonRpcCall::new("eth_sendTransaction", vec![tx])).await.unwrap();
        assert_eq!(hash, json!("0xabcd"));

        let nonce_queries = node.calls_to("eth_getTransactionCount");
        assert_eq!(nonce_queries[0].params, vec![json!(keys[0].address()), json!("pending")]);

        let (tx, signature) = raw_transaction(&node.calls_to("eth_sendRawTransaction")[0]);
        assert!(matches!(tx, TypedTransaction::Legacy(_)));
        assert_eq!(tx.nonce(), Some(&U256::from(3)));
        assert_eq!(tx.gas(), Some(&U256::from(21000)));
        assert_eq!(tx.value(), Some(&U256::from(1000)));
        assert_eq!(tx.chain_id().map(|id| id.as_u64()), Some(31337));
        assert_eq!(signature.recover(tx.sighash()).unwrap(), keys[0].address());
    }

    #[tokio::test]
    async fn signs_eip1559_transactions_and_caches_the_chain_id() {
        let node = node();
        let keys = keys();
        let signing = Signing::new(node.clone(), &keys, UnknownSenderPolicy::Reject);

        for _ in 0..2 {
            let tx = json!({
                "from": keys[1].address(),
                "to": keys[0].address(),
                "gas": "0x5208",
                "maxFeePerGas": "0x3b9aca00",
                "maxPriorityFeePerGas": "0x1",
                "nonce": "0x7",
            });
            signing.send(JsonRpcCall::new("eth_sendTransaction", vec![tx])).await.unwrap();
        }

        assert_eq!(node.count("eth_chainId"), 1);
        assert_eq!(node.count("eth_getTransactionCount"), 0);
        let (tx, signature) = raw_transaction(&node.calls_to("eth_sendRawTransaction")[1]);
        assert!(matches!(tx, TypedTransaction::Eip1559(_)));
        assert_eq!(tx.nonce(), Some(&U256::from(7)));
        assert_eq!(signature.recover(tx.sighash()).unwrap(), keys[1].address());
    }

    #[tokio::test]
    async fn missing_gas_fields_are_reported() {
        let node = node();
        let signing = Signing::new(node.clone(), &keys(), UnknownSenderPolicy::Reject);

        let err = signing
            .send(JsonRpcCall::new("eth_sendTransaction", vec![json!({ "gasPrice": "0x1" })]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingTransactionParam { param: "gas" }));

        let err = signing
            .send(JsonRpcCall::new("eth_sendTransaction", vec![json!({ "gas": "0x5208" })]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingTransactionParam { param: "gasPrice" }));
        assert!(node.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_sender_follows_the_policy() {
        let stranger = Address::repeat_byte(0x42);
        let tx = json!({ "from": stranger, "gas": "0x5208", "gasPrice": "0x1" });
        let call = JsonRpcCall::new("eth_sendTransaction", vec![tx]);

        let node = node().with_result("eth_sendTransaction", json!("0xfeed"));
        let rejecting = Signing::new(node.clone(), &keys(), UnknownSenderPolicy::Reject);
        let err = rejecting.send(call.clone()).await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownAccount { address } if address == stranger));
        assert!(!err.is_configuration_error());

        let forwarding = Signing::new(node.clone(), &keys(), UnknownSenderPolicy::Forward);
        assert_eq!(forwarding.send(call.clone()).await.unwrap(), json!("0xfeed"));
        assert_eq!(node.calls_to("eth_sendTransaction"), vec![call]);
    }

    #[tokio::test]
    async fn signs_messages_locally() {
        let node = node();
        let keys = keys();
        let signing = Signing::new(node.clone(), &keys, UnknownSenderPolicy::Reject);

        let eth_sign = signing
            .send(JsonRpcCall::new("eth_sign", vec![json!(keys[0].address()), json!("0x68656c6c6f")]))
            .await
            .unwrap();
        let personal_sign = signing
            .send(JsonRpcCall::new(
                "personal_sign",
                vec![json!("hello"), json!(keys[0].address())],
            ))
            .await
            .unwrap();
        assert_eq!(eth_sign, personal_sign);

        let signature: Bytes = serde_json::from_value(eth_sign).unwrap();
        let signature = Signature::try_from(signature.as_ref()).unwrap();
        assert_eq!(signature.recover("hello").unwrap(), keys[0].address());
        assert!(node.calls().is_empty());
    }

    #[tokio::test]
    async fn signs_typed_data_locally() {
        let keys = keys();
        let signing = Signing::new(node(), &keys, UnknownSenderPolicy::Reject);
        let typed_data = json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                ],
                "Mail": [{ "name": "contents", "type": "string" }],
            },
            "primaryType": "Mail",
            "domain": { "name": "Rigging", "chainId": 31337 },
            "message": { "contents": "hello" },
        });

        let signature = signing
            .send(JsonRpcCall::new(
                "eth_signTypedData_v4",
                vec![json!(keys[0].address()), json!(typed_data.to_string())],
            ))
            .await
            .unwrap();
        let signature: Bytes = serde_json::from_value(signature).unwrap();
        assert_eq!(signature.len(), 65);
    }

    #[tokio::test]
    async fn explicit_chain_id_is_used_for_signing() {
        let node = node();
        let keys = keys();
        let signing = Signing::new(node.clone(), &keys, UnknownSenderPolicy::Reject);

        let tx = json!({ "gas": "0x5208", "gasPrice": "0x1", "chainId": "0x5" });
        signing.send(JsonRpcCall::new("eth_sendTransaction", vec![tx])).await.unwrap();

        let (tx, _) = raw_transaction(&node.calls_to("eth_sendRawTransaction")[0]);
        assert_eq!(tx.chain_id().map(|id| id.as_u64()), Some(5));
        assert_eq!(node.count("eth_chainId"), 0);
    }

    #[tokio::test]
    async fn oversized_or_malformed_chain_ids_are_rejected() {
        let keys = keys();
        for chain_id in [json!("0x10000000000000001"), json!("mainnet"), json!(true)] {
            let node = node();
            let signing = Signing::new(node.clone(), &keys, UnknownSenderPolicy::Reject);

            let tx = json!({ "gas": "0x5208", "gasPrice": "0x1", "chainId": chain_id.clone() });
            let err = signing
                .send(JsonRpcCall::new("eth_sendTransaction", vec![tx]))
                .await
                .unwrap_err();
            assert!(
                matches!(err, ProviderError::InvalidParams { ref reason, .. } if reason.contains("chainId")),
                "{chain_id} should be rejected, got {err:?}"
            );
            assert!(node.calls().is_empty(), "{chain_id} reached the node");
        }
    }

    #[test]
    fn debug_shows_addresses_only() {
        let keys = keys();
        let signing = Signing::new(node(), &keys, UnknownSenderPolicy::Reject);
        let rendered = format!("{signing:?}");
        assert!(rendered.contains("addresses"));
        assert!(!rendered.contains("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"));
    }
}
