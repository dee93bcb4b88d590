//! The [Transport](Transport) contract shared by base transports and decorators
use crate::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use ethers::{
    providers::{JsonRpcClient, RpcError},
    types::U256,
};
use rigging_primitives::{
    constants::methods::{ETH_CHAIN_ID, NET_VERSION},
    parse_quantity, JsonRpcCall,
};
use serde_json::Value;
use std::{fmt::Debug, sync::Arc};
use tracing::{debug, trace};

/// Anything able to answer a JSON-RPC call
///
/// Base transports talk to a node. Decorators wrap another transport they exclusively own and
/// expose the same contract, answering, rewriting or rejecting the call on its way down.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Sends one call and returns its result value
    async fn send(&self, call: JsonRpcCall) -> ProviderResult<Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, call: JsonRpcCall) -> ProviderResult<Value> {
        (**self).send(call).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, call: JsonRpcCall) -> ProviderResult<Value> {
        (**self).send(call).await
    }
}

/// Adapts any ethers [JsonRpcClient](JsonRpcClient) (HTTP, WebSockets, mock) into a
/// [Transport](Transport)
#[derive(Debug, Clone)]
pub struct JsonRpcClientTransport<C> {
    client: C,
}

impl<C> JsonRpcClientTransport<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

#[async_trait]
impl<C> Transport for JsonRpcClientTransport<C>
where
    C: JsonRpcClient + 'static,
{
    async fn send(&self, call: JsonRpcCall) -> ProviderResult<Value> {
        trace!("Sending {} to the node", call.method);

        self.client.request::<Vec<Value>, Value>(&call.method, call.params).await.map_err(|err| {
            match err.as_error_response() {
                Some(response) => ProviderError::Rpc(response.clone()),
                None => ProviderError::Transport(err.into()),
            }
        })
    }
}

/// Sends `call` and parses its result as a quantity
pub(crate) async fn request_quantity<T>(transport: &T, call: JsonRpcCall) -> ProviderResult<U256>
where
    T: Transport + ?Sized,
{
    let method = call.method.clone();
    let value = transport.send(call).await?;
    parse_quantity(&value)
        .ok_or_else(|| ProviderError::invalid_response(method, format!("{value} is not a quantity")))
}

/// Queries the chain id with `eth_chainId`, falling back to `net_version` for nodes that reject
/// `eth_chainId`
pub(crate) async fn query_chain_id<T>(transport: &T) -> ProviderResult<u64>
where
    T: Transport + ?Sized,
{
    let chain_id = match request_quantity(transport, JsonRpcCall::bare(ETH_CHAIN_ID)).await {
        Ok(chain_id) => chain_id,
        Err(ProviderError::Rpc(err)) => {
            debug!("{ETH_CHAIN_ID} failed ({err}), falling back to {NET_VERSION}");
            request_quantity(transport, JsonRpcCall::bare(NET_VERSION)).await?
        }
        Err(err) => return Err(err),
    };

    if chain_id > U256::from(u64::MAX) {
        return Err(ProviderError::invalid_response(ETH_CHAIN_ID, "chain id does not fit 64 bits"));
    }
    Ok(chain_id.as_u64())
}
