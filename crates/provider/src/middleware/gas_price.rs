use crate::{
    error::ProviderResult,
    transport::{request_quantity, Transport},
};
use async_trait::async_trait;
use ethers::types::U256;
use rigging_primitives::{
    constants::methods::{ETH_GAS_PRICE, ETH_SEND_TRANSACTION},
    to_quantity, JsonRpcCall,
};
use serde_json::Value;
use tracing::trace;

/// How a missing gas price is chosen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GasPriceStrategy {
    Fixed(U256),
    /// Ask the inner transport with `eth_gasPrice`, every time
    Automatic,
}

/// Fills in `gasPrice` on `eth_sendTransaction`
///
/// Transactions carrying EIP-1559 fee fields are left alone.
#[derive(Debug)]
pub struct GasPriceDefaulting<T> {
    inner: T,
    strategy: GasPriceStrategy,
}

impl<T> GasPriceDefaulting<T>
where
    T: Transport,
{
    pub fn new(inner: T, strategy: GasPriceStrategy) -> Self {
        Self { inner, strategy }
    }
}

#[async_trait]
impl<T> Transport for GasPriceDefaulting<T>
where
    T: Transport,
{
    async fn send(&self, mut call: JsonRpcCall) -> ProviderResult<Value> {
        let needs_price = call.is(ETH_SEND_TRANSACTION) &&
            call.tx_lacks("gasPrice") &&
            call.tx_lacks("maxFeePerGas") &&
            call.tx_lacks("maxPriorityFeePerGas");

        if needs_price {
            let gas_price = match self.strategy {
                GasPriceStrategy::Fixed(gas_price) => gas_price,
                GasPriceStrategy::Automatic => {
                    request_quantity(&self.inner, JsonRpcCall::bare(ETH_GAS_PRICE)).await?
                }
            };
            trace!("Defaulting gas price to {gas_price}");
            call.set_tx_field("gasPrice", to_quantity(gas_price));
        }
        self.inner.send(call).await
    }
}
