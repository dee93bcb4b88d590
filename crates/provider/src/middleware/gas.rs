use super::{multiply_gas, validate_multiplier};
use crate::{
    error::{ProviderError, ProviderResult},
    transport::{request_quantity, Transport},
};
use async_trait::async_trait;
use ethers::types::U256;
use rigging_primitives::{
    constants::methods::{ETH_ESTIMATE_GAS, ETH_GET_BLOCK_BY_NUMBER, ETH_SEND_TRANSACTION},
    parse_quantity, to_quantity, JsonRpcCall,
};
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::debug;

/// How a missing gas limit is chosen
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GasLimitStrategy {
    Fixed(U256),
    /// Estimate with the inner transport and scale by `multiplier`
    Automatic { multiplier: f64 },
}

/// Fills in `gas` on `eth_sendTransaction`
///
/// Scaled estimations are capped just below the block gas limit. When the estimation fails
/// because the transaction reverts, the block gas limit is used so the node reports the revert
/// on submission.
#[derive(Debug)]
pub struct GasLimitDefaulting<T> {
    inner: T,
    strategy: GasLimitStrategy,
    block_gas_limit: OnceCell<U256>,
}

impl<T> GasLimitDefaulting<T>
where
    T: Transport,
{
    pub fn new(inner: T, strategy: GasLimitStrategy) -> ProviderResult<Self> {
        if let GasLimitStrategy::Automatic { multiplier } = strategy {
            validate_multiplier(multiplier)?;
        }
        Ok(Self { inner, strategy, block_gas_limit: OnceCell::new() })
    }

    async fn block_gas_limit(&self) -> ProviderResult<U256> {
        self.block_gas_limit
            .get_or_try_init(|| async {
                let block = self
                    .inner
                    .send(JsonRpcCall::new(ETH_GET_BLOCK_BY_NUMBER, vec![json!("latest"), json!(false)]))
                    .await?;
                block.get("gasLimit").and_then(parse_quantity).ok_or_else(|| {
                    ProviderError::invalid_response(ETH_GET_BLOCK_BY_NUMBER, "block without gasLimit")
                })
            })
            .await
            .copied()
    }

    async fn estimate(&self, tx: Value, multiplier: f64) -> ProviderResult<U256> {
        match request_quantity(&self.inner, JsonRpcCall::new(ETH_ESTIMATE_GAS, vec![tx])).await {
            Ok(estimate) if multiplier == 1.0 => Ok(estimate),
            Ok(estimate) => {
                let gas = multiply_gas(estimate, multiplier)?;
                let cap = self.block_gas_limit().await?.saturating_sub(U256::one());
                Ok(gas.min(cap))
            }
            Err(ProviderError::Rpc(err)) if err.message.contains("execution error") => {
                debug!("Gas estimation reverted ({}), using the block gas limit", err.message);
                self.block_gas_limit().await
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl<T> Transport for GasLimitDefaulting<T>
where
    T: Transport,
{
    async fn send(&self, mut call: JsonRpcCall) -> ProviderResult<Value> {
        if call.is(ETH_SEND_TRANSACTION) && call.tx_lacks("gas") {
            let gas = match self.strategy {
                GasLimitStrategy::Fixed(gas) => gas,
                GasLimitStrategy::Automatic { multiplier } => {
                    self.estimate(call.params[0].clone(), multiplier).await?
                }
            };
            call.set_tx_field("gas", to_quantity(gas));
        }
        self.inner.send(call).await
    }
}
