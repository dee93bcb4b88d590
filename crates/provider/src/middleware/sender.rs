use crate::{
    error::{ProviderError, ProviderResult},
    transport::Transport,
};
use async_trait::async_trait;
use ethers::types::Address;
use rigging_primitives::{
    constants::methods::{ETH_ACCOUNTS, ETH_CALL, ETH_ESTIMATE_GAS, ETH_SEND_TRANSACTION},
    JsonRpcCall,
};
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::debug;

/// Where a missing `from` comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SenderStrategy {
    Fixed(Address),
    /// First address of the inner transport's `eth_accounts`
    Automatic,
}

/// Fills in `from` on `eth_sendTransaction`, `eth_call` and `eth_estimateGas`
///
/// An explicit `from` is never overridden. With [Automatic](SenderStrategy::Automatic) the
/// account list is fetched once; concurrent first callers share that single request.
#[derive(Debug)]
pub struct SenderDefaulting<T> {
    inner: T,
    strategy: SenderStrategy,
    default_sender: OnceCell<Option<Address>>,
}

impl<T> SenderDefaulting<T>
where
    T: Transport,
{
    pub fn new(inner: T, strategy: SenderStrategy) -> Self {
        Self { inner, strategy, default_sender: OnceCell::new() }
    }

    async fn sender(&self) -> ProviderResult<Option<Address>> {
        match self.strategy {
            SenderStrategy::Fixed(address) => Ok(Some(address)),
            SenderStrategy::Automatic => self
                .default_sender
                .get_or_try_init(|| async {
                    let accounts = self.inner.send(JsonRpcCall::bare(ETH_ACCOUNTS)).await?;
                    let accounts: Vec<Address> = serde_json::from_value(accounts)
                        .map_err(|err| ProviderError::invalid_response(ETH_ACCOUNTS, err))?;
                    debug!("Default sender: {:?}", accounts.first());
                    Ok(accounts.first().copied())
                })
                .await
                .copied(),
        }
    }
}

#[async_trait]
impl<T> Transport for SenderDefaulting<T>
where
    T: Transport,
{
    async fn send(&self, mut call: JsonRpcCall) -> ProviderResult<Value> {
        let applies = [ETH_SEND_TRANSACTION, ETH_CALL, ETH_ESTIMATE_GAS].contains(&call.method.as_str());
        if applies && call.tx_lacks("from") {
            if let Some(sender) = self.sender().await? {
                call.set_tx_field("from", json!(sender));
            }
        }
        self.inner.send(call).await
    }
}
