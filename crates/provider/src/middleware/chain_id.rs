use crate::{
    error::{ProviderError, ProviderResult},
    transport::{query_chain_id, Transport},
};
use async_trait::async_trait;
use rigging_primitives::JsonRpcCall;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Outcome of the chain id check, fixed for the lifetime of the decorator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChainIdCheck {
    Validated,
    Rejected { actual: u64 },
}

/// Checks once that the node serves the configured chain
///
/// The first call queries the chain id; concurrent first callers wait for that single query.
/// A matching id lets every call through from then on. A mismatch is terminal: every call fails
/// with [ChainIdMismatch](ProviderError::ChainIdMismatch) without reaching the node again. A
/// failed query leaves the check pending for the next call.
#[derive(Debug)]
pub struct ChainIdValidation<T> {
    inner: T,
    configured: u64,
    check: OnceCell<ChainIdCheck>,
}

impl<T> ChainIdValidation<T>
where
    T: Transport,
{
    pub fn new(inner: T, configured: u64) -> Self {
        Self { inner, configured, check: OnceCell::new() }
    }

    async fn check(&self) -> ProviderResult<ChainIdCheck> {
        self.check
            .get_or_try_init(|| async {
                let actual = query_chain_id(&self.inner).await?;
                if actual == self.configured {
                    debug!("Chain id {actual} validated");
                    Ok(ChainIdCheck::Validated)
                } else {
                    warn!(
                        "Configured chain id {} does not match the network's chain id {actual}",
                        self.configured
                    );
                    Ok(ChainIdCheck::Rejected { actual })
                }
            })
            .await
            .copied()
    }
}

#[async_trait]
impl<T> Transport for ChainIdValidation<T>
where
    T: Transport,
{
    async fn send(&self, call: JsonRpcCall) -> ProviderResult<Value> {
        match self.check().await? {
            ChainIdCheck::Validated => self.inner.send(call).await,
            ChainIdCheck::Rejected { actual } => {
                Err(ProviderError::ChainIdMismatch { configured: self.configured, actual })
            }
        }
    }
}
