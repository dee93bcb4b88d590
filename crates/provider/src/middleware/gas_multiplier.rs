use super::{multiply_gas, validate_multiplier};
use crate::{
    error::{ProviderError, ProviderResult},
    transport::Transport,
};
use async_trait::async_trait;
use rigging_primitives::{
    constants::{
        gas::UNDERESTIMATING_CLIENTS,
        methods::{ETH_ESTIMATE_GAS, WEB3_CLIENT_VERSION},
    },
    parse_quantity, to_quantity, JsonRpcCall,
};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Inflates `eth_estimateGas` results of nodes known to under-estimate gas
///
/// The node is identified once through `web3_clientVersion`. A node that rejects that method is
/// treated as estimating correctly.
#[derive(Debug)]
pub struct GasMultiplier<T> {
    inner: T,
    multiplier: f64,
    markers: Vec<String>,
    underestimates: OnceCell<bool>,
}

impl<T> GasMultiplier<T>
where
    T: Transport,
{
    pub fn new(inner: T, multiplier: f64) -> ProviderResult<Self> {
        Ok(Self {
            inner,
            multiplier: validate_multiplier(multiplier)?,
            markers: UNDERESTIMATING_CLIENTS.iter().map(|marker| marker.to_string()).collect(),
            underestimates: OnceCell::new(),
        })
    }

    /// Replaces the `web3_clientVersion` substrings identifying under-estimating nodes
    pub fn with_markers(mut self, markers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.markers = markers.into_iter().map(Into::into).collect();
        self
    }

    async fn underestimates(&self) -> ProviderResult<bool> {
        self.underestimates
            .get_or_try_init(|| async {
                let version = match self.inner.send(JsonRpcCall::bare(WEB3_CLIENT_VERSION)).await {
                    Ok(version) => version.as_str().unwrap_or_default().to_lowercase(),
                    Err(ProviderError::Rpc(err)) => {
                        debug!("{WEB3_CLIENT_VERSION} unavailable: {err}");
                        String::new()
                    }
                    Err(err) => return Err(err),
                };

                let underestimates =
                    self.markers.iter().any(|marker| version.contains(&marker.to_lowercase()));
                if underestimates {
                    info!("{version} under-estimates gas, scaling estimations by {}", self.multiplier);
                }
                Ok(underestimates)
            })
            .await
            .copied()
    }
}

#[async_trait]
impl<T> Transport for GasMultiplier<T>
where
    T: Transport,
{
    async fn send(&self, call: JsonRpcCall) -> ProviderResult<Value> {
        if !call.is(ETH_ESTIMATE_GAS) || !self.underestimates().await? {
            return self.inner.send(call).await;
        }

        let estimate = self.inner.send(call).await?;
        let estimate = parse_quantity(&estimate).ok_or_else(|| {
            ProviderError::invalid_response(ETH_ESTIMATE_GAS, format!("{estimate} is not a quantity"))
        })?;
        Ok(to_quantity(multiply_gas(estimate, self.multiplier)?))
    }
}
