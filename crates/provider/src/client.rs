//! Public client of a built pipeline
use crate::{
    error::{ProviderError, ProviderResult},
    transport::Transport,
};
use async_trait::async_trait;
use ethers::providers::JsonRpcClient;
use rigging_primitives::JsonRpcCall;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{fmt::Debug, sync::Arc};

/// Outermost transport of a pipeline, cheap to clone and share between tasks
///
/// It also implements ethers' [JsonRpcClient], so `Provider::new(client)` gives the typed
/// middleware API on top of the pipeline.
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<dyn Transport>,
}

impl Client {
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self { inner: Arc::new(transport) }
    }
}

impl From<Box<dyn Transport>> for Client {
    fn from(transport: Box<dyn Transport>) -> Self {
        Self { inner: Arc::from(transport) }
    }
}

#[async_trait]
impl Transport for Client {
    async fn send(&self, call: JsonRpcCall) -> ProviderResult<Value> {
        self.inner.send(call).await
    }
}

#[async_trait]
impl JsonRpcClient for Client {
    type Error = ProviderError;

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, ProviderError>
    where
        T: Debug + Serialize + Send + Sync,
        R: DeserializeOwned + Send,
    {
        let params = match serde_json::to_value(params)? {
            Value::Array(params) => params,
            Value::Null => Vec::new(),
            param => vec![param],
        };
        let result = self.inner.send(JsonRpcCall::new(method, params)).await?;
        Ok(serde_json::from_value(result)?)
    }
}
