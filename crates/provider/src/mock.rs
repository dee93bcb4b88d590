//! Scripted in-memory transport for tests
use crate::{
    error::{ProviderError, ProviderResult},
    transport::Transport,
};
use async_trait::async_trait;
use ethers::providers::JsonRpcError;
use parking_lot::Mutex;
use rigging_primitives::JsonRpcCall;
use serde_json::Value;
use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

type Handler = Arc<dyn Fn(&JsonRpcCall) -> Result<Value, JsonRpcError> + Send + Sync>;

/// Transport answering calls from per-method handlers and recording every call it receives
///
/// Clones share handlers and the call log, so a test can keep one clone to inspect what the
/// decorators under test sent. Methods without a handler fail with `-32601`.
#[derive(Clone, Default)]
pub struct MockTransport {
    handlers: Arc<Mutex<HashMap<String, Handler>>>,
    calls: Arc<Mutex<Vec<JsonRpcCall>>>,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `method` with `result`
    pub fn with_result(self, method: &str, result: Value) -> Self {
        self.with_handler(method, move |_| Ok(result.clone()))
    }

    /// Answers `method` with a JSON-RPC error response
    pub fn with_error(self, method: &str, error: JsonRpcError) -> Self {
        self.with_handler(method, move |_| Err(error.clone()))
    }

    pub fn with_handler<F>(self, method: &str, handler: F) -> Self
    where
        F: Fn(&JsonRpcCall) -> Result<Value, JsonRpcError> + Send + Sync + 'static,
    {
        self.handlers.lock().insert(method.to_string(), Arc::new(handler));
        self
    }

    /// Delays every answer, leaving room for concurrent callers to race
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<JsonRpcCall> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<JsonRpcCall> {
        self.calls.lock().iter().filter(|call| call.is(method)).cloned().collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|call| call.is(method)).count()
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.handlers.lock().keys().cloned().collect();
        methods.sort();
        f.debug_struct("MockTransport").field("methods", &methods).finish()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, call: JsonRpcCall) -> ProviderResult<Value> {
        self.calls.lock().push(call.clone());
        let handler = self.handlers.lock().get(&call.method).cloned();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match handler {
            Some(handler) => handler(&call).map_err(ProviderError::Rpc),
            None => Err(ProviderError::Rpc(JsonRpcError {
                code: -32601,
                message: format!("the method {} does not exist/is not available", call.method),
                data: None,
            })),
        }
    }
}
