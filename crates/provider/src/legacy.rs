//! JSON-RPC 2.0 envelope adapter over [Client]
use crate::{
    client::Client,
    error::{ProviderError, ProviderResult},
    transport::Transport,
};
use ethers::providers::JsonRpcError;
use rigging_primitives::JsonRpcCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn jsonrpc_version() -> String {
    "2.0".to_string()
}

/// JSON-RPC 2.0 request envelope
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default = "jsonrpc_version")]
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self { jsonrpc: jsonrpc_version(), id: id.into(), method: method.into(), params }
    }
}

/// JSON-RPC 2.0 error object
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<JsonRpcError> for ErrorObject {
    fn from(err: JsonRpcError) -> Self {
        Self { code: err.code, message: err.message, data: err.data }
    }
}

/// JSON-RPC 2.0 response envelope, carrying either `result` or `error`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

/// Older request surfaces over the same pipeline: `send(method, params)` and
/// `send_async(request, callback)`
#[derive(Clone, Debug)]
pub struct LegacyAdapter {
    client: Client,
}

impl LegacyAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn send(&self, method: &str, params: Vec<Value>) -> ProviderResult<Value> {
        self.client.send(JsonRpcCall::new(method, params)).await
    }

    /// Answers a request envelope
    ///
    /// Errors carrying a JSON-RPC code become the `error` member of the response. Errors without
    /// one are returned as they are.
    pub async fn handle(&self, request: JsonRpcRequest) -> ProviderResult<JsonRpcResponse> {
        let JsonRpcRequest { jsonrpc, id, method, params } = request;
        match self.client.send(JsonRpcCall::new(method, params)).await {
            Ok(result) => Ok(JsonRpcResponse { jsonrpc, id, result: Some(result), error: None }),
            Err(err) => match err.json_rpc_error() {
                Some(error) => {
                    Ok(JsonRpcResponse { jsonrpc, id, result: None, error: Some(error.into()) })
                }
                None => Err(err),
            },
        }
    }

    /// Answers a request envelope through `callback`
    pub async fn send_async<F>(&self, request: JsonRpcRequest, callback: F)
    where
        F: FnOnce(Result<JsonRpcResponse, ProviderError>) + Send,
    {
        callback(self.handle(request).await)
    }
}
