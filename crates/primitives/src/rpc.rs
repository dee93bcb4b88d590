//! JSON-RPC call primitives
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single JSON-RPC call: method name and ordered parameters
///
/// A call is owned by whoever sends it. Decorators that need to change it work on their own
/// mutable copy before forwarding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcCall {
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

impl JsonRpcCall {
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self { method: method.into(), params }
    }

    /// Call without parameters
    pub fn bare(method: impl Into<String>) -> Self {
        Self::new(method, Vec::new())
    }

    pub fn is(&self, method: &str) -> bool {
        self.method == method
    }

    /// Transaction-like object passed as the first parameter (`eth_sendTransaction`,
    /// `eth_call`, `eth_estimateGas`)
    pub fn tx_object(&self) -> Option<&Map<String, Value>> {
        self.params.first().and_then(Value::as_object)
    }

    pub fn tx_object_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.params.first_mut().and_then(Value::as_object_mut)
    }

    /// Returns true if the first parameter is an object that lacks `field` (or holds null)
    pub fn tx_lacks(&self, field: &str) -> bool {
        self.tx_object().is_some_and(|tx| tx.get(field).map_or(true, Value::is_null))
    }

    /// Sets `field` on the first-parameter object, if there is one
    pub fn set_tx_field(&mut self, field: &str, value: Value) {
        if let Some(tx) = self.tx_object_mut() {
            tx.insert(field.to_string(), value);
        }
    }
}
