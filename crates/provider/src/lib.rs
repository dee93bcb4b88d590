//! Rigging provider pipeline
//!
//! Builds a JSON-RPC transport for a configured network: a base transport (local simulated chain
//! or remote HTTP endpoint) wrapped in decorators that sign locally, fill in sender, gas and gas
//! price, and check the chain id.

mod client;
pub mod error;
mod http;
mod legacy;
pub mod local;
pub mod middleware;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
mod pipeline;
mod transport;

pub use client::Client;
pub use error::{ProviderError, ProviderResult};
pub use http::{http_transport, HttpTransport};
pub use legacy::{ErrorObject, JsonRpcRequest, JsonRpcResponse, LegacyAdapter};
pub use local::{AnvilLauncher, LocalNodeLauncher, LocalNodeOptions, LocalTransport, MessageTraceHook};
pub use pipeline::{
    apply_provider_wrappers, build_provider, create_provider, select_base_transport, BuildOptions,
};
pub use transport::{JsonRpcClientTransport, Transport};
