use ethers::{
    providers::{JsonRpcError, ProviderError as EthersProviderError, RpcError},
    types::{Address, U256},
};
use rigging_primitives::{
    constants::rpc_error_codes::{
        CHAIN_DISCONNECTED, INTERNAL_ERROR, INVALID_PARAMS, UNAUTHORIZED,
    },
    KeyDerivationError,
};
use serde_json::json;
use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors raised while building a provider or while a call travels through it
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Configured accounts could not be turned into private keys
    #[error(transparent)]
    KeyDerivation(#[from] KeyDerivationError),
    /// The remote node reports a different chain id than the configured one
    #[error("configured chain id {configured} does not match the network's chain id {actual}")]
    ChainIdMismatch { configured: u64, actual: u64 },
    /// Network name and configuration variant disagree
    #[error("network {name:?} requires a {expected} network configuration")]
    NetworkMismatch { name: String, expected: &'static str },
    /// Gas multipliers must be finite and positive
    #[error("invalid gas multiplier {multiplier}")]
    InvalidGasMultiplier { multiplier: f64 },
    /// Any other invalid configuration value
    #[error("invalid network configuration: {message}")]
    InvalidConfig { message: String },
    /// No locally managed key matches the requested sender
    #[error("account {address:?} is not managed locally")]
    UnknownAccount { address: Address },
    /// Scaling a gas estimation does not fit 256 bits
    #[error("gas estimation {estimate} multiplied by {multiplier} overflows")]
    GasEstimationOverflow { estimate: U256, multiplier: f64 },
    /// A transaction misses a field needed to sign it locally
    #[error("missing transaction parameter {param:?} required to sign locally")]
    MissingTransactionParam { param: &'static str },
    /// Parameters of a call cannot be interpreted
    #[error("invalid params for {method}: {reason}")]
    InvalidParams { method: String, reason: String },
    /// The node answered an auxiliary call with an unexpected value
    #[error("invalid response to {method}: {reason}")]
    InvalidResponse { method: String, reason: String },
    /// Local signing failed
    #[error("signing failed: {message}")]
    Signing { message: String },
    /// JSON-RPC error response returned by the node
    #[error(transparent)]
    Rpc(JsonRpcError),
    /// Transport-level failure (connection, timeout, malformed response)
    #[error(transparent)]
    Transport(#[from] EthersProviderError),
    /// The local simulated chain could not be started
    #[error("local node error: {message}")]
    LocalNode { message: String },
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl ProviderError {
    pub fn invalid_params(method: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidParams { method: method.into(), reason: reason.to_string() }
    }

    pub fn invalid_response(method: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidResponse { method: method.into(), reason: reason.to_string() }
    }

    /// Returns true for fatal configuration errors, which are never worth retrying
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::KeyDerivation(_) |
                Self::ChainIdMismatch { .. } |
                Self::NetworkMismatch { .. } |
                Self::InvalidGasMultiplier { .. } |
                Self::InvalidConfig { .. }
        )
    }

    /// JSON-RPC error object for errors that carry an error code
    ///
    /// Node error responses are returned unchanged. Errors without a code (I/O, serialization,
    /// local node start-up) return `None` and must be propagated as they are.
    pub fn json_rpc_error(&self) -> Option<JsonRpcError> {
        let error = |code: i64, data: Option<serde_json::Value>| JsonRpcError {
            code,
            message: self.to_string(),
            data,
        };

        match self {
            Self::Rpc(err) => Some(err.clone()),
            Self::Transport(err) => err.as_error_response().cloned(),
            Self::ChainIdMismatch { configured, actual } => Some(error(
                CHAIN_DISCONNECTED,
                Some(json!({ "configured": configured, "actual": actual })),
            )),
            Self::UnknownAccount { address } => {
                Some(error(UNAUTHORIZED, Some(json!({ "address": address }))))
            }
            Self::MissingTransactionParam { .. } |
            Self::InvalidParams { .. } |
            Self::GasEstimationOverflow { .. } => Some(error(INVALID_PARAMS, None)),
            Self::InvalidResponse { .. } | Self::Signing { .. } => {
                Some(error(INTERNAL_ERROR, None))
            }
            Self::KeyDerivation(_) |
            Self::NetworkMismatch { .. } |
            Self::InvalidGasMultiplier { .. } |
            Self::InvalidConfig { .. } |
            Self::LocalNode { .. } |
            Self::Serde(_) => None,
        }
    }
}

impl RpcError for ProviderError {
    fn as_error_response(&self) -> Option<&JsonRpcError> {
        match self {
            Self::Rpc(err) => Some(err),
            Self::Transport(err) => err.as_error_response(),
            _ => None,
        }
    }

    fn as_serde_error(&self) -> Option<&serde_json::Error> {
        match self {
            Self::Serde(err) => Some(err),
            Self::Transport(err) => err.as_serde_error(),
            _ => None,
        }
    }
}

impl From<ProviderError> for EthersProviderError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Transport(err) => err,
            err => EthersProviderError::JsonRpcClientError(Box::new(err)),
        }
    }
}
